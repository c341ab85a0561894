//! Integration Tests für Sampling und Ringpuffer
//!
//! Diese Tests laufen auf dem Host (x86_64) und nutzen Mock-ADC, Mock-Pin und Mock-Delay

mod common;

use common::{Log, MockDelay, MockPowerPin, MockReader, Op};
use embassy_futures::block_on;
use esp_core::sampler::POWER_SETTLE_DELAY_MS;
use esp_core::{AdcInput, Channel, SampleBuffer, average_reads, take_sample};

// ============================================================================
// Tests: SampleBuffer
// ============================================================================

#[test]
fn test_window_keeps_newest_values() {
    let mut buffer = SampleBuffer::<16>::new(3).unwrap();
    for v in [10, 20, 30, 40] {
        buffer.record(v);
    }
    assert_eq!(buffer.reduce_and_reset(), Some(30));
}

#[test]
fn test_mean_of_last_capacity_values_for_long_sequences() {
    for capacity in 1..=6 {
        for extra in 1..=9 {
            let mut buffer = SampleBuffer::<8>::new(capacity).unwrap();
            let values: Vec<i32> = (0..(capacity + extra) as i32).map(|i| i * 7 - 20).collect();
            for &v in &values {
                buffer.record(v);
            }
            let tail = &values[values.len() - capacity..];
            let expected = tail.iter().map(|&v| v as i64).sum::<i64>() / capacity as i64;
            assert_eq!(
                buffer.reduce_and_reset(),
                Some(expected as i32),
                "capacity {capacity}, extra {extra}"
            );
        }
    }
}

#[test]
fn test_reduce_twice_reports_no_new_data() {
    let mut buffer = SampleBuffer::<4>::new(4).unwrap();
    buffer.record(5);
    buffer.record(6);
    assert_eq!(buffer.reduce_and_reset(), Some(5));
    assert_eq!(buffer.reduce_and_reset(), None);
}

// ============================================================================
// Tests: average_reads()
// ============================================================================

#[test]
fn test_failed_read_counts_toward_divisor() {
    // Bias-Kanal liest direkt den Bias-Eingang: r1 = 30, r2 = Fehler, r3 = 60
    let mut reader = MockReader::new(0).script_bias(&[Some(30), None, Some(60)]);
    let outcome = average_reads(&mut reader, Channel::Bias, 3);
    assert_eq!(outcome.value, (30 + 0 + 60) / 3);
    assert_ne!(outcome.value, (30 + 60) / 2);
    assert_eq!(outcome.failed_reads, 1);
}

#[test]
fn test_all_reads_failed_gives_zero() {
    let mut reader = MockReader::new(0).script_panel(&[None, None]);
    let outcome = average_reads(&mut reader, Channel::Battery, 2);
    assert_eq!(outcome.value, 0);
    assert_eq!(outcome.failed_reads, 2);
}

#[test]
fn test_irradiation_failure_on_bias_drops_whole_read() {
    let mut reader = MockReader::new(0)
        .script_panel(&[Some(900), Some(900)])
        .script_bias(&[Some(500), None]);
    let outcome = average_reads(&mut reader, Channel::Irradiation, 2);
    assert_eq!(outcome.value, 400 / 2);
    assert_eq!(outcome.failed_reads, 1);
}

#[test]
fn test_battery_never_reads_battery_sense() {
    let log = Log::default();
    let mut reader = MockReader::new(1000).with_log(&log);
    let outcome = average_reads(&mut reader, Channel::Battery, 2);
    assert_eq!(outcome.value, 3000);
    assert_eq!(
        *log.borrow(),
        vec![Op::Read(AdcInput::Panel), Op::Read(AdcInput::Panel)]
    );
}

// ============================================================================
// Tests: take_sample() mit Versorgungs-Pin
// ============================================================================

#[test]
fn test_power_sequence_wraps_reads() {
    let log = Log::default();
    let mut reader = MockReader::new(700).with_log(&log);
    let mut pin = MockPowerPin::new(&log);
    let mut delay = MockDelay { log: &log };

    let outcome = block_on(take_sample(
        &mut reader,
        Some(&mut pin),
        &mut delay,
        Channel::Irradiation,
        1,
    ));

    assert_eq!(outcome.value, 0);
    assert!(!outcome.power_fault);
    assert!(!pin.is_high);
    assert_eq!(
        *log.borrow(),
        vec![
            Op::PowerHigh,
            Op::DelayMs(POWER_SETTLE_DELAY_MS),
            Op::Read(AdcInput::Panel),
            Op::Read(AdcInput::Bias),
            Op::PowerLow,
        ]
    );
}

#[test]
fn test_without_pin_there_is_no_settle_delay() {
    let log = Log::default();
    let mut reader = MockReader::new(700).with_log(&log);
    let mut delay = MockDelay { log: &log };

    let outcome = block_on(take_sample(
        &mut reader,
        None::<&mut MockPowerPin<'_>>,
        &mut delay,
        Channel::Battery,
        1,
    ));

    assert_eq!(outcome.value, 2100);
    assert!(!log.borrow().contains(&Op::DelayMs(POWER_SETTLE_DELAY_MS)));
}

#[test]
fn test_power_fault_is_reported_but_sample_taken() {
    let log = Log::default();
    let mut reader = MockReader::new(0).script_panel(&[Some(800)]).script_bias(&[Some(300)]);
    let mut pin = MockPowerPin::new(&log);
    pin.fail_next_write = true;
    let mut delay = MockDelay { log: &log };

    let outcome = block_on(take_sample(
        &mut reader,
        Some(&mut pin),
        &mut delay,
        Channel::Irradiation,
        1,
    ));

    assert!(outcome.power_fault);
    assert_eq!(outcome.value, 500);
    assert_eq!(log.borrow().last(), Some(&Op::PowerLow));
}
