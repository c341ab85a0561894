//! Pure Business Logic für das Sampling
//!
//! Lese-Strategien pro Kanal und die Mittelung von N Lesungen zu einem Sample.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::traits::{AnalogReader, ReadError};
use crate::types::{AdcInput, Channel};

/// Die Batterie wird über einen Spannungsteiler gemessen
pub const BATTERY_ADC_GAIN: i32 = 3;

/// Wartezeit nach dem Einschalten der Panel-Versorgung
pub const POWER_SETTLE_DELAY_MS: u32 = 50;

/// Liest einen logischen Kanal in Millivolt
///
/// - `Irradiation` = Panel − Bias
/// - `Battery` = Panel × `BATTERY_ADC_GAIN` (liest den Panel-Eingang, nicht `BatterySense`)
/// - `Bias` = Bias-Eingang
pub fn read_channel<R: AnalogReader>(reader: &mut R, channel: Channel) -> Result<i32, ReadError> {
    match channel {
        Channel::Irradiation => {
            let panel = reader.read_mv(AdcInput::Panel)?;
            let bias = reader.read_mv(AdcInput::Bias)?;
            Ok(panel - bias)
        }
        Channel::Battery => Ok(reader.read_mv(AdcInput::Panel)? * BATTERY_ADC_GAIN),
        Channel::Bias => reader.read_mv(AdcInput::Bias),
    }
}

/// Ergebnis eines Sampling-Ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleOutcome {
    /// Gemittelter Wert, der in den Ringpuffer geschrieben wird
    pub value: i32,
    /// Anzahl fehlgeschlagener Lesungen (gingen mit 0 in die Summe ein)
    pub failed_reads: u32,
    /// Die Versorgung konnte nicht geschaltet werden
    pub power_fault: bool,
}

/// Führt `samples_per_read` Lesungen direkt hintereinander aus und teilt
/// die Summe durch `samples_per_read`.
///
/// Fehlgeschlagene Lesungen zählen mit 0 zur Summe, aber weiterhin zum
/// Teiler: bei Teilausfall wird der Wert nach unten verzerrt.
pub fn average_reads<R: AnalogReader>(
    reader: &mut R,
    channel: Channel,
    samples_per_read: u32,
) -> SampleOutcome {
    let divisor = samples_per_read.max(1);
    let mut sum: i64 = 0;
    let mut failed_reads = 0;

    for _ in 0..divisor {
        match read_channel(reader, channel) {
            Ok(value) => sum += i64::from(value),
            Err(_) => failed_reads += 1,
        }
    }

    SampleOutcome {
        value: (sum / i64::from(divisor)) as i32,
        failed_reads,
        power_fault: false,
    }
}

/// Ein kompletter Sampling-Tick
///
/// Mit `power = Some(pin)` wird die Panel-Versorgung eingeschaltet,
/// `POWER_SETTLE_DELAY_MS` gewartet, gemessen und danach wieder
/// ausgeschaltet. Der Aufrufer muss exklusiven Zugriff auf den Pin halten.
pub async fn take_sample<R, P, D>(
    reader: &mut R,
    power: Option<&mut P>,
    delay: &mut D,
    channel: Channel,
    samples_per_read: u32,
) -> SampleOutcome
where
    R: AnalogReader,
    P: OutputPin,
    D: DelayNs,
{
    match power {
        Some(pin) => {
            let mut power_fault = pin.set_high().is_err();
            delay.delay_ms(POWER_SETTLE_DELAY_MS).await;
            let mut outcome = average_reads(reader, channel, samples_per_read);
            power_fault |= pin.set_low().is_err();
            outcome.power_fault = power_fault;
            outcome
        }
        None => average_reads(reader, channel, samples_per_read),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReader {
        panel: i32,
        bias: i32,
        battery: i32,
    }

    impl AnalogReader for FixedReader {
        fn read_mv(&mut self, input: AdcInput) -> Result<i32, ReadError> {
            Ok(match input {
                AdcInput::Panel => self.panel,
                AdcInput::BatterySense => self.battery,
                AdcInput::Bias => self.bias,
            })
        }
    }

    #[test]
    fn test_irradiation_subtracts_bias() {
        let mut reader = FixedReader { panel: 900, bias: 500, battery: 1 };
        assert_eq!(read_channel(&mut reader, Channel::Irradiation), Ok(400));
    }

    #[test]
    fn test_battery_scales_panel_reading() {
        let mut reader = FixedReader { panel: 1200, bias: 500, battery: 1 };
        assert_eq!(read_channel(&mut reader, Channel::Battery), Ok(3600));
    }

    #[test]
    fn test_bias_reads_bias_input() {
        let mut reader = FixedReader { panel: 1200, bias: 498, battery: 1 };
        assert_eq!(read_channel(&mut reader, Channel::Bias), Ok(498));
    }

    #[test]
    fn test_average_truncates() {
        let mut reader = FixedReader { panel: 10, bias: 0, battery: 0 };
        let outcome = average_reads(&mut reader, Channel::Bias, 3);
        assert_eq!(outcome.value, 0);
        let outcome = average_reads(&mut reader, Channel::Irradiation, 3);
        assert_eq!(outcome.value, 10);
        assert_eq!(outcome.failed_reads, 0);
    }
}
