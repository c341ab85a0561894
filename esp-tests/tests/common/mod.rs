//! Mock-Implementierungen für die Integration Tests
//!
//! Jede Test-Datei bindet dieses Modul mit `mod common;` ein.

#![allow(dead_code)]

use core::cell::RefCell;
use std::collections::VecDeque;

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;
use esp_core::{AdcInput, AnalogReader, MessagePublisher, PublishError, QoS, ReadError};
use esp_core::{TimerControl, TimerError};

// ============================================================================
// Gemeinsames Ereignis-Log
// ============================================================================

/// Ereignisse in der Reihenfolge, in der die Mocks sie sehen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    PowerHigh,
    PowerLow,
    Read(AdcInput),
    DelayMs(u32),
    TimerStop,
    TimerStart(u32),
    Mutate,
}

pub type Log = RefCell<Vec<Op>>;

// ============================================================================
// Mock ADC
// ============================================================================

/// Liefert vorgegebene Werte pro Eingang, `None` im Skript simuliert einen Lesefehler
pub struct MockReader<'a> {
    pub panel: VecDeque<Option<i32>>,
    pub bias: VecDeque<Option<i32>>,
    pub default_mv: i32,
    pub log: Option<&'a Log>,
}

impl<'a> MockReader<'a> {
    pub fn new(default_mv: i32) -> Self {
        Self {
            panel: VecDeque::new(),
            bias: VecDeque::new(),
            default_mv,
            log: None,
        }
    }

    pub fn with_log(mut self, log: &'a Log) -> Self {
        self.log = Some(log);
        self
    }

    pub fn script_panel(mut self, values: &[Option<i32>]) -> Self {
        self.panel.extend(values.iter().copied());
        self
    }

    pub fn script_bias(mut self, values: &[Option<i32>]) -> Self {
        self.bias.extend(values.iter().copied());
        self
    }
}

impl AnalogReader for MockReader<'_> {
    fn read_mv(&mut self, input: AdcInput) -> Result<i32, ReadError> {
        if let Some(log) = self.log {
            log.borrow_mut().push(Op::Read(input));
        }
        let script = match input {
            AdcInput::Panel => &mut self.panel,
            AdcInput::Bias => &mut self.bias,
            AdcInput::BatterySense => return Ok(self.default_mv),
        };
        match script.pop_front() {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(ReadError::ConversionFailed),
            None => Ok(self.default_mv),
        }
    }
}

// ============================================================================
// Mock Power Pin
// ============================================================================

pub struct MockPowerPin<'a> {
    pub log: &'a Log,
    pub is_high: bool,
    pub fail_next_write: bool,
}

impl<'a> MockPowerPin<'a> {
    pub fn new(log: &'a Log) -> Self {
        Self {
            log,
            is_high: false,
            fail_next_write: false,
        }
    }
}

impl ErrorType for MockPowerPin<'_> {
    type Error = ErrorKind;
}

impl OutputPin for MockPowerPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(ErrorKind::Other);
        }
        self.is_high = false;
        self.log.borrow_mut().push(Op::PowerLow);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(ErrorKind::Other);
        }
        self.is_high = true;
        self.log.borrow_mut().push(Op::PowerHigh);
        Ok(())
    }
}

// ============================================================================
// Mock Delay
// ============================================================================

pub struct MockDelay<'a> {
    pub log: &'a Log,
}

impl DelayNs for MockDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(Op::DelayMs(ns / 1_000_000));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(Op::DelayMs(ms));
    }
}

// ============================================================================
// Mock Timer
// ============================================================================

pub struct MockTimer<'a> {
    pub log: &'a Log,
    pub running: &'a RefCell<bool>,
    pub period_secs: Option<u32>,
    pub fail_stop: bool,
    pub fail_start: bool,
}

impl<'a> MockTimer<'a> {
    pub fn new(log: &'a Log, running: &'a RefCell<bool>) -> Self {
        Self {
            log,
            running,
            period_secs: None,
            fail_stop: false,
            fail_start: false,
        }
    }
}

impl TimerControl for MockTimer<'_> {
    fn is_armed(&self) -> bool {
        *self.running.borrow()
    }

    fn stop(&mut self) -> Result<(), TimerError> {
        if self.fail_stop {
            return Err(TimerError::Rejected);
        }
        *self.running.borrow_mut() = false;
        self.log.borrow_mut().push(Op::TimerStop);
        Ok(())
    }

    fn start(&mut self, period_secs: u32) -> Result<(), TimerError> {
        if self.fail_start {
            return Err(TimerError::Rejected);
        }
        *self.running.borrow_mut() = true;
        self.period_secs = Some(period_secs);
        self.log.borrow_mut().push(Op::TimerStart(period_secs));
        Ok(())
    }
}

// ============================================================================
// Mock Publisher
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub qos: QoS,
    pub retain: bool,
}

#[derive(Default)]
pub struct MockPublisher {
    pub sent: Vec<Published>,
    pub disconnected: bool,
}

impl MessagePublisher for MockPublisher {
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), PublishError> {
        if self.disconnected {
            return Err(PublishError::Unavailable);
        }
        self.sent.push(Published {
            topic: topic.into(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            qos,
            retain,
        });
        Ok(())
    }
}
