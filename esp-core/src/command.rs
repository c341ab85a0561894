//! Remote-Konfiguration über MQTT
//!
//! Topics enthalten ein Kanal-Token (`irradiation` / `battery_level`) und ein
//! Parameter-Token (`sample_frequency` / `send_frequency` / `sample_number`).
//! Die Payload ist eine Dezimalzahl.
//!
//! Eine Änderung läuft immer als Stop → Ruhepause → Ändern → Restart ab,
//! damit kein Tick desselben Timers parallel zur Änderung läuft.

use embedded_hal_async::delay::DelayNs;

use crate::traits::{TimerControl, TimerError};
use crate::types::{Channel, ChannelTable};

/// Pause zwischen Stop und Änderung, damit ein laufender Tick fertig wird
pub const QUIESCENCE_DELAY_MS: u32 = 500;

/// Änderbarer Parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parameter {
    /// `sample_frequency`: Sampling-Periode in Sekunden
    SamplePeriod,
    /// `send_frequency`: Sende-Periode in Sekunden
    PublishPeriod,
    /// `sample_number`: Lesungen pro Sample
    SamplesPerRead,
}

/// Fehler beim Parsen eines Remote-Kommandos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    UnknownChannel,
    UnknownParameter,
    /// Payload ist keine positive Dezimalzahl
    InvalidValue,
}

/// Welcher Timer von einer Änderung betroffen ist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerTarget {
    Sampler(Channel),
    Publisher,
}

/// Ein geparstes Remote-Kommando
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RemoteCommand {
    pub channel: Channel,
    pub parameter: Parameter,
    pub value: u32,
}

impl RemoteCommand {
    /// Parst Topic und Payload
    ///
    /// # Beispiele
    ///
    /// ```
    /// # use esp_core::{Channel, Parameter, RemoteCommand};
    /// let cmd = RemoteCommand::parse("/ciu/lopy4/battery_level/sample_number", b"8").unwrap();
    /// assert_eq!(cmd.channel, Channel::Battery);
    /// assert_eq!(cmd.parameter, Parameter::SamplesPerRead);
    /// assert_eq!(cmd.value, 8);
    /// ```
    pub fn parse(topic: &str, payload: &[u8]) -> Result<Self, CommandError> {
        let channel = if topic.contains("irradiation") {
            Channel::Irradiation
        } else if topic.contains("battery_level") {
            Channel::Battery
        } else {
            return Err(CommandError::UnknownChannel);
        };

        let parameter = if topic.contains("sample_frequency") {
            Parameter::SamplePeriod
        } else if topic.contains("send_frequency") {
            Parameter::PublishPeriod
        } else if topic.contains("sample_number") {
            Parameter::SamplesPerRead
        } else {
            return Err(CommandError::UnknownParameter);
        };

        let value = core::str::from_utf8(payload)
            .ok()
            .and_then(|text| text.trim().parse::<u32>().ok())
            .filter(|&value| value > 0)
            .ok_or(CommandError::InvalidValue)?;

        Ok(Self {
            channel,
            parameter,
            value,
        })
    }

    pub fn target(&self) -> TimerTarget {
        match self.parameter {
            Parameter::PublishPeriod => TimerTarget::Publisher,
            Parameter::SamplePeriod | Parameter::SamplesPerRead => {
                TimerTarget::Sampler(self.channel)
            }
        }
    }

    /// Schreibt den neuen Wert in die Tabelle und liefert die Periode,
    /// mit der der betroffene Timer neu gestartet wird
    ///
    /// Die Sende-Periode gilt für die ganze Publish-Gruppe (ein gemeinsamer Tick).
    pub fn apply(&self, table: &mut ChannelTable) -> u32 {
        match self.parameter {
            Parameter::SamplePeriod => {
                let config = table.get_mut(self.channel);
                config.sample_period_secs = self.value;
                config.sample_period_secs
            }
            Parameter::SamplesPerRead => {
                let config = table.get_mut(self.channel);
                config.samples_per_read = self.value;
                config.sample_period_secs
            }
            Parameter::PublishPeriod => {
                table.set_publish_period_secs(self.value);
                table.publish_period_secs()
            }
        }
    }
}

/// Fehler während einer Rekonfiguration
///
/// Bei `Start` wurde die Änderung bereits übernommen, der Timer steht aber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReconfigError {
    Stop(TimerError),
    Start(TimerError),
}

/// Ergebnis einer erfolgreichen Rekonfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reconfigured {
    /// Timer läuft wieder mit dieser Periode
    Restarted { period_secs: u32 },
    /// Timer war nicht aktiv, nur die Konfiguration wurde geändert
    Stored,
}

/// Stop → `QUIESCENCE_DELAY_MS` warten → `mutate()` → Restart
///
/// `mutate` liefert die neue Periode. Ein Timer, der weder vorher lief noch
/// während der Ruhepause gestartet wurde, bleibt gestoppt. Wurde er in der
/// Pause gestartet, läuft er noch mit der alten Periode und wird neu gestartet.
pub async fn reconfigure<T, D, F>(
    timer: &mut T,
    delay: &mut D,
    mutate: F,
) -> Result<Reconfigured, ReconfigError>
where
    T: TimerControl,
    D: DelayNs,
    F: FnOnce() -> u32,
{
    let was_armed = timer.is_armed();
    timer.stop().map_err(ReconfigError::Stop)?;

    delay.delay_ms(QUIESCENCE_DELAY_MS).await;

    let period_secs = mutate();
    if !was_armed && !timer.is_armed() {
        return Ok(Reconfigured::Stored);
    }

    timer.start(period_secs).map_err(ReconfigError::Start)?;
    Ok(Reconfigured::Restarted { period_secs })
}
