//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware- und
//! Netzwerk-Zugriff ohne konkrete Implementierung.
//!
//! # Implementierungen
//! - **Production:** esp-firmware (`hal::adc_reader`, `hal::timer`, MQTT Outbox)
//! - **Testing:** Mocks in esp-tests

use crate::types::AdcInput;

/// Fehler beim Lesen eines ADC-Eingangs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError {
    ConversionFailed,
}

/// Trait für kalibrierten ADC-Zugriff
pub trait AnalogReader {
    /// Liest einen Eingang und liefert die Spannung in Millivolt
    ///
    /// # Fehlerbehandlung
    /// Gibt `ReadError::ConversionFailed` zurück wenn die Wandlung fehlschlägt
    fn read_mv(&mut self, input: AdcInput) -> Result<i32, ReadError>;
}

/// Fehler beim Stoppen oder Starten eines periodischen Timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Die Plattform hat das Kommando nicht angenommen
    Rejected,
}

/// Trait für einen periodischen Timer (Sampler oder Publisher)
pub trait TimerControl {
    /// Ist der Timer gerade aktiv?
    fn is_armed(&self) -> bool;

    /// Stoppt den Timer. Ein laufender Tick wird nicht abgebrochen.
    fn stop(&mut self) -> Result<(), TimerError>;

    /// Startet (oder restartet) den Timer mit der angegebenen Periode
    fn start(&mut self, period_secs: u32) -> Result<(), TimerError>;
}

/// MQTT Quality of Service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
}

/// Fehler beim Übergeben einer Nachricht an den Transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishError {
    /// Transport nimmt gerade nichts an (Queue voll / getrennt)
    Unavailable,
}

/// Trait für den Messaging-Transport
pub trait MessagePublisher {
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), PublishError>;
}
