//! Core Types für den Sensor-Knoten
//!
//! Kanäle, Hardware-Eingänge und die Kanal-Konfigurationstabelle.
//! Die Menge der Kanäle ist geschlossen: jede Lese-Strategie ist fest
//! einem Kanal zugeordnet (siehe `sampler::read_channel`).

/// Logischer Messkanal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Solar-Einstrahlung (Panel minus Bias), gepuffert und publiziert
    Irradiation,
    /// Batteriespannung, gepuffert und publiziert
    Battery,
    /// Kalibrierungs-Kanal, nur Momentanwert für `Irradiation`
    Bias,
}

/// Anzahl logischer Kanäle
pub const CHANNEL_COUNT: usize = 3;

/// Publish-Gruppe: Kanäle in fester Reihenfolge im Telemetrie-Datensatz
pub const PUBLISH_GROUP: [Channel; 2] = [Channel::Irradiation, Channel::Battery];

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] =
        [Channel::Irradiation, Channel::Battery, Channel::Bias];

    /// Index in der Kanal-Tabelle
    pub const fn index(self) -> usize {
        match self {
            Channel::Irradiation => 0,
            Channel::Battery => 1,
            Channel::Bias => 2,
        }
    }

    /// Kanäle mit eigenem Ringpuffer und eigenem Sampling-Timer
    pub const fn is_windowed(self) -> bool {
        !matches!(self, Channel::Bias)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Channel::Irradiation => "irradiation",
            Channel::Battery => "battery",
            Channel::Bias => "bias",
        }
    }
}

/// Physischer ADC-Eingang
///
/// `BatterySense` ist verdrahtet und konfiguriert, wird aber von der
/// Batterie-Strategie nicht gelesen (sie skaliert den Panel-Wert).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcInput {
    Panel,
    BatterySense,
    Bias,
}

/// Fehler bei ungültiger Kanal-Konfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Fenstergröße ist 0 oder größer als der statische Puffer
    WindowSize,
    /// samples_per_read ist 0
    SamplesPerRead,
    /// Sample- oder Sende-Periode ist 0
    Period,
}

/// Konfiguration eines Kanals
///
/// `sample_period_secs`, `publish_period_secs` und `samples_per_read`
/// sind zur Laufzeit per Remote-Kommando änderbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Maximale Anzahl gepufferter Samples
    pub window_size: usize,
    /// Sampling-Periode in Sekunden
    pub sample_period_secs: u32,
    /// Sende-Periode in Sekunden
    pub publish_period_secs: u32,
    /// Anzahl Lesungen, die pro Sample gemittelt werden
    pub samples_per_read: u32,
    /// Feldname im Line-Protocol Datensatz
    pub field: &'static str,
    /// Zuletzt berechneter Mittelwert (wird bei leerem Puffer erneut gesendet)
    pub last_mean: i32,
}

impl ChannelConfig {
    pub const fn new(
        field: &'static str,
        window_size: usize,
        sample_period_secs: u32,
        publish_period_secs: u32,
        samples_per_read: u32,
    ) -> Self {
        Self {
            window_size,
            sample_period_secs,
            publish_period_secs,
            samples_per_read,
            field,
            last_mean: 0,
        }
    }

    /// Prüft die Invarianten: window_size > 0, samples_per_read >= 1, Perioden > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::WindowSize);
        }
        if self.samples_per_read == 0 {
            return Err(ConfigError::SamplesPerRead);
        }
        if self.sample_period_secs == 0 || self.publish_period_secs == 0 {
            return Err(ConfigError::Period);
        }
        Ok(())
    }
}

/// Tabelle aller Kanal-Konfigurationen, indiziert über `Channel`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTable {
    configs: [ChannelConfig; CHANNEL_COUNT],
}

impl ChannelTable {
    /// Erstellt die Tabelle und validiert jede Konfiguration
    pub fn new(
        irradiation: ChannelConfig,
        battery: ChannelConfig,
        bias: ChannelConfig,
    ) -> Result<Self, ConfigError> {
        let configs = [irradiation, battery, bias];
        for config in &configs {
            config.validate()?;
        }
        Ok(Self { configs })
    }

    pub fn get(&self, channel: Channel) -> &ChannelConfig {
        &self.configs[channel.index()]
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut ChannelConfig {
        &mut self.configs[channel.index()]
    }

    /// Sende-Periode der Publish-Gruppe (alle Mitglieder teilen einen Tick)
    pub fn publish_period_secs(&self) -> u32 {
        self.get(PUBLISH_GROUP[0]).publish_period_secs
    }

    /// Setzt die Sende-Periode für alle Kanäle der Publish-Gruppe
    pub fn set_publish_period_secs(&mut self, secs: u32) {
        for channel in PUBLISH_GROUP {
            self.get_mut(channel).publish_period_secs = secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ChannelTable {
        ChannelTable::new(
            ChannelConfig::new("irradiation", 10, 5, 60, 4),
            ChannelConfig::new("battery", 6, 10, 60, 2),
            ChannelConfig::new("", 10, 5, 60, 4),
        )
        .unwrap()
    }

    #[test]
    fn test_channel_indices_are_distinct() {
        let indices = Channel::ALL.map(Channel::index);
        assert_eq!(indices, [0, 1, 2]);
    }

    #[test]
    fn test_bias_is_not_windowed() {
        assert!(Channel::Irradiation.is_windowed());
        assert!(Channel::Battery.is_windowed());
        assert!(!Channel::Bias.is_windowed());
    }

    #[test]
    fn test_rejects_zero_window() {
        let result = ChannelTable::new(
            ChannelConfig::new("irradiation", 0, 5, 60, 4),
            ChannelConfig::new("battery", 6, 10, 60, 2),
            ChannelConfig::new("", 10, 5, 60, 4),
        );
        assert_eq!(result, Err(ConfigError::WindowSize));
    }

    #[test]
    fn test_rejects_zero_samples_per_read() {
        let config = ChannelConfig::new("battery", 6, 10, 60, 0);
        assert_eq!(config.validate(), Err(ConfigError::SamplesPerRead));
    }

    #[test]
    fn test_publish_period_is_shared_by_group() {
        let mut table = table();
        table.set_publish_period_secs(120);
        assert_eq!(table.get(Channel::Irradiation).publish_period_secs, 120);
        assert_eq!(table.get(Channel::Battery).publish_period_secs, 120);
        assert_eq!(table.get(Channel::Bias).publish_period_secs, 60);
        assert_eq!(table.publish_period_secs(), 120);
    }
}
