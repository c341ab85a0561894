//! Ringpuffer für Kanal-Samples
//!
//! Jeder gepufferte Kanal besitzt einen `SampleBuffer`. Der Sampler schreibt,
//! der Telemetrie-Publisher liest und setzt zurück.

use crate::types::{Channel, ConfigError};

/// Statische Obergrenze für Fenstergrößen (kein Heap)
pub const MAX_WINDOW: usize = 64;

/// Ringpuffer fester Kapazität mit Mittelwert-Bildung
///
/// `N` ist der statische Speicher, `capacity` die konfigurierte Fenstergröße
/// (`1..=N`). Sobald das Fenster voll ist, werden die ältesten Werte
/// überschrieben, es bleiben immer die neuesten `capacity` Werte erhalten.
#[derive(Debug, Clone)]
pub struct SampleBuffer<const N: usize> {
    samples: [i32; N],
    capacity: usize,
    cursor: usize,
    pending: usize,
    total_writes: u32,
}

impl<const N: usize> SampleBuffer<N> {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 || capacity > N {
            return Err(ConfigError::WindowSize);
        }
        Ok(Self {
            samples: [0; N],
            capacity,
            cursor: 0,
            pending: 0,
            total_writes: 0,
        })
    }

    /// Fügt einen Wert in O(1) hinzu, überschreibt bei vollem Fenster den ältesten
    pub fn record(&mut self, value: i32) {
        self.samples[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.capacity;
        self.pending = self.pending.saturating_add(1);
        self.total_writes = self.total_writes.wrapping_add(1);
    }

    /// Anzahl lesbarer Werte seit dem letzten `reduce_and_reset()`
    pub fn len(&self) -> usize {
        self.pending.min(self.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Alle jemals geschriebenen Werte (Diagnose)
    pub fn total_writes(&self) -> u32 {
        self.total_writes
    }

    /// Mittelwert (ganzzahlig, Richtung 0 abgeschnitten) der Werte seit dem
    /// letzten Aufruf, danach wird der Zähler zurückgesetzt.
    ///
    /// `None` bedeutet "keine neuen Daten": der Aufrufer behält seinen
    /// letzten Mittelwert.
    pub fn reduce_and_reset(&mut self) -> Option<i32> {
        let count = self.len();
        if count == 0 {
            return None;
        }
        // Nach einem Reset beginnt das Schreiben wieder bei Slot 0, daher
        // liegen die gültigen Werte immer in samples[..count]
        let sum: i64 = self.samples[..count].iter().map(|&v| i64::from(v)).sum();
        self.pending = 0;
        self.cursor = 0;
        Some((sum / count as i64) as i32)
    }
}

/// Ringpuffer aller gepufferten Kanäle
#[derive(Debug, Clone)]
pub struct Windows<const N: usize> {
    irradiation: SampleBuffer<N>,
    battery: SampleBuffer<N>,
}

impl<const N: usize> Windows<N> {
    pub fn new(irradiation_window: usize, battery_window: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            irradiation: SampleBuffer::new(irradiation_window)?,
            battery: SampleBuffer::new(battery_window)?,
        })
    }

    /// Puffer eines Kanals, `None` für ungepufferte Kanäle (Bias)
    pub fn get_mut(&mut self, channel: Channel) -> Option<&mut SampleBuffer<N>> {
        match channel {
            Channel::Irradiation => Some(&mut self.irradiation),
            Channel::Battery => Some(&mut self.battery),
            Channel::Bias => None,
        }
    }

    pub fn get(&self, channel: Channel) -> Option<&SampleBuffer<N>> {
        match channel {
            Channel::Irradiation => Some(&self.irradiation),
            Channel::Battery => Some(&self.battery),
            Channel::Bias => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_last_window() {
        let mut buffer = SampleBuffer::<8>::new(3).unwrap();
        for v in [10, 20, 30, 40] {
            buffer.record(v);
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.reduce_and_reset(), Some(30));
    }

    #[test]
    fn test_partial_window() {
        let mut buffer = SampleBuffer::<8>::new(5).unwrap();
        buffer.record(1);
        buffer.record(2);
        assert_eq!(buffer.reduce_and_reset(), Some(1));
    }

    #[test]
    fn test_second_reduce_has_no_data() {
        let mut buffer = SampleBuffer::<8>::new(4).unwrap();
        buffer.record(7);
        assert_eq!(buffer.reduce_and_reset(), Some(7));
        assert_eq!(buffer.reduce_and_reset(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_negative_mean_truncates_toward_zero() {
        let mut buffer = SampleBuffer::<4>::new(2).unwrap();
        buffer.record(-3);
        buffer.record(-4);
        assert_eq!(buffer.reduce_and_reset(), Some(-3));
    }

    #[test]
    fn test_writes_after_reset_start_fresh() {
        let mut buffer = SampleBuffer::<4>::new(3).unwrap();
        for v in [100, 100, 100, 100] {
            buffer.record(v);
        }
        buffer.reduce_and_reset();
        buffer.record(4);
        assert_eq!(buffer.reduce_and_reset(), Some(4));
        assert_eq!(buffer.total_writes(), 5);
    }

    #[test]
    fn test_capacity_bounds() {
        assert!(SampleBuffer::<4>::new(0).is_err());
        assert!(SampleBuffer::<4>::new(5).is_err());
        assert!(SampleBuffer::<4>::new(4).is_ok());
    }

    #[test]
    fn test_bias_has_no_window() {
        let mut windows = Windows::<4>::new(2, 3).unwrap();
        assert!(windows.get_mut(Channel::Bias).is_none());
        assert_eq!(windows.get(Channel::Battery).map(|b| b.capacity()), Some(3));
    }
}
