//! Deep-Sleep Planung und Minuten-Ausrichtung
//!
//! Der Knoten ist zwischen `wake_hour` (inklusive) und `sleep_hour`
//! (exklusive) Ortszeit aktiv. Außerhalb dieses Fensters schläft er.

use chrono::{DateTime, FixedOffset, Timelike};

const MICROS_PER_MINUTE: u64 = 60 * 1_000_000;

/// Stunden und Minuten in Mikrosekunden
pub const fn hm_to_us(hours: u64, minutes: u64) -> u64 {
    (minutes + 60 * hours) * MICROS_PER_MINUTE
}

/// Ortszeit mit Minuten-Auflösung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
}

impl LocalTime {
    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// Rechnet Unix-Mikrosekunden mit festem UTC-Offset in Ortszeit um
    ///
    /// `None` wenn der Zeitstempel oder der Offset außerhalb des gültigen Bereichs liegt.
    pub fn from_unix_us(unix_us: i64, utc_offset_secs: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(utc_offset_secs)?;
        let local = DateTime::from_timestamp_micros(unix_us)?.with_timezone(&offset);
        Some(Self {
            hour: local.hour() as u8,
            minute: local.minute() as u8,
        })
    }
}

/// Entscheidung nach einer Zeit-Synchronisation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepPlan {
    /// Aktive Stunden: Deep-Sleep-Timer mit dieser Verzögerung scharf schalten
    Arm { delay_us: u64 },
    /// Bereits im Schlaf-Fenster: sofort schlafen, nach `wake_in_us` aufwachen
    SleepNow { wake_in_us: u64 },
}

/// Konfiguriertes Schlaf-Fenster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SleepWindow {
    pub sleep_hour: u8,
    pub wake_hour: u8,
}

impl SleepWindow {
    /// `None` wenn `wake_hour < sleep_hour < 24` nicht erfüllt ist
    pub const fn new(sleep_hour: u8, wake_hour: u8) -> Option<Self> {
        if wake_hour < sleep_hour && sleep_hour < 24 {
            Some(Self { sleep_hour, wake_hour })
        } else {
            None
        }
    }

    /// Aktiv wenn `wake_hour <= hour < sleep_hour`
    pub fn is_uptime(&self, now: LocalTime) -> bool {
        now.hour >= self.wake_hour && now.hour < self.sleep_hour
    }

    /// Schlafdauer bis zur nächsten Aufwach-Stunde, `None` während der aktiven Stunden
    pub fn wake_delay_us(&self, now: LocalTime) -> Option<u64> {
        if self.is_uptime(now) {
            return None;
        }
        let minutes = 60 - u64::from(now.minute);
        let hours = if now.hour < self.wake_hour {
            // nach Mitternacht
            u64::from(self.wake_hour - now.hour - 1)
        } else {
            // vor Mitternacht
            u64::from(23 - now.hour + self.wake_hour)
        };
        Some(hm_to_us(hours, minutes))
    }

    /// Plant den nächsten Deep-Sleep ausgehend von der aktuellen Ortszeit
    pub fn plan(&self, now: LocalTime) -> SleepPlan {
        match self.wake_delay_us(now) {
            Some(wake_in_us) => SleepPlan::SleepNow { wake_in_us },
            None => {
                let hours = u64::from(self.sleep_hour - now.hour - 1);
                let minutes = 60 - u64::from(now.minute);
                SleepPlan::Arm {
                    delay_us: hm_to_us(hours, minutes),
                }
            }
        }
    }
}

/// Wartezeit in Millisekunden bis zur nächsten vollen Minute
///
/// Damit fallen die Publish-Ticks auf Minutengrenzen der Wanduhr.
pub fn millis_until_next_minute(unix_us: i64) -> u64 {
    let secs = unix_us.div_euclid(1_000_000);
    let micros = unix_us.rem_euclid(1_000_000);
    let delta_ms = (60 - secs.rem_euclid(60)) * 1000 - micros / 1000;
    delta_ms.max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: SleepWindow = SleepWindow {
        sleep_hour: 23,
        wake_hour: 7,
    };

    #[test]
    fn test_hm_to_us() {
        assert_eq!(hm_to_us(0, 1), 60_000_000);
        assert_eq!(hm_to_us(1, 30), 5_400_000_000);
    }

    #[test]
    fn test_arm_during_uptime() {
        let plan = WINDOW.plan(LocalTime::new(22, 30));
        assert_eq!(plan, SleepPlan::Arm { delay_us: hm_to_us(0, 30) });
    }

    #[test]
    fn test_after_midnight_sleeps_until_wake() {
        let plan = WINDOW.plan(LocalTime::new(2, 15));
        assert_eq!(plan, SleepPlan::SleepNow { wake_in_us: hm_to_us(4, 45) });
    }

    #[test]
    fn test_invalid_window() {
        assert!(SleepWindow::new(7, 23).is_none());
        assert!(SleepWindow::new(24, 7).is_none());
        assert_eq!(SleepWindow::new(23, 7), Some(WINDOW));
    }

    #[test]
    fn test_local_time_applies_offset() {
        // 2024-01-01T22:10:00Z
        let unix_us = 1_704_147_000_000_000;
        assert_eq!(LocalTime::from_unix_us(unix_us, 0), Some(LocalTime::new(22, 10)));
        assert_eq!(LocalTime::from_unix_us(unix_us, 3600), Some(LocalTime::new(23, 10)));
    }

    #[test]
    fn test_minute_alignment() {
        assert_eq!(millis_until_next_minute(0), 60_000);
        assert_eq!(millis_until_next_minute(59_500_000), 500);
        assert_eq!(millis_until_next_minute(61_250_000), 58_750);
    }
}
