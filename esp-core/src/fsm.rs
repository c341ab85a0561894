//! Zustandsautomat für Verbindung, Zeit und Energie
//!
//! Der Zustand ist die Kombination aus sechs Flags in `SystemState`.
//! `Controller::handle()` ist der einzige Mutator: jedes externe Ereignis
//! (WiFi, SNTP, MQTT, Deep-Sleep-Timer) wird in eine Liste von Aktionen
//! übersetzt, die die Firmware der Reihe nach ausführt.
//!
//! Doppelte Ereignisse ändern nichts und werden als `Anomaly` gemeldet.

use heapless::Vec;

use crate::schedule::{LocalTime, SleepPlan, SleepWindow};

/// Maximale Anzahl Aktionen pro Ereignis
pub const MAX_ACTIONS: usize = 8;

/// Globaler Knoten-Zustand, alle Flags starten mit `false`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemState {
    pub provisioned: bool,
    pub wifi_connected: bool,
    pub time_synced: bool,
    pub time_sync_initialized: bool,
    pub messaging_connected: bool,
    /// Wechselt genau einmal auf `true` (erstes MQTT-Connect)
    pub sampling_initialized: bool,
}

/// Externe Ereignisse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Start: sind Zugangsdaten gespeichert?
    Boot { provisioned: bool },
    /// Provisionierung abgeschlossen, der Knoten ist bereits verbunden
    ProvisioningComplete,
    WifiConnected,
    WifiDisconnected,
    /// Zeit-Synchronisation erfolgreich (auch periodische Re-Syncs)
    TimeSynced { now_unix_us: i64 },
    MessagingConnected,
    MessagingDisconnected,
    /// Der Deep-Sleep-Timer ist abgelaufen
    DeepSleepDue { now_unix_us: i64 },
}

/// Aktionen, die die Firmware ausführt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    StartProvisioning,
    StartStation,
    InitTimeSync,
    RestartTimeSync,
    StartMessaging,
    StopMessaging,
    /// Einmalige Sampling-Initialisierung inkl. Warten auf die nächste volle Minute
    InitSampling,
    StartSampling,
    StartPublishing,
    StopPublishing,
    /// (Re-)Armiert den Deep-Sleep-Timer, ein laufender Timer wird ersetzt
    ArmDeepSleep { delay_us: u64 },
    EnterDeepSleep { wake_in_us: u64 },
}

pub type Actions = Vec<Action, MAX_ACTIONS>;

/// Unerwartete, aber harmlose Ereignisse (werden geloggt)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Anomaly {
    AlreadyProvisioned,
    WifiAlreadyConnected,
    WifiAlreadyDisconnected,
    MessagingAlreadyConnected,
    MessagingAlreadyDisconnected,
    /// Re-Sync auf bereits synchronisierter Uhr (normaler periodischer Fall)
    Resynced,
    /// Zeitstempel nicht in Ortszeit umrechenbar
    ClockOutOfRange,
    /// Deep-Sleep-Timer lief während der aktiven Stunden ab
    SleepOutsideWindow,
}

/// Ergebnis eines Ereignisses
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transition {
    pub actions: Actions,
    pub anomaly: Option<Anomaly>,
}

impl Transition {
    fn push(&mut self, action: Action) {
        // MAX_ACTIONS ist größer als jede Sequenz in `handle()`
        let _ = self.actions.push(action);
    }

    fn anomaly(anomaly: Anomaly) -> Self {
        Self {
            actions: Vec::new(),
            anomaly: Some(anomaly),
        }
    }
}

/// Der Zustandsautomat
#[derive(Debug, Clone)]
pub struct Controller {
    state: SystemState,
    window: SleepWindow,
    utc_offset_secs: i32,
}

impl Controller {
    pub fn new(window: SleepWindow, utc_offset_secs: i32) -> Self {
        Self {
            state: SystemState::default(),
            window,
            utc_offset_secs,
        }
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    /// Verarbeitet ein Ereignis und liefert die auszuführenden Aktionen
    pub fn handle(&mut self, event: Event) -> Transition {
        match event {
            Event::Boot { provisioned } => self.on_boot(provisioned),
            Event::ProvisioningComplete => self.on_provisioning_complete(),
            Event::WifiConnected => self.on_wifi_connected(),
            Event::WifiDisconnected => self.on_wifi_disconnected(),
            Event::TimeSynced { now_unix_us } => self.on_time_synced(now_unix_us),
            Event::MessagingConnected => self.on_messaging_connected(),
            Event::MessagingDisconnected => self.on_messaging_disconnected(),
            Event::DeepSleepDue { now_unix_us } => self.on_deep_sleep_due(now_unix_us),
        }
    }

    fn on_boot(&mut self, provisioned: bool) -> Transition {
        let mut t = Transition::default();
        if provisioned {
            self.state.provisioned = true;
            t.push(Action::StartStation);
        } else {
            t.push(Action::StartProvisioning);
        }
        t
    }

    fn on_provisioning_complete(&mut self) -> Transition {
        if self.state.provisioned {
            return Transition::anomaly(Anomaly::AlreadyProvisioned);
        }
        self.state.provisioned = true;
        // Nach der Provisionierung ist die Station bereits verbunden
        self.on_wifi_connected()
    }

    fn on_wifi_connected(&mut self) -> Transition {
        if self.state.wifi_connected {
            return Transition::anomaly(Anomaly::WifiAlreadyConnected);
        }
        self.state.wifi_connected = true;

        let mut t = Transition::default();
        if self.state.time_sync_initialized {
            t.push(Action::RestartTimeSync);
        } else {
            self.state.time_sync_initialized = true;
            t.push(Action::InitTimeSync);
        }
        t
    }

    fn on_wifi_disconnected(&mut self) -> Transition {
        if !self.state.wifi_connected {
            return Transition::anomaly(Anomaly::WifiAlreadyDisconnected);
        }
        self.state.wifi_connected = false;

        let mut t = Transition::default();
        if self.state.messaging_connected {
            self.state.messaging_connected = false;
            t.push(Action::StopMessaging);
        }
        if self.state.sampling_initialized {
            t.push(Action::StopPublishing);
        }
        t
    }

    fn on_time_synced(&mut self, now_unix_us: i64) -> Transition {
        let mut t = Transition::default();
        if self.state.time_synced {
            t.anomaly = Some(Anomaly::Resynced);
        }
        self.state.time_synced = true;

        let Some(now) = LocalTime::from_unix_us(now_unix_us, self.utc_offset_secs) else {
            t.anomaly = Some(Anomaly::ClockOutOfRange);
            return t;
        };

        match self.window.plan(now) {
            SleepPlan::Arm { delay_us } => t.push(Action::ArmDeepSleep { delay_us }),
            SleepPlan::SleepNow { wake_in_us } => {
                t.push(Action::EnterDeepSleep { wake_in_us });
                return t;
            }
        }

        if !self.state.messaging_connected {
            t.push(Action::StartMessaging);
        }
        t
    }

    fn on_messaging_connected(&mut self) -> Transition {
        if self.state.messaging_connected {
            return Transition::anomaly(Anomaly::MessagingAlreadyConnected);
        }
        self.state.messaging_connected = true;

        let mut t = Transition::default();
        if !self.state.sampling_initialized {
            self.state.sampling_initialized = true;
            t.push(Action::InitSampling);
            t.push(Action::StartSampling);
        }
        t.push(Action::StartPublishing);
        t
    }

    fn on_messaging_disconnected(&mut self) -> Transition {
        if !self.state.messaging_connected {
            return Transition::anomaly(Anomaly::MessagingAlreadyDisconnected);
        }
        self.state.messaging_connected = false;

        let mut t = Transition::default();
        if self.state.sampling_initialized {
            t.push(Action::StopPublishing);
        }
        t
    }

    fn on_deep_sleep_due(&mut self, now_unix_us: i64) -> Transition {
        let Some(now) = LocalTime::from_unix_us(now_unix_us, self.utc_offset_secs) else {
            return Transition::anomaly(Anomaly::ClockOutOfRange);
        };
        match self.window.wake_delay_us(now) {
            Some(wake_in_us) => {
                let mut t = Transition::default();
                t.push(Action::EnterDeepSleep { wake_in_us });
                t
            }
            None => Transition::anomaly(Anomaly::SleepOutsideWindow),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> Controller {
        Controller::new(SleepWindow::new(23, 7).unwrap(), 0)
    }

    #[test]
    fn test_all_flags_start_false() {
        assert_eq!(controller().state(), SystemState::default());
    }

    #[test]
    fn test_boot_without_credentials_starts_provisioning() {
        let mut fsm = controller();
        let t = fsm.handle(Event::Boot { provisioned: false });
        assert_eq!(t.actions.as_slice(), &[Action::StartProvisioning]);
        assert!(!fsm.state().provisioned);
    }

    #[test]
    fn test_provisioning_complete_counts_as_connect() {
        let mut fsm = controller();
        fsm.handle(Event::Boot { provisioned: false });
        let t = fsm.handle(Event::ProvisioningComplete);
        assert_eq!(t.actions.as_slice(), &[Action::InitTimeSync]);
        assert!(fsm.state().provisioned);
        assert!(fsm.state().wifi_connected);

        let t = fsm.handle(Event::ProvisioningComplete);
        assert_eq!(t.anomaly, Some(Anomaly::AlreadyProvisioned));
        assert!(t.actions.is_empty());
    }

    #[test]
    fn test_sleep_due_inside_uptime_does_nothing() {
        let mut fsm = controller();
        // 1970-01-01T12:00:00Z
        let t = fsm.handle(Event::DeepSleepDue { now_unix_us: 12 * 3600 * 1_000_000 });
        assert_eq!(t.anomaly, Some(Anomaly::SleepOutsideWindow));
        assert!(t.actions.is_empty());
    }
}
