// Library-Root: Wiederverwendbare Logik und Module
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod config;
pub mod hal;
pub mod tasks;

use core::cell::RefCell;

// Re-exports von esp-core
pub use esp_core::{
    ChannelTable, Event, MAX_WINDOW, QoS, RECORD_CAPACITY, RemoteCommand, Windows,
};

// Embassy Channel-Typen
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_sync::signal::Signal;
use heapless::{String, Vec};

use crate::config::MQTT_OUTBOX_CAPACITY;
use crate::hal::SensorFrontEnd;

// ============================================================================
// Steuer-Nachrichten (Controller → Tasks)
// ============================================================================

/// Verhalten des SNTP-Clients bei fehlgeschlagenen Versuchen
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SyncMode {
    /// Begrenzte Anzahl Versuche, danach erst wieder beim periodischen Re-Sync
    Immediate,
    /// Versucht es so lange, bis eine Antwort kommt
    Smooth,
}

/// Anfrage an den SNTP Task
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SyncRequest {
    Init,
    Restart,
}

/// Anfrage an den MQTT Task
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum MessagingRequest {
    Start,
    Stop,
}

/// Anfrage an den Deep-Sleep Task
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SleepRequest {
    /// Timer (neu) setzen, ein laufender Timer wird ersetzt
    Arm { delay_us: u64 },
    /// Sofort schlafen
    Now { wake_in_us: u64 },
}

// ============================================================================
// Geteilter Zustand
// ============================================================================

/// Kanal-Tabelle und Ringpuffer
///
/// Sampler schreiben, der Publisher reduziert, der Config-Task ändert die
/// Tabelle. Zugriffe sind kurz und enthalten kein `.await`.
pub struct Telemetry {
    pub table: ChannelTable,
    pub windows: Windows<MAX_WINDOW>,
}

/// Eine ausgehende MQTT-Nachricht (Telemetrie → MQTT Task)
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub topic: String<64>,
    pub payload: Vec<u8, RECORD_CAPACITY>,
    pub qos: QoS,
    pub retain: bool,
}

// ============================================================================
// Type-Aliase für Channel-Typen
// ============================================================================
//
// Statt:  Sender<'static, NoopRawMutex, Event, 8>
// Nutze:  EventSender

/// Tabelle + Puffer hinter einem Blocking-Mutex (kein await im Lock)
pub type SharedTelemetry = BlockingMutex<NoopRawMutex, RefCell<Telemetry>>;

/// ADC + Versorgungs-Pin, exklusiv während eines Sampling-Ticks
pub type SharedFrontEnd = embassy_sync::mutex::Mutex<NoopRawMutex, SensorFrontEnd>;

/// Channel für Ereignisse an den Zustandsautomaten
/// - 8: Kapazität (WiFi, SNTP, MQTT und Deep-Sleep können gleichzeitig melden)
pub type EventChannel = embassy_sync::channel::Channel<NoopRawMutex, Event, 8>;

/// Sender für Ereignisse (alle Tasks → Controller)
pub type EventSender = Sender<'static, NoopRawMutex, Event, 8>;

/// Receiver für Ereignisse (Controller empfängt)
pub type EventReceiver = Receiver<'static, NoopRawMutex, Event, 8>;

/// Channel für ausgehende MQTT-Nachrichten
pub type OutboxChannel =
    embassy_sync::channel::Channel<NoopRawMutex, OutgoingMessage, MQTT_OUTBOX_CAPACITY>;

pub type OutboxSender = Sender<'static, NoopRawMutex, OutgoingMessage, MQTT_OUTBOX_CAPACITY>;

pub type OutboxReceiver = Receiver<'static, NoopRawMutex, OutgoingMessage, MQTT_OUTBOX_CAPACITY>;

/// Channel für Remote-Konfiguration (MQTT Task → Config Task)
/// - 2: Kapazität, weitere Kommandos werden verworfen
pub type CommandChannel = embassy_sync::channel::Channel<NoopRawMutex, RemoteCommand, 2>;

pub type CommandSender = Sender<'static, NoopRawMutex, RemoteCommand, 2>;

pub type CommandReceiver = Receiver<'static, NoopRawMutex, RemoteCommand, 2>;

/// Steuersignale vom Controller; nur der letzte Wert zählt
pub type StationSignal = Signal<NoopRawMutex, ()>;
pub type SyncSignal = Signal<NoopRawMutex, SyncRequest>;
pub type MessagingSignal = Signal<NoopRawMutex, MessagingRequest>;
pub type SleepSignal = Signal<NoopRawMutex, SleepRequest>;
