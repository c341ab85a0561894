//! ESP Core - Platform-agnostic Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert Traits für ADC, Timer und Messaging sowie die
//! komplette Logik des Sensor-Knotens als Pure Functions:
//!
//! - `buffer`: Ringpuffer pro Kanal + Mittelwert-Bildung
//! - `sampler`: Lese-Strategien und Sample-Mittelung
//! - `telemetry`: Line-Protocol Datensatz für den Broker
//! - `schedule`: Deep-Sleep Planung und Minuten-Ausrichtung
//! - `sntp`: SNTP Anfrage/Antwort (RFC 4330)
//! - `command`: Remote-Konfiguration (Stop → Warten → Ändern → Start)
//! - `fsm`: Zustandsautomat für WiFi / Zeit / MQTT / Energie

#![no_std]

pub mod buffer;
pub mod command;
pub mod fsm;
pub mod sampler;
pub mod schedule;
pub mod sntp;
pub mod telemetry;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use buffer::{MAX_WINDOW, SampleBuffer, Windows};
pub use command::{
    CommandError, Parameter, ReconfigError, Reconfigured, RemoteCommand, TimerTarget, reconfigure,
};
pub use fsm::{Action, Actions, Anomaly, Controller, Event, SystemState, Transition};
pub use sampler::{SampleOutcome, average_reads, read_channel, take_sample};
pub use schedule::{LocalTime, SleepPlan, SleepWindow, millis_until_next_minute};
pub use sntp::{NTP_PACKET_SIZE, NtpError, parse_response, request_packet};
pub use telemetry::{
    FormatError, LineProtocol, PublishTick, RECORD_CAPACITY, Record, publish_tick, send_record,
};
pub use traits::{
    AnalogReader, MessagePublisher, PublishError, QoS, ReadError, TimerControl, TimerError,
};
pub use types::{AdcInput, Channel, ChannelConfig, ChannelTable, ConfigError, PUBLISH_GROUP};
