// Task-Modul: Enthält alle Embassy Tasks
//
// Jeder Task läuft asynchron und unabhängig.
// Tasks melden Ereignisse an den Controller (Event-Channel),
// der Controller steuert sie über Signale und Timer-Handles.

pub mod controller;
pub mod dns;
pub mod mqtt;
pub mod power;
pub mod publisher;
pub mod reconfig;
pub mod sampler;
pub mod sntp;
pub mod wifi;

// Re-export Tasks für einfachen Import
pub use controller::{ControllerOutputs, controller_task};
pub use mqtt::mqtt_task;
pub use power::deep_sleep_task;
pub use publisher::{MqttOutbox, publisher_task};
pub use reconfig::reconfig_task;
pub use sampler::sampler_task;
pub use sntp::sntp_task;
pub use wifi::{connection_task, net_task};
