// Hardware Abstraction Layer (HAL) Module
//
// Implementiert die Traits aus esp-core für den ESP32-C6
// und kapselt Timer und Uhrzeit für die Tasks.

pub mod adc_reader;
pub mod clock;
pub mod timer;

pub use adc_reader::{EspAnalogReader, SensorFrontEnd};
pub use clock::WallClock;
pub use timer::{PeriodicTimer, TaskTimer, TimerEvent, TimerSet};
