// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen
#![allow(dead_code)]

use esp_core::{ChannelConfig, SleepWindow};

use crate::SyncMode;

// ============================================================================
// Kanal-Konfiguration (Startwerte, zur Laufzeit per MQTT änderbar)
// ============================================================================

/// Fenstergröße Einstrahlung (Anzahl gepufferter Samples)
pub const WINDOW_SIZE_IRRADIATION: usize = 12;

/// Fenstergröße Batterie
pub const WINDOW_SIZE_BATTERY: usize = 12;

/// Solar-Panel: alle 5 s ein Sample aus 4 Lesungen, Senden jede Minute
pub const IRRADIATION_CHANNEL: ChannelConfig =
    ChannelConfig::new("irradiation", WINDOW_SIZE_IRRADIATION, 5, 60, 4);

/// Batterie: alle 5 s ein Sample aus 4 Lesungen, Senden jede Minute
pub const BATTERY_CHANNEL: ChannelConfig =
    ChannelConfig::new("battery", WINDOW_SIZE_BATTERY, 5, 60, 4);

/// Bias: wird nur als Momentanwert für die Einstrahlung gelesen
pub const BIAS_CHANNEL: ChannelConfig =
    ChannelConfig::new("", WINDOW_SIZE_IRRADIATION, 5, 60, 4);

// ============================================================================
// Hardware-Konfiguration
// ============================================================================

// Verdrahtung (siehe main.rs):
// - GPIO21: Panel-Versorgung (Power-Enable)
// - GPIO0:  Panel (ADC1)
// - GPIO1:  Batterie-Sense (ADC1)
// - GPIO6:  Bias (ADC1)

/// Panel-Versorgung nur während der Messung einschalten
pub const SHUT_DOWN_POWER_PIN: bool = true;

/// Panel-Versorgung vor dem Deep-Sleep abschalten
pub const SHUT_DOWN_POWER_PIN_ON_SLEEP: bool = true;

// ============================================================================
// Deep-Sleep Konfiguration
// ============================================================================

/// Ab dieser Stunde (Ortszeit) schläft der Knoten
pub const HOUR_TO_SLEEP: u8 = 23;

/// Ab dieser Stunde (Ortszeit) ist der Knoten aktiv
pub const HOUR_TO_WAKEUP: u8 = 7;

/// Schlaf-Fenster, wird zur Compile-Zeit geprüft (wake < sleep < 24)
pub const SLEEP_WINDOW: SleepWindow = match SleepWindow::new(HOUR_TO_SLEEP, HOUR_TO_WAKEUP) {
    Some(window) => window,
    None => panic!("HOUR_TO_WAKEUP muss vor HOUR_TO_SLEEP liegen"),
};

/// Fester UTC-Offset der Ortszeit in Sekunden (Europe/Madrid, Winterzeit)
pub const UTC_OFFSET_SECS: i32 = 3600;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_SSID: &str = env!(
    "WIFI_SSID",
    "WiFi SSID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// WiFi Passwort
/// Wird zur Build-Zeit aus der Environment Variable WIFI_PASSWORD geladen
pub const WIFI_PASSWORD: &str = env!(
    "WIFI_PASSWORD",
    "WiFi Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Wartezeit zwischen WiFi-Reconnect-Versuchen in Sekunden
pub const WIFI_RECONNECT_DELAY_SECS: u64 = 2;

/// Heap-Größe für WiFi (Bytes)
/// WiFi benötigt dynamischen Speicher für Pakete
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

// ============================================================================
// SNTP Konfiguration
// ============================================================================

/// NTP Server Hostname
pub const SNTP_SERVER: &str = "pool.ntp.org";

/// NTP Port (RFC 4330)
pub const SNTP_PORT: u16 = 123;

/// Periodischer Re-Sync in Sekunden (30 Minuten)
pub const SNTP_SYNC_INTERVAL_SECS: u64 = 30 * 60;

/// Maximale Sync-Versuche im Immediate-Modus
pub const SNTP_MAX_RETRIES: u32 = 10;

/// Wartezeit zwischen Sync-Versuchen in Sekunden
pub const SNTP_RETRY_DELAY_SECS: u64 = 2;

/// Timeout für eine einzelne NTP-Antwort in Sekunden
pub const SNTP_RESPONSE_TIMEOUT_SECS: u64 = 5;

/// UDP Buffer-Größe für SNTP (ein NTP-Paket = 48 Bytes)
pub const SNTP_BUFFER_SIZE: usize = 128;

/// Sync-Modus beim (Re-)Start des SNTP-Clients
pub const SNTP_SYNC_MODE: SyncMode = SyncMode::Immediate;

// ============================================================================
// MQTT Konfiguration
// ============================================================================

/// MQTT Broker Hostname oder IP-Adresse
/// Wird zur Build-Zeit aus der Environment Variable MQTT_BROKER geladen
pub const MQTT_BROKER: &str = env!(
    "MQTT_BROKER",
    "MQTT Broker nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// MQTT Broker Port
/// Standard: 1883 (unverschlüsselt), 8883 (TLS)
pub const MQTT_PORT: u16 = 1883;

/// MQTT Client ID
/// Eindeutige Kennung für diesen Knoten
pub const MQTT_CLIENT_ID: &str = env!(
    "MQTT_CLIENT_ID",
    "MQTT Client ID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Topic für die Telemetrie-Datensätze
pub const MQTT_TOPIC_TELEMETRY: &str = "/ciu/lopy4/irradiation/1";

/// Topics für die Remote-Konfiguration
/// `<prefix>/<kanal>/<parameter>`
pub const MQTT_CONFIG_TOPICS: [&str; 6] = [
    "/ciu/lopy4/config/irradiation/sample_frequency",
    "/ciu/lopy4/config/irradiation/send_frequency",
    "/ciu/lopy4/config/irradiation/sample_number",
    "/ciu/lopy4/config/battery_level/sample_frequency",
    "/ciu/lopy4/config/battery_level/send_frequency",
    "/ciu/lopy4/config/battery_level/sample_number",
];

/// MQTT Keep-Alive in Sekunden
pub const MQTT_KEEP_ALIVE_SECS: u16 = 30;

/// MQTT Reconnect Delay in Sekunden
/// Wartezeit nach Verbindungsfehler vor erneutem Versuch
pub const MQTT_RECONNECT_DELAY_SECS: u64 = 5;

/// MQTT Buffer-Größe in Bytes
/// Muss groß genug für MQTT-Pakete sein
pub const MQTT_BUFFER_SIZE: usize = 1024;

/// Kapazität der Ausgangs-Queue (Telemetrie → MQTT Task)
pub const MQTT_OUTBOX_CAPACITY: usize = 4;

/// DNS Query Timeout in Sekunden
pub const DNS_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Telemetrie-Format (Line Protocol)
// ============================================================================

/// Measurement-Name
pub const TELEMETRY_MEASUREMENT: &str = "cabahla";

/// Tag-Suffix direkt hinter dem Measurement
pub const TELEMETRY_TAG: &str = ",id=v1-n6";
