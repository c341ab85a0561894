// WiFi Task - Verbindet mit WLAN und meldet Verbindungswechsel an den Controller
use defmt::{Debug2Format, error, info, warn};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use esp_core::Event;
use esp_radio::wifi::{ClientConfig, ModeConfig, ScanConfig, WifiController, WifiDevice, WifiEvent};

use crate::config::{WIFI_PASSWORD, WIFI_RECONNECT_DELAY_SECS, WIFI_SSID};
use crate::{EventSender, StationSignal};

/// WiFi Connection Task
///
/// Managed die WiFi-Verbindung:
/// - Wartet auf `StartStation` vom Controller
/// - Verbindet mit Access Point und wartet auf DHCP
/// - Meldet `WifiConnected` / `WifiDisconnected`
/// - Reconnected bei Verbindungsverlust
#[embassy_executor::task]
pub async fn connection_task(
    mut controller: WifiController<'static>,
    stack: &'static Stack<'static>,
    start: &'static StationSignal,
    events: EventSender,
) {
    info!("WiFi: Waiting for station start...");
    start.wait().await;
    info!("WiFi: Starting connection task");

    let mut attempt: u32 = 0;

    loop {
        if matches!(controller.is_started(), Ok(false)) {
            info!("WiFi: Configuring and starting...");

            // Configure WiFi station mode
            let client_config = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(WIFI_SSID.into())
                    .with_password(WIFI_PASSWORD.into()),
            );

            if let Err(e) = controller.set_config(&client_config) {
                error!("WiFi: Failed to set configuration: {}", Debug2Format(&e));
                Timer::after(Duration::from_secs(5)).await;
                continue;
            }

            if let Err(e) = controller.start_async().await {
                error!("WiFi: Failed to start: {}", Debug2Format(&e));
                Timer::after(Duration::from_secs(5)).await;
                continue;
            }

            info!("WiFi: Started successfully");
        }

        if attempt == 0 {
            log_target_ap(&mut controller).await;
        }

        // Connect to AP
        attempt += 1;
        info!("WiFi: Connecting to '{}' (attempt {})...", WIFI_SSID, attempt);
        if let Err(e) = controller.connect_async().await {
            error!("WiFi: Connection failed: {}", Debug2Format(&e));
            Timer::after(Duration::from_secs(WIFI_RECONNECT_DELAY_SECS)).await;
            continue;
        }
        info!("WiFi: Connected successfully!");
        attempt = 0;

        wait_for_ip(stack).await;
        events.send(Event::WifiConnected).await;

        // Wait for disconnect
        controller.wait_for_event(WifiEvent::StaDisconnected).await;
        warn!("WiFi: Disconnected from AP, will retry...");
        events.send(Event::WifiDisconnected).await;

        Timer::after(Duration::from_secs(WIFI_RECONNECT_DELAY_SECS)).await;
    }
}

/// Scan nach dem Ziel-AP (nur für Debugging)
async fn log_target_ap(controller: &mut WifiController<'static>) {
    match controller
        .scan_with_config_async(ScanConfig::default())
        .await
    {
        Ok(ap_infos) => {
            info!("WiFi: Found {} access points", ap_infos.len());
            if let Some(ap_info) = ap_infos.iter().find(|ap| ap.ssid.as_str() == WIFI_SSID) {
                info!(
                    "WiFi: Target AP found - SSID: {}, Signal: {} dBm",
                    WIFI_SSID, ap_info.signal_strength
                );
            }
        }
        Err(e) => {
            warn!("WiFi: Scan failed: {}", Debug2Format(&e));
        }
    }
}

/// Wartet bis Link und IP-Adresse da sind und loggt die Netzwerk-Konfiguration
async fn wait_for_ip(stack: &'static Stack<'static>) {
    loop {
        if stack.is_link_up() {
            if let Some(config) = stack.config_v4() {
                info!("WiFi: Got IP address!");
                info!("  IP:      {}", Debug2Format(&config.address.address()));
                info!("  Gateway: {}", Debug2Format(&config.gateway));
                info!("  DNS:     {}", Debug2Format(&config.dns_servers));
                return;
            }
        }
        Timer::after(Duration::from_millis(500)).await;
    }
}

/// Network Task
///
/// Überwacht den Netzwerk-Stack:
/// - Prozessiert Netzwerk-Pakete
/// - Managed TCP/IP Stack
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}
