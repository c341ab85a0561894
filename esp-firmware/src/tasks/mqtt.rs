// MQTT Task - Sendet Telemetrie und empfängt Remote-Konfiguration
use defmt::{Debug2Format, error, info, warn};
use embassy_futures::select::{Either, Either3, select, select3};
use embassy_net::{Stack, tcp::TcpSocket};
use embassy_time::{Duration, Ticker, Timer};
use esp_core::{Event, QoS, RemoteCommand};

use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::utils::rng_generator::CountingRng;
use rust_mqtt::utils::types::EncodedString;

use super::dns::{DnsError, resolve_hostname};
use crate::config::*;
use crate::{
    CommandSender, EventSender, MessagingRequest, MessagingSignal, OutboxReceiver,
    OutgoingMessage,
};

/// MQTT Task - läuft parallel zu anderen Tasks
///
/// Dieser Task übernimmt den kompletten Messaging-Pfad:
/// - Wartet auf `Start` vom Controller (nach der ersten Zeit-Synchronisation)
/// - Verbindet sich mit dem Broker und abonniert die Konfigurations-Topics
/// - Meldet `MessagingConnected` / `MessagingDisconnected`
/// - Sendet Nachrichten aus der Outbox (QoS und Retain pro Nachricht)
/// - Leitet Konfigurations-Nachrichten an den Config Task weiter
/// - Automatisches Reconnect bei Fehlern, bis `Stop` kommt
#[embassy_executor::task]
pub async fn mqtt_task(
    stack: &'static Stack<'static>,
    control: &'static MessagingSignal,
    outbox: OutboxReceiver,
    commands: CommandSender,
    events: EventSender,
) {
    info!("MQTT: Task started, waiting for start request...");

    loop {
        wait_for_request(control, MessagingRequest::Start).await;
        info!("MQTT: Starting session");
        run_until_stopped(stack, control, &outbox, &commands, &events).await;
        info!("MQTT: Stopped");
    }
}

/// Verbindet und reconnected, bis der Controller `Stop` sendet
///
/// Bei angefordertem Stop wird kein `MessagingDisconnected` gemeldet,
/// der Controller kennt den Zustand bereits.
async fn run_until_stopped(
    stack: &'static Stack<'static>,
    control: &'static MessagingSignal,
    outbox: &OutboxReceiver,
    commands: &CommandSender,
    events: &EventSender,
) {
    loop {
        let mut connected = false;
        let session = mqtt_session(stack, outbox, commands, events, &mut connected);

        match select(session, wait_for_request(control, MessagingRequest::Stop)).await {
            Either::First(Ok(())) => warn!("MQTT: Connection closed normally"),
            Either::First(Err(e)) => error!("MQTT: Error: {}", e),
            Either::Second(()) => return,
        }

        if connected {
            events.send(Event::MessagingDisconnected).await;
        }

        info!("MQTT: Reconnecting in {}s...", MQTT_RECONNECT_DELAY_SECS);
        let delay = Timer::after(Duration::from_secs(MQTT_RECONNECT_DELAY_SECS));
        if let Either::Second(()) =
            select(delay, wait_for_request(control, MessagingRequest::Stop)).await
        {
            return;
        }
    }
}

/// Wartet auf eine bestimmte Anfrage, andere werden geloggt und ignoriert
async fn wait_for_request(control: &'static MessagingSignal, expected: MessagingRequest) {
    loop {
        let request = control.wait().await;
        if request == expected {
            return;
        }
        info!("MQTT: Ignoring {} (already in that state)", request);
    }
}

/// Wartet bis Netzwerk-Verbindung verfügbar ist
///
/// Prüft kontinuierlich Link-Status und DHCP-Konfiguration.
async fn wait_for_network(stack: &'static Stack<'static>) {
    loop {
        if stack.is_link_up() && stack.config_v4().is_some() {
            break;
        }
        Timer::after(Duration::from_millis(500)).await;
    }
}

/// Nächster Schritt im Session-Loop
enum SessionStep {
    Publish(OutgoingMessage),
    Ping,
}

/// Eine MQTT-Session von DNS bis Verbindungsabbruch
///
/// Diese Funktion übernimmt den kompletten MQTT-Lifecycle:
/// 1. DNS-Auflösung des Broker-Hostnames
/// 2. TCP-Verbindung aufbauen
/// 3. MQTT CONNECT senden und Konfigurations-Topics abonnieren
/// 4. Outbox senden, eingehende Nachrichten verarbeiten, Keep-Alive pingen
///
/// Bei jedem Fehler wird die Funktion beendet und der Aufrufer
/// startet automatisch einen Reconnect-Versuch.
async fn mqtt_session(
    stack: &'static Stack<'static>,
    outbox: &OutboxReceiver,
    commands: &CommandSender,
    events: &EventSender,
    connected: &mut bool,
) -> Result<(), MqttError> {
    wait_for_network(stack).await;

    // DNS Lookup
    info!("MQTT: Resolving '{}'...", MQTT_BROKER);
    let broker_ip = resolve_hostname(stack, MQTT_BROKER).await?;
    info!("MQTT: Resolved to {}", Debug2Format(&broker_ip));

    // TCP Connect
    let mut rx_buffer = [0u8; 4096];
    let mut tx_buffer = [0u8; 4096];
    let mut socket = TcpSocket::new(*stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(
        u64::from(MQTT_KEEP_ALIVE_SECS) * 2,
    )));

    socket
        .connect((broker_ip, MQTT_PORT))
        .await
        .map_err(|_| MqttError::ConnectionFailed)?;
    info!("MQTT: TCP connected");

    // MQTT Client Configuration
    let rng = CountingRng(20000);
    let mut config = ClientConfig::<5, _>::new(MqttVersion::MQTTv5, rng);
    config.client_id = EncodedString {
        string: MQTT_CLIENT_ID,
        len: MQTT_CLIENT_ID.len() as u16,
    };
    config.keep_alive = MQTT_KEEP_ALIVE_SECS;
    config.max_packet_size = MQTT_BUFFER_SIZE as u32;

    // MQTT Buffer
    let mut send_buffer = [0u8; MQTT_BUFFER_SIZE];
    let mut recv_buffer = [0u8; MQTT_BUFFER_SIZE];

    // MQTT Client erstellen
    let mut client = MqttClient::<_, 5, _>::new(
        socket,
        &mut send_buffer,
        MQTT_BUFFER_SIZE,
        &mut recv_buffer,
        MQTT_BUFFER_SIZE,
        config,
    );

    // MQTT CONNECT
    client
        .connect_to_broker()
        .await
        .map_err(|_| MqttError::ProtocolError)?;
    info!("MQTT: Connected to broker");

    for topic in MQTT_CONFIG_TOPICS {
        client
            .subscribe_to_topic(topic)
            .await
            .map_err(|_| MqttError::SubscribeFailed)?;
    }
    info!("MQTT: Subscribed to {} config topics", MQTT_CONFIG_TOPICS.len());

    *connected = true;
    events.send(Event::MessagingConnected).await;

    // Keep-Alive: Ping nach der halben Keep-Alive Zeit
    let mut ping = Ticker::every(Duration::from_secs(u64::from(MQTT_KEEP_ALIVE_SECS) / 2));

    loop {
        let step = match select3(outbox.receive(), client.receive_message(), ping.next()).await {
            Either3::First(message) => SessionStep::Publish(message),
            Either3::Second(Ok((topic, payload))) => {
                forward_command(topic, payload, commands);
                continue;
            }
            Either3::Second(Err(code)) => {
                error!("MQTT: Receive failed: {}", Debug2Format(&code));
                return Err(MqttError::ReceiveFailed);
            }
            Either3::Third(()) => SessionStep::Ping,
        };

        match step {
            SessionStep::Publish(message) => {
                client
                    .send_message(
                        message.topic.as_str(),
                        &message.payload,
                        quality_of_service(message.qos),
                        message.retain,
                    )
                    .await
                    .map_err(|_| MqttError::PublishFailed)?;
                info!(
                    "MQTT: Published {} bytes to '{}'",
                    message.payload.len(),
                    message.topic.as_str()
                );
            }
            SessionStep::Ping => {
                client.send_ping().await.map_err(|_| MqttError::PingFailed)?;
            }
        }
    }
}

/// Parst eine Konfigurations-Nachricht und reicht sie an den Config Task weiter
///
/// Unbekannte Topics und ungültige Werte werden nur geloggt.
fn forward_command(topic: &str, payload: &[u8], commands: &CommandSender) {
    match RemoteCommand::parse(topic, payload) {
        Ok(command) => {
            info!(
                "MQTT: Config {} {} = {}",
                command.channel, command.parameter, command.value
            );
            if commands.try_send(command).is_err() {
                warn!("MQTT: Config queue full, dropping command");
            }
        }
        Err(e) => warn!("MQTT: Ignoring message on '{}': {}", topic, e),
    }
}

fn quality_of_service(qos: QoS) -> QualityOfService {
    match qos {
        QoS::AtMostOnce => QualityOfService::QoS0,
        QoS::AtLeastOnce => QualityOfService::QoS1,
    }
}

/// MQTT Fehler-Typen
///
/// Alle möglichen Fehler die während MQTT-Operationen auftreten können.
#[derive(Debug)]
enum MqttError {
    Dns(DnsError),
    ConnectionFailed,
    ProtocolError,
    SubscribeFailed,
    PublishFailed,
    ReceiveFailed,
    PingFailed,
}

impl From<DnsError> for MqttError {
    fn from(e: DnsError) -> Self {
        MqttError::Dns(e)
    }
}

impl defmt::Format for MqttError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            MqttError::Dns(DnsError::ResolutionFailed) => defmt::write!(fmt, "DNS failed"),
            MqttError::Dns(DnsError::Timeout) => defmt::write!(fmt, "DNS timeout"),
            MqttError::ConnectionFailed => defmt::write!(fmt, "Connection failed"),
            MqttError::ProtocolError => defmt::write!(fmt, "Protocol error"),
            MqttError::SubscribeFailed => defmt::write!(fmt, "Subscribe failed"),
            MqttError::PublishFailed => defmt::write!(fmt, "Publish failed"),
            MqttError::ReceiveFailed => defmt::write!(fmt, "Receive failed"),
            MqttError::PingFailed => defmt::write!(fmt, "Ping failed"),
        }
    }
}
