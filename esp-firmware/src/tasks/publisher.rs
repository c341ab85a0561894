// Publisher Task - Reduziert die Puffer und sendet einen Line-Protocol Datensatz
use defmt::{error, info, warn};
use esp_core::{
    LineProtocol, MessagePublisher, PUBLISH_GROUP, PublishError, QoS, publish_tick, send_record,
};
use heapless::{String, Vec};

use crate::config::{MQTT_TOPIC_TELEMETRY, TELEMETRY_MEASUREMENT, TELEMETRY_TAG};
use crate::hal::{PeriodicTimer, TimerEvent, WallClock};
use crate::{OutboxSender, OutgoingMessage, SharedTelemetry, Telemetry};

const LINE: LineProtocol<'static> = LineProtocol {
    measurement: TELEMETRY_MEASUREMENT,
    tag: TELEMETRY_TAG,
};

/// Übergibt Nachrichten an die Outbox des MQTT Tasks
///
/// Ist die Queue voll (MQTT getrennt), wird die Nachricht verworfen.
pub struct MqttOutbox {
    sender: OutboxSender,
}

impl MqttOutbox {
    pub fn new(sender: OutboxSender) -> Self {
        Self { sender }
    }
}

impl MessagePublisher for MqttOutbox {
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), PublishError> {
        let message = OutgoingMessage {
            topic: String::try_from(topic).map_err(|_| PublishError::Unavailable)?,
            payload: Vec::from_slice(payload).map_err(|_| PublishError::Unavailable)?,
            qos,
            retain,
        };
        self.sender
            .try_send(message)
            .map_err(|_| PublishError::Unavailable)
    }
}

/// Publisher Task
///
/// Läuft nur, solange MQTT verbunden ist (Start/Stop durch den Controller).
#[embassy_executor::task]
pub async fn publisher_task(
    timer: &'static PeriodicTimer,
    telemetry: &'static SharedTelemetry,
    clock: &'static WallClock,
    mut outbox: MqttOutbox,
) {
    info!("Telemetry: Publisher task ready");

    loop {
        let mut ticker = timer.wait_started().await;
        info!("Telemetry: Publishing started");

        while timer.next(&mut ticker).await == TimerEvent::Tick {
            publish_once(telemetry, clock, &mut outbox);
        }

        info!("Telemetry: Publishing stopped");
    }
}

fn publish_once(telemetry: &SharedTelemetry, clock: &WallClock, outbox: &mut MqttOutbox) {
    let Some(now_us) = clock.now_unix_us() else {
        warn!("Telemetry: Clock not synchronized, skipping tick");
        return;
    };

    let tick = telemetry.lock(|t| {
        let mut t = t.borrow_mut();
        let Telemetry { table, windows } = &mut *t;
        publish_tick(table, windows, &PUBLISH_GROUP, &LINE, now_us.saturating_mul(1000))
    });

    let tick = match tick {
        Ok(tick) => tick,
        Err(e) => {
            error!("Telemetry: Could not build record: {}", e);
            return;
        }
    };

    for channel in &tick.stale {
        warn!("Telemetry: No new samples for {}, resending last mean", channel);
    }

    match send_record(outbox, MQTT_TOPIC_TELEMETRY, &tick.record) {
        Ok(()) => info!("Telemetry: {}", tick.record.as_str()),
        Err(e) => warn!("Telemetry: Record dropped: {}", e),
    }
}
