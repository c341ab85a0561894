// Controller Task - Führt den Zustandsautomaten aus
//
// Alle Tasks melden Ereignisse über den Event-Channel. Der Controller
// übersetzt sie mit `esp_core::Controller` in Aktionen und setzt diese
// über Signale und Timer-Handles um.

use defmt::{error, info, warn};
use embassy_time::{Duration, Timer};
use esp_core::{
    Action, Anomaly, Channel, Controller, Event, TimerControl, Transition,
    millis_until_next_minute,
};

use crate::config::{SLEEP_WINDOW, UTC_OFFSET_SECS};
use crate::hal::{TimerSet, WallClock};
use crate::{
    EventReceiver, MessagingRequest, MessagingSignal, SharedTelemetry, SleepRequest, SleepSignal,
    StationSignal, SyncRequest, SyncSignal,
};

/// Zugangsdaten kommen aus der Build-Umgebung, der Knoten ist immer provisioniert
const PROVISIONED: bool = true;

/// Alles, was der Controller ansteuert
pub struct ControllerOutputs {
    pub station: &'static StationSignal,
    pub sync: &'static SyncSignal,
    pub messaging: &'static MessagingSignal,
    pub sleep: &'static SleepSignal,
    pub timers: TimerSet,
    pub telemetry: &'static SharedTelemetry,
    pub clock: &'static WallClock,
}

/// Controller Task
///
/// Verarbeitet zuerst `Boot`, danach alle Ereignisse der Reihe nach.
#[embassy_executor::task]
pub async fn controller_task(events: EventReceiver, mut outputs: ControllerOutputs) {
    let mut controller = Controller::new(SLEEP_WINDOW, UTC_OFFSET_SECS);
    info!(
        "FSM: Sleep window {}:00 - {}:00 local time",
        SLEEP_WINDOW.sleep_hour, SLEEP_WINDOW.wake_hour
    );

    let mut event = Event::Boot {
        provisioned: PROVISIONED,
    };

    loop {
        info!("FSM: {}", event);
        let transition = controller.handle(event);
        log_anomaly(&transition);

        for &action in &transition.actions {
            outputs.execute(action).await;
        }

        event = events.receive().await;
    }
}

fn log_anomaly(transition: &Transition) {
    let Some(anomaly) = transition.anomaly else {
        return;
    };
    match anomaly {
        Anomaly::Resynced => info!("FSM: Clock resynchronized"),
        Anomaly::ClockOutOfRange => error!("FSM: Clock out of range, schedule not updated"),
        Anomaly::SleepOutsideWindow => warn!("FSM: Sleep timer fired during uptime, staying awake"),
        other => warn!("FSM: Ignoring duplicate event ({})", other),
    }
}

impl ControllerOutputs {
    async fn execute(&mut self, action: Action) {
        info!("FSM: -> {}", action);

        match action {
            Action::StartProvisioning => {
                error!("FSM: No credentials and no provisioning support, staying offline");
            }
            Action::StartStation => self.station.signal(()),
            Action::InitTimeSync => self.sync.signal(SyncRequest::Init),
            Action::RestartTimeSync => self.sync.signal(SyncRequest::Restart),
            Action::StartMessaging => self.messaging.signal(MessagingRequest::Start),
            Action::StopMessaging => self.messaging.signal(MessagingRequest::Stop),
            Action::InitSampling => self.align_to_minute().await,
            Action::StartSampling => self.start_sampling(),
            Action::StartPublishing => {
                let period_secs = self
                    .telemetry
                    .lock(|t| t.borrow().table.publish_period_secs());
                if let Err(e) = self.timers.publisher.start(period_secs) {
                    error!("FSM: Publisher start failed: {}", e);
                }
            }
            Action::StopPublishing => {
                if let Err(e) = self.timers.publisher.stop() {
                    error!("FSM: Publisher stop failed: {}", e);
                }
            }
            Action::ArmDeepSleep { delay_us } => self.sleep.signal(SleepRequest::Arm { delay_us }),
            Action::EnterDeepSleep { wake_in_us } => {
                self.sleep.signal(SleepRequest::Now { wake_in_us })
            }
        }
    }

    /// Wartet bis zur nächsten vollen Minute, damit die Ticks auf Minutengrenzen fallen
    async fn align_to_minute(&self) {
        let Some(now_us) = self.clock.now_unix_us() else {
            warn!("FSM: Clock not synchronized, sampling starts unaligned");
            return;
        };
        let delay_ms = millis_until_next_minute(now_us);
        info!("FSM: Waiting {} ms for the next full minute", delay_ms);
        Timer::after(Duration::from_millis(delay_ms)).await;
    }

    fn start_sampling(&mut self) {
        let (irradiation_secs, battery_secs) = self.telemetry.lock(|t| {
            let t = t.borrow();
            (
                t.table.get(Channel::Irradiation).sample_period_secs,
                t.table.get(Channel::Battery).sample_period_secs,
            )
        });

        if let Err(e) = self.timers.irradiation.start(irradiation_secs) {
            error!("FSM: {} sampler start failed: {}", Channel::Irradiation, e);
        }
        if let Err(e) = self.timers.battery.start(battery_secs) {
            error!("FSM: {} sampler start failed: {}", Channel::Battery, e);
        }
    }
}
