// Deep-Sleep Task - Schlaf-Timer und Eintritt in den Deep-Sleep
use defmt::{error, info};
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};
use esp_core::Event;
use esp_hal::rtc_cntl::Rtc;
use esp_hal::rtc_cntl::sleep::TimerWakeupSource;

use crate::config::SHUT_DOWN_POWER_PIN_ON_SLEEP;
use crate::hal::WallClock;
use crate::{EventSender, SharedFrontEnd, SleepRequest, SleepSignal};

/// Zeit für defmt, die letzten Logs vor dem Schlafen auszugeben
const LOG_FLUSH_DELAY_MS: u64 = 100;

const MICROS_PER_MINUTE: u64 = 60_000_000;

/// Deep-Sleep Task
///
/// - `Arm`: wartet die Verzögerung ab und meldet dann `DeepSleepDue`,
///   ein neues `Arm` ersetzt den laufenden Timer
/// - `Now`: schläft sofort
#[embassy_executor::task]
pub async fn deep_sleep_task(
    mut rtc: Rtc<'static>,
    control: &'static SleepSignal,
    front_end: &'static SharedFrontEnd,
    clock: &'static WallClock,
    events: EventSender,
) {
    let mut request = control.wait().await;

    loop {
        match request {
            SleepRequest::Now { wake_in_us } => {
                enter_deep_sleep(&mut rtc, front_end, wake_in_us).await
            }
            SleepRequest::Arm { delay_us } => {
                info!("Sleep: Timer armed, due in {} min", delay_us / MICROS_PER_MINUTE);

                let due = Timer::after(Duration::from_micros(delay_us));
                request = match select(due, control.wait()).await {
                    Either::First(()) => {
                        match clock.now_unix_us() {
                            Some(now_unix_us) => {
                                events.send(Event::DeepSleepDue { now_unix_us }).await
                            }
                            None => error!("Sleep: Timer fired without synchronized clock"),
                        }
                        control.wait().await
                    }
                    Either::Second(next) => next,
                };
            }
        }
    }
}

/// Schaltet die Panel-Versorgung ab und geht in den Deep-Sleep
///
/// Kehrt nicht zurück: nach dem Aufwachen startet die Firmware neu.
async fn enter_deep_sleep(
    rtc: &mut Rtc<'static>,
    front_end: &'static SharedFrontEnd,
    wake_in_us: u64,
) -> ! {
    info!(
        "Sleep: Entering deep sleep, wake up in {} min",
        wake_in_us / MICROS_PER_MINUTE
    );

    if SHUT_DOWN_POWER_PIN_ON_SLEEP {
        // Wartet ggf. auf einen laufenden Sampling-Tick
        front_end.lock().await.power.set_low();
    }

    Timer::after(Duration::from_millis(LOG_FLUSH_DELAY_MS)).await;

    let wakeup = TimerWakeupSource::new(core::time::Duration::from_micros(wake_in_us));
    rtc.sleep_deep(&[&wakeup])
}
