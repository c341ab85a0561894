// Reconfig Task - Wendet Remote-Konfiguration an (Stop → Warten → Ändern → Start)
use defmt::{error, info, warn};
use embassy_time::Delay;
use esp_core::{Reconfigured, reconfigure};

use crate::hal::TimerSet;
use crate::{CommandReceiver, SharedTelemetry};

/// Reconfig Task
///
/// Kommandos kommen vom MQTT Task und werden nacheinander abgearbeitet.
/// Während der Wartezeit nach dem Stop läuft kein Tick des betroffenen Timers.
#[embassy_executor::task]
pub async fn reconfig_task(
    commands: CommandReceiver,
    timers: TimerSet,
    telemetry: &'static SharedTelemetry,
) {
    info!("Config: Task ready");

    loop {
        let command = commands.receive().await;

        let Some(mut timer) = timers.for_target(command.target()) else {
            warn!("Config: No timer for {}, ignoring", command.channel);
            continue;
        };

        let result = reconfigure(&mut timer, &mut Delay, || {
            telemetry.lock(|t| command.apply(&mut t.borrow_mut().table))
        })
        .await;

        match result {
            Ok(Reconfigured::Restarted { period_secs }) => info!(
                "Config: {} {} = {}, restarted every {}s",
                command.channel, command.parameter, command.value, period_secs
            ),
            Ok(Reconfigured::Stored) => info!(
                "Config: {} {} = {} stored (timer not running)",
                command.channel, command.parameter, command.value
            ),
            Err(e) => error!(
                "Config: {} {} = {} failed: {}",
                command.channel, command.parameter, command.value, e
            ),
        }
    }
}
