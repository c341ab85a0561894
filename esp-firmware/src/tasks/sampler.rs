// Sampler Task - Ein Task pro gepuffertem Kanal
use defmt::{error, info, warn};
use embassy_time::Delay;
use esp_core::{Channel, take_sample};

use crate::config::SHUT_DOWN_POWER_PIN;
use crate::hal::{PeriodicTimer, SensorFrontEnd, TimerEvent};
use crate::{SharedFrontEnd, SharedTelemetry};

/// Sampler Task
///
/// Wartet auf den Start des eigenen Timers und schreibt bei jedem Tick
/// ein gemitteltes Sample in den Ringpuffer des Kanals.
/// Läuft auch weiter, wenn MQTT getrennt ist.
#[embassy_executor::task(pool_size = 2)]
pub async fn sampler_task(
    channel: Channel,
    timer: &'static PeriodicTimer,
    front_end: &'static SharedFrontEnd,
    telemetry: &'static SharedTelemetry,
) {
    info!("Sampler: {} task ready", channel);

    loop {
        let mut ticker = timer.wait_started().await;
        info!("Sampler: {} started", channel);

        while timer.next(&mut ticker).await == TimerEvent::Tick {
            sample_once(channel, front_end, telemetry).await;
        }

        info!("Sampler: {} stopped", channel);
    }
}

async fn sample_once(
    channel: Channel,
    front_end: &'static SharedFrontEnd,
    telemetry: &'static SharedTelemetry,
) {
    let samples_per_read =
        telemetry.lock(|t| t.borrow().table.get(channel).samples_per_read);

    // Der Lock hält auch die Einschwingzeit der Versorgung
    let outcome = {
        let mut guard = front_end.lock().await;
        let SensorFrontEnd { reader, power } = &mut *guard;
        let power = (channel == Channel::Irradiation && SHUT_DOWN_POWER_PIN).then_some(power);
        take_sample(reader, power, &mut Delay, channel, samples_per_read).await
    };

    if outcome.failed_reads > 0 {
        warn!(
            "Sampler: {} {}/{} reads failed, counted as 0",
            channel, outcome.failed_reads, samples_per_read
        );
    }
    if outcome.power_fault {
        error!("Sampler: {} could not switch panel power", channel);
    }

    telemetry.lock(|t| {
        if let Some(buffer) = t.borrow_mut().windows.get_mut(channel) {
            buffer.record(outcome.value);
        }
    });
    info!("Sampler: {} = {} mV", channel, outcome.value);
}
