// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi benötigt dynamischen Speicher)
extern crate alloc;

use core::cell::RefCell;

use defmt::{Debug2Format, info};

// Embassy Async Runtime
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Stack, StackResources};
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer};

// ESP32-C6 HAL
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::rng::Rng;
use esp_hal::rtc_cntl::{Rtc, reset_reason, wakeup_cause};
use esp_hal::system::Cpu;
use esp_hal::timer::timg::TimerGroup;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

// Projekt-Module und Konfiguration
use esp_core::{Channel, ChannelTable, Windows};
use esp_solar_node::config::*;
use esp_solar_node::hal::{EspAnalogReader, PeriodicTimer, SensorFrontEnd, TimerSet, WallClock};
use esp_solar_node::tasks::{
    ControllerOutputs, MqttOutbox, connection_task, controller_task, deep_sleep_task, mqtt_task,
    net_task, publisher_task, reconfig_task, sampler_task, sntp_task,
};
use esp_solar_node::{
    CommandChannel, EventChannel, MessagingSignal, OutboxChannel, SharedFrontEnd, SharedTelemetry,
    SleepSignal, StationSignal, SyncSignal, Telemetry,
};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
// Ohne diesen schlägt das Flashen mit "ESP-IDF App Descriptor missing" fehl
esp_bootloader_esp_idf::esp_app_desc!();

/// Main Entry Point
///
/// Initialisiert Hardware, WiFi, startet Embassy Runtime und spawnt Tasks.
/// Danach schläft main() - alle Arbeit läuft in Tasks.
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    // ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz)
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Nach dem Deep-Sleep startet die Firmware komplett neu
    info!(
        "Boot: reset_reason={} wakeup_cause={}",
        Debug2Format(&reset_reason(Cpu::ProCpu)),
        Debug2Format(&wakeup_cause())
    );

    // Heap Allocator initialisieren (WiFi braucht dynamischen Speicher!)
    // Zwei Bereiche: reclaimed RAM (64 KB) + extra (36 KB) = 100 KB total
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    // Kanal-Tabelle und Ringpuffer
    // Ungültige Startwerte in config.rs führen zum Panic beim Boot
    let table = ChannelTable::new(IRRADIATION_CHANNEL, BATTERY_CHANNEL, BIAS_CHANNEL)
        .expect("Invalid channel configuration in config.rs");
    let windows = Windows::new(WINDOW_SIZE_IRRADIATION, WINDOW_SIZE_BATTERY)
        .expect("Invalid window size in config.rs");
    static TELEMETRY: static_cell::StaticCell<SharedTelemetry> = static_cell::StaticCell::new();
    let telemetry = &*TELEMETRY.init(SharedTelemetry::new(RefCell::new(Telemetry {
        table,
        windows,
    })));

    // ADC + Panel-Versorgung
    // Ohne SHUT_DOWN_POWER_PIN bleibt das Panel dauerhaft versorgt
    let power_level = if SHUT_DOWN_POWER_PIN {
        Level::Low
    } else {
        Level::High
    };
    let power = Output::new(peripherals.GPIO21, power_level, OutputConfig::default());
    let reader = EspAnalogReader::new(
        peripherals.ADC1,
        peripherals.GPIO0,
        peripherals.GPIO1,
        peripherals.GPIO6,
    );
    static FRONT_END: static_cell::StaticCell<SharedFrontEnd> = static_cell::StaticCell::new();
    let front_end = &*FRONT_END.init(Mutex::new(SensorFrontEnd { reader, power }));

    // WiFi Hardware initialisieren
    static RADIO_INIT: static_cell::StaticCell<esp_radio::Controller> =
        static_cell::StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Netzwerk-Stack erstellen
    // Random seed für TCP/IP Stack (von Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    // Static resources für embassy-net
    // 4 Sockets: MQTT (TCP) + SNTP (UDP) + DNS + Reserve
    static RESOURCES: static_cell::StaticCell<StackResources<4>> = static_cell::StaticCell::new();
    let resources = RESOURCES.init(StackResources::new());

    // embassy-net erstellt Stack + Runner (nutzt STA interface für Client-Modus)
    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );

    // Stack muss 'static sein für Tasks
    static STACK: static_cell::StaticCell<Stack<'static>> = static_cell::StaticCell::new();
    let stack = &*STACK.init(stack);

    // Channels: Ereignisse → Controller, Telemetrie → MQTT, MQTT → Reconfig
    static EVENTS: static_cell::StaticCell<EventChannel> = static_cell::StaticCell::new();
    let events = &*EVENTS.init(EventChannel::new());
    static OUTBOX: static_cell::StaticCell<OutboxChannel> = static_cell::StaticCell::new();
    let outbox = &*OUTBOX.init(OutboxChannel::new());
    static COMMANDS: static_cell::StaticCell<CommandChannel> = static_cell::StaticCell::new();
    let commands = &*COMMANDS.init(CommandChannel::new());

    // Steuersignale des Controllers
    static STATION: static_cell::StaticCell<StationSignal> = static_cell::StaticCell::new();
    let station = &*STATION.init(StationSignal::new());
    static SYNC: static_cell::StaticCell<SyncSignal> = static_cell::StaticCell::new();
    let sync = &*SYNC.init(SyncSignal::new());
    static MESSAGING: static_cell::StaticCell<MessagingSignal> = static_cell::StaticCell::new();
    let messaging = &*MESSAGING.init(MessagingSignal::new());
    static SLEEP: static_cell::StaticCell<SleepSignal> = static_cell::StaticCell::new();
    let sleep = &*SLEEP.init(SleepSignal::new());

    // Wanduhr (gesetzt vom SNTP Task)
    static CLOCK: static_cell::StaticCell<WallClock> = static_cell::StaticCell::new();
    let clock = &*CLOCK.init(WallClock::new());

    // Periodische Timer: je ein Sampler pro Kanal + Publisher
    static IRRADIATION_TIMER: static_cell::StaticCell<PeriodicTimer> =
        static_cell::StaticCell::new();
    let irradiation_timer = &*IRRADIATION_TIMER.init(PeriodicTimer::new());
    static BATTERY_TIMER: static_cell::StaticCell<PeriodicTimer> = static_cell::StaticCell::new();
    let battery_timer = &*BATTERY_TIMER.init(PeriodicTimer::new());
    static PUBLISHER_TIMER: static_cell::StaticCell<PeriodicTimer> =
        static_cell::StaticCell::new();
    let publisher_timer = &*PUBLISHER_TIMER.init(PeriodicTimer::new());
    let timers = TimerSet {
        irradiation: irradiation_timer.handle(),
        battery: battery_timer.handle(),
        publisher: publisher_timer.handle(),
    };

    // Spawn Controller (verarbeitet Boot und startet die Station)
    let outputs = ControllerOutputs {
        station,
        sync,
        messaging,
        sleep,
        timers,
        telemetry,
        clock,
    };
    spawner
        .spawn(controller_task(events.receiver(), outputs))
        .unwrap();

    // Spawn WiFi Tasks
    spawner
        .spawn(connection_task(wifi_controller, stack, station, events.sender()))
        .unwrap();
    spawner.spawn(net_task(runner)).unwrap();

    // Spawn SNTP + MQTT
    spawner
        .spawn(sntp_task(stack, sync, clock, events.sender()))
        .unwrap();
    spawner
        .spawn(mqtt_task(
            stack,
            messaging,
            outbox.receiver(),
            commands.sender(),
            events.sender(),
        ))
        .unwrap();

    // Spawn Sampler (je einer pro gepuffertem Kanal) + Publisher
    spawner
        .spawn(sampler_task(
            Channel::Irradiation,
            irradiation_timer,
            front_end,
            telemetry,
        ))
        .unwrap();
    spawner
        .spawn(sampler_task(Channel::Battery, battery_timer, front_end, telemetry))
        .unwrap();
    spawner
        .spawn(publisher_task(
            publisher_timer,
            telemetry,
            clock,
            MqttOutbox::new(outbox.sender()),
        ))
        .unwrap();

    // Spawn Reconfig + Deep-Sleep
    spawner
        .spawn(reconfig_task(commands.receiver(), timers, telemetry))
        .unwrap();
    let rtc = Rtc::new(peripherals.LPWR);
    spawner
        .spawn(deep_sleep_task(rtc, sleep, front_end, clock, events.sender()))
        .unwrap();

    // Main-Loop: schläft (alle Arbeit läuft in Tasks)
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
