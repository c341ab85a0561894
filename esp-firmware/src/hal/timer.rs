// Periodischer Timer für Sampler und Publisher
//
// Der Controller und der Config-Task steuern den Timer über ein Signal,
// der besitzende Task tickt. Ein Task führt seine Ticks nacheinander aus,
// zwei Ticks desselben Timers überlappen sich daher nie.

use core::cell::Cell;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use esp_core::{Channel, TimerControl, TimerError, TimerTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
enum TimerCommand {
    Start { period_secs: u32 },
    Stop,
}

/// Ergebnis von `PeriodicTimer::next`
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum TimerEvent {
    Tick,
    Stopped,
}

pub struct PeriodicTimer {
    control: Signal<NoopRawMutex, TimerCommand>,
    armed: Cell<bool>,
}

impl PeriodicTimer {
    pub const fn new() -> Self {
        Self {
            control: Signal::new(),
            armed: Cell::new(false),
        }
    }

    /// Handle für Controller und Config-Task
    pub fn handle(&'static self) -> TaskTimer {
        TaskTimer(self)
    }

    /// Wartet bis der Timer gestartet wird
    pub async fn wait_started(&self) -> Ticker {
        loop {
            if let TimerCommand::Start { period_secs } = self.control.wait().await {
                return ticker_for(period_secs);
            }
        }
    }

    /// Wartet auf den nächsten Tick
    ///
    /// Ein Restart setzt die Phase zurück (Ticker beginnt neu).
    pub async fn next(&self, ticker: &mut Ticker) -> TimerEvent {
        loop {
            match select(ticker.next(), self.control.wait()).await {
                Either::First(()) => return TimerEvent::Tick,
                Either::Second(TimerCommand::Start { period_secs }) => {
                    *ticker = ticker_for(period_secs);
                }
                Either::Second(TimerCommand::Stop) => return TimerEvent::Stopped,
            }
        }
    }
}

impl Default for PeriodicTimer {
    fn default() -> Self {
        Self::new()
    }
}

fn ticker_for(period_secs: u32) -> Ticker {
    Ticker::every(Duration::from_secs(u64::from(period_secs)))
}

/// Steuer-Handle eines `PeriodicTimer`
#[derive(Clone, Copy)]
pub struct TaskTimer(&'static PeriodicTimer);

impl TimerControl for TaskTimer {
    fn is_armed(&self) -> bool {
        self.0.armed.get()
    }

    fn stop(&mut self) -> Result<(), TimerError> {
        self.0.armed.set(false);
        self.0.control.signal(TimerCommand::Stop);
        Ok(())
    }

    fn start(&mut self, period_secs: u32) -> Result<(), TimerError> {
        if period_secs == 0 {
            return Err(TimerError::Rejected);
        }
        self.0.armed.set(true);
        self.0.control.signal(TimerCommand::Start { period_secs });
        Ok(())
    }
}

/// Alle periodischen Timer des Knotens
#[derive(Clone, Copy)]
pub struct TimerSet {
    pub irradiation: TaskTimer,
    pub battery: TaskTimer,
    pub publisher: TaskTimer,
}

impl TimerSet {
    /// Timer, der von einer Rekonfiguration betroffen ist
    ///
    /// `None` für Kanäle ohne eigenen Sampler (Bias).
    pub fn for_target(&self, target: TimerTarget) -> Option<TaskTimer> {
        match target {
            TimerTarget::Sampler(Channel::Irradiation) => Some(self.irradiation),
            TimerTarget::Sampler(Channel::Battery) => Some(self.battery),
            TimerTarget::Sampler(Channel::Bias) => None,
            TimerTarget::Publisher => Some(self.publisher),
        }
    }
}
