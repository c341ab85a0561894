// Wanduhr: Unix-Zeit aus letztem SNTP-Sync + monotone Zeit seitdem

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Instant;

pub struct WallClock {
    /// (Unix µs beim Sync, monotone Zeit beim Sync)
    anchor: BlockingMutex<NoopRawMutex, Cell<Option<(i64, Instant)>>>,
}

impl WallClock {
    pub const fn new() -> Self {
        Self {
            anchor: BlockingMutex::new(Cell::new(None)),
        }
    }

    pub fn set(&self, unix_us: i64) {
        self.anchor
            .lock(|anchor| anchor.set(Some((unix_us, Instant::now()))));
    }

    /// Aktuelle Unix-Zeit in µs, `None` vor dem ersten Sync
    pub fn now_unix_us(&self) -> Option<i64> {
        self.anchor.lock(|anchor| {
            anchor.get().map(|(unix_us, synced_at)| {
                let elapsed = Instant::now().saturating_duration_since(synced_at);
                unix_us.saturating_add(elapsed.as_micros() as i64)
            })
        })
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}
