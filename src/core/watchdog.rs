//=========================================================================
// Watchdog
//=========================================================================
//
// Liveness timer for long loads. Every published progress message clears
// it; a supervisor outside the load screen reads how long it has been
// since the last clear and decides whether the process hung.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::trace;

//=== Watchdog ============================================================

#[derive(Debug)]
pub struct Watchdog {
    last_clear: Mutex<Instant>,
}

impl Watchdog {
    pub fn new() -> Self {
        Self {
            last_clear: Mutex::new(Instant::now()),
        }
    }

    /// Records forward progress.
    pub fn clear_timer(&self) {
        *self.last_clear.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
        trace!(target: "loadscreen", "Load watchdog cleared");
    }

    pub fn since_last_clear(&self) -> Duration {
        self.last_clear
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// True if no progress was recorded for longer than `limit`.
    pub fn is_stalled(&self, limit: Duration) -> bool {
        self.since_last_clear() > limit
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
