//=========================================================================
// Shared Load State
//=========================================================================
//
// The only data shared by reference between the loader thread and the
// foreground thread.
//
// Architecture:
//   loader thread ── publish() ──> Mutex<ProgressState> ──> lock() ── draw
//                      │                 ├─ log
//                      │                 └─ pending notices (for the UI)
//                      └─ Watchdog::clear_timer()
//
// The lock is not re-entrant. publish() releases it before returning, so
// a single-threaded caller can run update/draw right after publishing.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::info;

//=== Internal Dependencies ===============================================

use super::ProgressLog;
use crate::core::fpu::good_fpu_control_registers;
use crate::core::watchdog::Watchdog;

//=== Constants ===========================================================

/// Notices kept for a UI that has not drawn yet. Older ones are dropped.
pub const MAX_PENDING_NOTICES: usize = 256;

//=== ProgressNotice ======================================================

/// A published message not yet forwarded to the progress UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressNotice {
    pub message: String,
    pub replace_last: bool,
}

//=== ProgressState =======================================================

/// Lock-protected contents of [`SharedLoadState`].
#[derive(Debug, Default)]
pub struct ProgressState {
    pub log: ProgressLog,
    pub pending: VecDeque<ProgressNotice>,
}

impl ProgressState {
    /// Takes notices published since the last call.
    pub fn take_pending(&mut self) -> Vec<ProgressNotice> {
        self.pending.drain(..).collect()
    }
}

//=== SharedLoadState =====================================================

#[derive(Debug)]
pub struct SharedLoadState {
    state: Mutex<ProgressState>,
    watchdog: Arc<Watchdog>,
}

impl SharedLoadState {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ProgressState::default()),
            watchdog: Arc::new(Watchdog::new()),
        }
    }

    /// Locks the progress state.
    ///
    /// A panicking loader cannot leave the text half-written in a way that
    /// matters, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes a progress message from any thread.
    pub fn publish(&self, text: &str, replace_last: bool) {
        self.watchdog.clear_timer();

        let mut state = self.lock();
        state.log.publish(text, replace_last);
        if state.pending.len() >= MAX_PENDING_NOTICES {
            state.pending.pop_front();
        }
        state.pending.push_back(ProgressNotice {
            message: text.to_owned(),
            replace_last,
        });

        info!(target: "loadscreen::progress", "{}", text);

        // Checked on the publishing thread; the foreground checks its own
        // state in update().
        good_fpu_control_registers(state.log.current());
    }

    pub fn snapshot(&self) -> ProgressLog {
        self.lock().log.clone()
    }

    pub fn watchdog(&self) -> &Arc<Watchdog> {
        &self.watchdog
    }
}

impl Default for SharedLoadState {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn publish_updates_log_and_queues_notice() {
        let shared = SharedLoadState::new();
        shared.publish("Loading map...", false);
        shared.publish("45%", true);

        let mut state = shared.lock();
        assert_eq!(state.log.current(), "45%");
        assert_eq!(
            state.take_pending(),
            vec![
                ProgressNotice { message: "Loading map...".into(), replace_last: false },
                ProgressNotice { message: "45%".into(), replace_last: true },
            ]
        );
        assert!(state.take_pending().is_empty());
    }

    #[test]
    fn undrawn_notices_are_capped() {
        let shared = SharedLoadState::new();
        for i in 0..MAX_PENDING_NOTICES + 50 {
            shared.publish(&format!("step {}", i), false);
        }

        let pending = shared.lock().take_pending();
        assert_eq!(pending.len(), MAX_PENDING_NOTICES);
        assert_eq!(pending[0].message, "step 50");
        assert_eq!(
            pending[MAX_PENDING_NOTICES - 1].message,
            format!("step {}", MAX_PENDING_NOTICES + 49)
        );
    }

    #[test]
    fn publish_clears_watchdog() {
        let shared = SharedLoadState::new();
        thread::sleep(Duration::from_millis(30));
        assert!(shared.watchdog().is_stalled(Duration::from_millis(10)));

        shared.publish("step", false);
        assert!(!shared.watchdog().is_stalled(Duration::from_millis(500)));
    }

    #[test]
    fn publish_from_other_thread_is_visible_after_lock() {
        let shared = Arc::new(SharedLoadState::new());
        let producer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 0..100 {
                    shared.publish(&format!("{}%", i), i > 0);
                }
            })
        };
        producer.join().unwrap();

        let log = shared.snapshot();
        assert_eq!(log.current(), "99%");
        assert_eq!(log.archived(), ["0%"]);
    }

    #[test]
    fn lock_survives_poisoning() {
        let shared = Arc::new(SharedLoadState::new());
        let poisoner = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let _guard = shared.lock();
                panic!("loader died while holding the lock");
            })
        };
        assert!(poisoner.join().is_err());

        shared.publish("still alive", false);
        assert_eq!(shared.snapshot().current(), "still alive");
    }
}
