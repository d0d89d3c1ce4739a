//=========================================================================
// Frame Limiter
//=========================================================================
//
// Sleeps so consecutive frames are at least `min_frame_time` apart.
//
// Used in multi-threaded loading so the render loop does not starve the
// loader thread on a single-core machine.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread;
use std::time::{Duration, Instant};

//=== FrameLimiter ========================================================

pub(crate) struct FrameLimiter {
    min_frame_time: Duration,
    last_frame: Option<Instant>,
}

impl FrameLimiter {
    pub(crate) fn new(min_frame_time: Duration) -> Self {
        Self {
            min_frame_time,
            last_frame: None,
        }
    }

    /// Blocks until the minimum frame time since the previous call passed.
    /// The first call never sleeps.
    pub(crate) fn throttle(&mut self) {
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < self.min_frame_time {
                thread::sleep(self.min_frame_time - elapsed);
            }
        }

        self.last_frame = Some(Instant::now());
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
