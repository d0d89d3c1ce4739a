//=========================================================================
// Load Screen Frontend
//=========================================================================
//
// The foreground half of a load session: host services, progress UI and
// frame pacing. Split from the controller so the inline (single-threaded)
// loader can borrow it mutably while the controller still owns the
// loader.
//
// Tick layout:
//   update_tick()  FPU check under lock → pump events (single) → textures
//   draw()         throttle (multi) → lock → UI hooks → present (single)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::time::Duration;

//=== Internal Dependencies ===============================================

use super::frame_limiter::FrameLimiter;
use crate::config::ThreadingMode;
use crate::core::fpu::good_fpu_control_registers;
use crate::core::{FontSelection, Host, ProgressSink, ProgressUi, SharedLoadState};

//=== Frontend ============================================================

pub(crate) struct Frontend<H: Host> {
    pub(crate) host: H,
    pub(crate) ui: Option<Box<dyn ProgressUi>>,
    pub(crate) shared: Arc<SharedLoadState>,
    pub(crate) mode: ThreadingMode,
    pub(crate) font: FontSelection,
    limiter: FrameLimiter,
}

impl<H: Host> Frontend<H> {
    pub(crate) fn new(
        host: H,
        ui: Option<Box<dyn ProgressUi>>,
        shared: Arc<SharedLoadState>,
        min_frame_time: Duration,
    ) -> Self {
        Self {
            host,
            ui,
            shared,
            mode: ThreadingMode::SingleThreaded,
            font: FontSelection::Shared,
            limiter: FrameLimiter::new(min_frame_time),
        }
    }

    //--- Update -----------------------------------------------------------

    /// Checks the foreground thread's FPU state while holding the lock.
    pub(crate) fn check_fpu(&self) {
        let state = self.shared.lock();
        good_fpu_control_registers(state.log.current());
    }

    /// Host servicing part of an update tick.
    pub(crate) fn service_host(&mut self) {
        // Without this the window manager flags the window as unresponsive.
        if !self.mode.is_multi_threaded() {
            self.host.pump_events();
        }

        self.host.update_textures();
    }

    //--- Draw -------------------------------------------------------------

    pub(crate) fn draw(&mut self) {
        if self.mode.is_multi_threaded() {
            self.limiter.throttle();
        }

        {
            let mut state = self.shared.lock();
            let pending = state.take_pending();

            if let Some(ui) = self.ui.as_mut() {
                for notice in &pending {
                    ui.load_progress(&notice.message, notice.replace_last);
                }

                ui.update();
                ui.draw_genesis();
                self.host.clear_screen();
                ui.draw_load_screen(&state.log, self.font);
            }
        }

        // In multi-threaded mode the engine's main loop presents.
        if !self.mode.is_multi_threaded() {
            self.host.swap_buffers();
        }
    }
}

//=== InlineProgress ======================================================

/// Sink used when the loader runs on the foreground thread.
///
/// There is no separate render tick in that mode, so every message runs
/// an update and a draw right after the lock was released.
pub(crate) struct InlineProgress<'a, H: Host> {
    frontend: &'a mut Frontend<H>,
}

impl<'a, H: Host> InlineProgress<'a, H> {
    pub(crate) fn new(frontend: &'a mut Frontend<H>) -> Self {
        Self { frontend }
    }
}

impl<H: Host> ProgressSink for InlineProgress<'_, H> {
    fn set_message(&mut self, text: &str, replace_last: bool) {
        self.frontend.shared.publish(text, replace_last);

        self.frontend.check_fpu();
        self.frontend.service_host();
        self.frontend.draw();
    }
}
