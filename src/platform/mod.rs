//=========================================================================
// Platform Driver
//
// Runs a load screen inside a Winit event loop.
//
// Architecture:
// ```text
//  Main Thread (Winit event loop, ControlFlow::Poll)
//  ┌──────────────────────────────────────┐
//  │  window_event                        │
//  │   ├─ KeyboardInput → key_pressed /   │
//  │   │                  key_released    │
//  │   ├─ Resized       → resize_event    │
//  │   └─ CloseRequested → request_quit   │
//  │                                      │
//  │  about_to_wait                       │
//  │   └─ update() ── Loading ──> draw()  │
//  │              │   (+ present, multi)  │
//  │              └─ Finished ──> exit    │
//  └──────────────────────────────────────┘
// ```
//
// The loader and heartbeat threads are owned by the LoadScreen; this
// layer routes events, pumps ticks and presents multi-threaded frames.
// Dropping the driver tears an unfinished session down.
//
//=========================================================================

//=== Submodules ==========================================================

mod input_processor;

//=== External Crates =====================================================

use log::*;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::WindowId,
};

//=== Internal Imports ====================================================

use crate::core::{GameLoader, Host};
use crate::error::PlatformError;
use crate::load_screen::{Handoff, LoadScreen, UpdateOutcome};
use input_processor::{InputProcessor, LoadScreenInput};

//=== TickControl =========================================================

/// Whether the event loop should keep running after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== LoadScreenDriver ====================================================

/// Winit application wrapping one load session.
pub(crate) struct LoadScreenDriver<H: Host, L: GameLoader> {
    screen: Option<LoadScreen<H, L>>,
    handoff: Option<Handoff<L>>,
}

impl<H: Host, L: GameLoader> LoadScreenDriver<H, L> {
    pub(crate) fn new(screen: LoadScreen<H, L>) -> Self {
        Self {
            screen: Some(screen),
            handoff: None,
        }
    }

    //--- Ticks ------------------------------------------------------------

    /// One update + draw pass.
    pub(crate) fn tick(&mut self) -> TickControl {
        let Some(screen) = self.screen.as_mut() else {
            return TickControl::Exit;
        };

        match screen.update() {
            UpdateOutcome::Loading => {
                screen.draw();

                // The frontend only presents its own frames when loading inline.
                if screen.mode().is_multi_threaded() {
                    screen.host_mut().swap_buffers();
                }
                TickControl::Continue
            }
            UpdateOutcome::Finished(handoff) => {
                self.handoff = Some(handoff);
                self.screen = None;
                TickControl::Exit
            }
            UpdateOutcome::Destroyed => {
                self.screen = None;
                TickControl::Exit
            }
        }
    }

    //--- Event Routing ----------------------------------------------------

    pub(crate) fn handle_window_event(&mut self, event: &WindowEvent) -> TickControl {
        let Some(screen) = self.screen.as_mut() else {
            return TickControl::Exit;
        };

        let input = match event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested during loading");
                screen.host_mut().request_quit();
                return TickControl::Exit;
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                InputProcessor::process_key_event(key_event)
            }
            WindowEvent::Resized(size) => {
                debug!(target: "platform", "Resized to {}x{}", size.width, size.height);
                Some(LoadScreenInput::Resized)
            }
            _ => None,
        };

        if let Some(input) = input {
            Self::dispatch(screen, input);
        }

        TickControl::Continue
    }

    fn dispatch(screen: &mut LoadScreen<H, L>, input: LoadScreenInput) {
        trace!(target: "platform::input", "{:?}", input);

        match input {
            LoadScreenInput::KeyPressed { key, is_repeat } => {
                screen.key_pressed(key, is_repeat);
            }
            LoadScreenInput::KeyReleased { key } => {
                screen.key_released(key);
            }
            LoadScreenInput::Resized => screen.resize_event(),
        }
    }

    //--- Completion -------------------------------------------------------

    /// Returns the hand-off once the event loop returned.
    ///
    /// If the loop stopped early (window closed) the session is torn
    /// down here, which waits for the loader to finish.
    pub(crate) fn finish(mut self) -> Result<Handoff<L>, PlatformError> {
        if let Some(handoff) = self.handoff.take() {
            return Ok(handoff);
        }

        match self.screen.as_mut().and_then(LoadScreen::destroy) {
            Some(handoff) => Ok(handoff),
            None => Err(PlatformError::ExitedEarly),
        }
    }
}

impl<H: Host, L: GameLoader> Drop for LoadScreenDriver<H, L> {
    fn drop(&mut self) {
        // Joins the loader; the hand-off is discarded. Skipped while
        // unwinding, the loader may be waiting on the panicking frame.
        if std::thread::panicking() {
            return;
        }
        if let Some(screen) = self.screen.as_mut() {
            if screen.destroy().is_some() {
                warn!(target: "platform", "Load screen driver dropped before hand-off");
            }
        }
    }
}

//=== Winit Integration ===================================================

impl<H: Host, L: GameLoader> ApplicationHandler for LoadScreenDriver<H, L> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.handle_window_event(&event) == TickControl::Exit {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.tick() == TickControl::Exit {
            event_loop.exit();
        }
    }
}

//=== Public Entry Point ==================================================

/// Drives `screen` from a Winit event loop until loading finished.
///
/// A session that already loaded synchronously is handed off without
/// running the loop.
///
/// # Errors
///
/// Returns [`PlatformError`] if the event loop fails, or if it exits
/// without the session producing a hand-off.
pub fn run_load_screen<H: Host, L: GameLoader>(
    event_loop: EventLoop<()>,
    mut screen: LoadScreen<H, L>,
) -> Result<Handoff<L>, PlatformError> {
    if !screen.is_active() {
        return screen.destroy().ok_or(PlatformError::ExitedEarly);
    }

    info!(target: "platform", "Entering load screen event loop");

    let mut driver = LoadScreenDriver::new(screen);
    if let Err(e) = event_loop.run_app(&mut driver) {
        error!(target: "platform", "Event loop failed during loading: {}", e);
        // Dropping the driver joins the loader before the error surfaces.
        drop(driver);
        return Err(e.into());
    }

    info!(target: "platform", "Load screen event loop exited");
    driver.finish()
}

//=========================================================================
// Unit Tests
//=========================================================================
