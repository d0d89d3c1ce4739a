//=========================================================================
// Load Screen
//
// Foreground controller of one load session.
//
// Architecture:
// ```text
//   LoadScreenBuilder ──start()──> LoadScreen ──update()/draw()──> Handoff
//         │                          │
//         ├─ with_config()           ├─ HeartbeatWorker   (thread)
//         ├─ with_loading_mode()     ├─ LoaderWorker      (thread, multi)
//         └─ with_progress_ui()      └─ Frontend          (this thread)
// ```
//
// State machine:
// ```text
//   Uninitialized ──start()──> Active(Multi | Single)
//                                   │ loader finished
//                                   ▼
//                               Finishing ──teardown──> Destroyed
// ```
//
// The session is an explicitly owned value. Whoever runs the render loop
// holds it and routes input to it; there is no global instance.
//
//=========================================================================

//=== Submodules ==========================================================

mod frame_limiter;
mod frontend;

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use winit::keyboard::KeyCode;

//=== Internal Dependencies ===============================================

use crate::config::{LoadingConfig, LoadingMode, ThreadingMode};
use crate::core::{
    FontSelection, GameLoader, HeartbeatWorker, Host, LoadTarget, LoaderWorker, ProgressLog,
    ProgressUi, SessionLink, SharedLoadState, Watchdog,
};
use frontend::{Frontend, InlineProgress};

//=== Session Types =======================================================

/// Lifecycle position of a [`LoadScreen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active(ThreadingMode),
    Finishing,
    Destroyed,
}

/// What the load screen hands to the caller once the session ends.
#[derive(Debug)]
pub enum Handoff<L> {
    /// The loaded game, to become the active controller.
    Game(L),

    /// The application is quitting; the game is not activated.
    Quit,
}

/// Result of one [`LoadScreen::update`] tick.
#[derive(Debug)]
pub enum UpdateOutcome<L> {
    /// Still loading; keep drawing.
    Loading,

    /// Loading finished on this tick and the session was torn down.
    Finished(Handoff<L>),

    /// The session was already destroyed.
    Destroyed,
}

//=== LoadScreenBuilder ===================================================

/// Builder for configuring and starting a [`LoadScreen`].
///
/// # Default Values
///
/// - **Loading mode**: single-threaded
/// - **Target FPS**: 50 (multi-threaded draw throttle)
/// - **Heartbeat interval**: 100 ms
/// - **Progress UI**: none
///
/// # Examples
///
/// ```ignore
/// let screen = LoadScreenBuilder::new(target, game, host, link)
///     .with_loading_mode(LoadingMode::Auto)
///     .with_progress_ui(IntroScreen::default())
///     .start();
///
/// if !screen.is_active() {
///     // Loaded synchronously, hand off right away.
/// }
/// ```
pub struct LoadScreenBuilder<H: Host, L: GameLoader> {
    target: LoadTarget,
    loader: L,
    host: H,
    link: Arc<dyn SessionLink>,
    config: LoadingConfig,
    ui: Option<Box<dyn ProgressUi>>,
}

impl<H: Host, L: GameLoader> LoadScreenBuilder<H, L> {
    /// Creates a builder with default settings.
    pub fn new(target: LoadTarget, loader: L, host: H, link: Arc<dyn SessionLink>) -> Self {
        Self {
            target,
            loader,
            host,
            link,
            config: LoadingConfig::default(),
            ui: None,
        }
    }

    /// Replaces the whole configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn with_config(mut self, config: LoadingConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("Invalid loading config: {}", e);
        }
        self.config = config;
        self
    }

    pub fn with_loading_mode(mut self, mode: LoadingMode) -> Self {
        self.config.loading_mode = mode;
        self
    }

    /// Sets the draw rate in multi-threaded mode.
    ///
    /// # Panics
    ///
    /// Panics if `fps == 0`.
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        assert!(fps > 0, "Target FPS must be positive");
        self.config.target_fps = fps;
        self
    }

    /// Sets the keepalive interval.
    ///
    /// # Panics
    ///
    /// Panics if the interval is shorter than one millisecond.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        assert!(millis > 0, "Heartbeat interval must be at least 1ms");
        self.config.heartbeat_interval_ms = millis;
        self
    }

    /// Installs a scripted progress renderer.
    pub fn with_progress_ui(mut self, ui: impl ProgressUi + 'static) -> Self {
        self.ui = Some(Box::new(ui));
        self
    }

    /// Starts the session.
    ///
    /// In single-threaded mode this blocks until loading finished; check
    /// [`LoadScreen::is_active`] afterwards.
    pub fn start(self) -> LoadScreen<H, L> {
        LoadScreen::create(
            self.target,
            self.loader,
            self.host,
            self.link,
            self.config,
            self.ui,
        )
    }
}

//=== LoadScreen ==========================================================

/// Controller of one load session.
///
/// # Threading
///
/// `update`, `draw` and the input handlers run on the foreground thread.
/// The loader (multi-threaded mode) and the heartbeat run on their own
/// threads and only share the progress state.
///
/// # Panics
///
/// Dropping a session whose loader thread was started but never joined
/// (through [`LoadScreen::destroy`] or a finishing `update`) panics.
pub struct LoadScreen<H: Host, L: GameLoader> {
    target: LoadTarget,
    frontend: Frontend<H>,
    link: Arc<dyn SessionLink>,
    heartbeat: Option<HeartbeatWorker>,
    worker: Option<LoaderWorker<L>>,
    loaded: Option<L>,
    state: SessionState,
}

impl<H: Host, L: GameLoader> LoadScreen<H, L> {
    //--- Creation ---------------------------------------------------------

    fn create(
        target: LoadTarget,
        loader: L,
        host: H,
        link: Arc<dyn SessionLink>,
        config: LoadingConfig,
        ui: Option<Box<dyn ProgressUi>>,
    ) -> Self {
        let shared = Arc::new(SharedLoadState::new());

        let mut screen = Self {
            target,
            frontend: Frontend::new(host, ui, shared, config.min_frame_time()),
            link,
            heartbeat: None,
            worker: None,
            loaded: None,
            state: SessionState::Uninitialized,
        };

        // Hidden until in game.
        screen.frontend.host.show_cursor(false);

        let caps = screen.frontend.host.capabilities();
        let mode = config.resolve(&caps);
        info!(
            target: "loadscreen",
            "Loading map {} with {} ({:?}, resolved {:?})",
            screen.target.map_name,
            screen.target.mod_name,
            config.loading_mode,
            mode
        );

        //--- Heartbeat ------------------------------------------------------
        match HeartbeatWorker::spawn(Arc::clone(&screen.link), config.heartbeat_interval()) {
            Ok(worker) => screen.heartbeat = Some(worker),
            Err(e) => warn!(target: "loadscreen", "Heartbeat thread not started: {}", e),
        }

        //--- Loader ---------------------------------------------------------
        let inline_loader = if mode.is_multi_threaded() {
            screen.start_worker(loader).err()
        } else {
            Some(loader)
        };

        let mode = if inline_loader.is_some() {
            ThreadingMode::SingleThreaded
        } else {
            ThreadingMode::MultiThreaded
        };
        screen.frontend.mode = mode;
        screen.state = SessionState::Active(mode);

        if let Some(loader) = inline_loader {
            info!(target: "loadscreen", "[LoadScreen::create] single-threaded");
            screen.load_inline(loader);
        }

        screen
    }

    /// Starts the loader thread, or hands the loader back on failure after
    /// demoting the frontend to single-threaded resources.
    fn start_worker(&mut self, loader: L) -> Result<(), L> {
        self.frontend.host.set_font_thread_safety(true);

        let context = match self.frontend.host.create_offscreen_context() {
            Ok(context) => context,
            Err(e) => {
                warn!(target: "loadscreen", "[LoadScreen::create] {}", e);
                self.demote();
                return Err(loader);
            }
        };

        let worker = match LoaderWorker::spawn(
            loader,
            self.target.clone(),
            context,
            Arc::clone(&self.frontend.shared),
        ) {
            Ok(worker) => worker,
            Err(failure) => {
                warn!(target: "loadscreen", "[LoadScreen::create] loader thread not started: {}", failure.error);
                self.demote();
                return Err(failure.loader);
            }
        };
        self.worker = Some(worker);

        // The loader thread keeps the shared font; this thread gets its own.
        self.frontend.font = match self.frontend.host.load_local_font() {
            Ok(font) => FontSelection::Local(font),
            Err(e) => {
                warn!(target: "loadscreen", "Drawing with the shared font: {}", e);
                FontSelection::Shared
            }
        };

        Ok(())
    }

    fn demote(&mut self) {
        self.frontend.host.set_font_thread_safety(false);
        self.frontend.font = FontSelection::Shared;
    }

    fn load_inline(&mut self, mut loader: L) {
        loader.load_game(&self.target, &mut InlineProgress::new(&mut self.frontend));

        self.loaded = Some(loader);
        self.state = SessionState::Finishing;
    }

    //--- Queries ----------------------------------------------------------

    /// True while loading runs in the background.
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The threading mode the session settled on (after any demotion).
    pub fn mode(&self) -> ThreadingMode {
        self.frontend.mode
    }

    pub fn is_finished_loading(&self) -> bool {
        match &self.worker {
            Some(worker) => worker.is_finished_loading(),
            None => self.loaded.is_some(),
        }
    }

    pub fn target(&self) -> &LoadTarget {
        &self.target
    }

    /// Copy of the current progress log.
    pub fn progress(&self) -> ProgressLog {
        self.frontend.shared.snapshot()
    }

    /// Liveness timer for an external supervisor.
    pub fn watchdog(&self) -> Arc<Watchdog> {
        Arc::clone(self.frontend.shared.watchdog())
    }

    pub fn font(&self) -> FontSelection {
        self.frontend.font
    }

    pub fn host(&self) -> &H {
        &self.frontend.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.frontend.host
    }

    //--- Frame Ticks ------------------------------------------------------

    /// Foreground update tick.
    ///
    /// Tears the session down on the tick that observes the loader
    /// finished and returns the hand-off exactly once.
    pub fn update(&mut self) -> UpdateOutcome<L> {
        if self.state == SessionState::Destroyed {
            return UpdateOutcome::Destroyed;
        }

        // Native libraries may reset the FPU state at any time.
        self.frontend.check_fpu();

        if self.is_finished_loading() {
            self.state = SessionState::Finishing;
            return match self.destroy() {
                Some(handoff) => UpdateOutcome::Finished(handoff),
                None => UpdateOutcome::Destroyed,
            };
        }

        self.frontend.service_host();
        UpdateOutcome::Loading
    }

    /// Foreground draw tick. No-op once destroyed.
    pub fn draw(&mut self) {
        if self.state == SessionState::Destroyed {
            return;
        }

        self.frontend.draw();
    }

    //--- Input ------------------------------------------------------------

    pub fn key_pressed(&mut self, key: KeyCode, is_repeat: bool) -> i32 {
        if let Some(ui) = self.frontend.ui.as_mut() {
            ui.key_press(key, is_repeat);
        }
        0
    }

    pub fn key_released(&mut self, key: KeyCode) -> i32 {
        if let Some(ui) = self.frontend.ui.as_mut() {
            ui.key_release(key);
        }
        0
    }

    pub fn resize_event(&mut self) {
        if let Some(ui) = self.frontend.ui.as_mut() {
            ui.view_resize();
        }
    }

    //--- Teardown ---------------------------------------------------------

    /// Ends the session and returns the hand-off.
    ///
    /// Idempotent: only the first call returns `Some`. If a loader thread
    /// was started it is joined here, which blocks until loading finished;
    /// there is no cancellation mid-load.
    pub fn destroy(&mut self) -> Option<Handoff<L>> {
        if self.state == SessionState::Destroyed {
            return None;
        }

        let game = self.kill().or_else(|| self.loaded.take());

        if let Some(mut heartbeat) = self.heartbeat.take() {
            heartbeat.stop();
        }

        let quitting = self.frontend.host.quit_requested();

        if let Some(mut ui) = self.frontend.ui.take() {
            ui.shutdown();
        }

        self.state = SessionState::Destroyed;

        let Some(game) = game else {
            warn!(target: "loadscreen", "Session destroyed without a loaded game");
            return None;
        };

        if quitting {
            info!(target: "loadscreen", "Quit requested, game not activated");
            return Some(Handoff::Quit);
        }

        self.announce(&game);
        self.frontend.host.show_cursor(true);

        info!(target: "loadscreen", "Finished loading {}", self.target.map_name);
        Some(Handoff::Game(game))
    }

    /// Joins the loader thread, if one was started, and releases the
    /// resources that only existed for it.
    fn kill(&mut self) -> Option<L> {
        let worker = self.worker.take()?;
        let game = worker.join();

        self.frontend.host.set_font_thread_safety(false);
        if let FontSelection::Local(font) = self.frontend.font {
            self.frontend.host.release_font(font);
        }
        self.frontend.font = FontSelection::Shared;

        debug!(target: "loadscreen", "Loader thread joined");
        Some(game)
    }

    /// Tells peers we finished loading. Failures are not fatal.
    fn announce(&self, game: &L) {
        let player = self.target.player;

        if let Err(e) = self.link.send_player_name(player, &self.target.player_name) {
            warn!(target: "loadscreen", "Could not announce player name: {}", e);
        }

        if let Err(e) = self.link.send_path_checksum(player, game.completion_checksum()) {
            warn!(target: "loadscreen", "Could not announce path checksum: {}", e);
        }
    }
}

impl<H: Host, L: GameLoader> Drop for LoadScreen<H, L> {
    fn drop(&mut self) {
        // The loader thread publishes into state owned by this session.
        if self.worker.is_some() && !thread::panicking() {
            panic!("LoadScreen dropped with an unjoined loader thread; call destroy() first");
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
