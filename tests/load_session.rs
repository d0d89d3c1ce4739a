//=========================================================================
// Load Session Integration Tests
//=========================================================================
//
// Drives whole sessions through the public API with a loader thread,
// a heartbeat and a progress UI running together.
//
//=========================================================================

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use aetheric_loadscreen::prelude::*;

//=== Test Doubles ========================================================

#[derive(Default)]
struct Counters {
    swaps: AtomicUsize,
    pumps: AtomicUsize,
    contexts: AtomicUsize,
    cursor_visible: AtomicBool,
}

struct TestHost {
    caps: GraphicsCapabilities,
    context_fails: bool,
    counters: Arc<Counters>,
}

impl TestHost {
    fn new(counters: &Arc<Counters>) -> Self {
        Self {
            caps: GraphicsCapabilities::default(),
            context_fails: false,
            counters: Arc::clone(counters),
        }
    }
}

struct TestContext;

impl OffscreenContext for TestContext {
    fn make_current(&mut self) {}
}

impl Host for TestHost {
    fn capabilities(&self) -> GraphicsCapabilities {
        self.caps
    }

    fn create_offscreen_context(&mut self) -> Result<Box<dyn OffscreenContext>, ContextError> {
        if self.context_fails {
            return Err(ContextError::Creation("GLX_ARB_create_context missing".into()));
        }
        self.counters.contexts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TestContext))
    }

    fn set_font_thread_safety(&mut self, _enabled: bool) {}

    fn load_local_font(&mut self) -> Result<FontId, ContextError> {
        Ok(FontId(1))
    }

    fn release_font(&mut self, _font: FontId) {}

    fn pump_events(&mut self) {
        self.counters.pumps.fetch_add(1, Ordering::SeqCst);
    }

    fn clear_screen(&mut self) {}

    fn swap_buffers(&mut self) {
        self.counters.swaps.fetch_add(1, Ordering::SeqCst);
    }

    fn show_cursor(&mut self, visible: bool) {
        self.counters.cursor_visible.store(visible, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct TestLink {
    keepalives: AtomicUsize,
    announcements: Mutex<Vec<String>>,
}

impl SessionLink for TestLink {
    fn send_keepalive(&self) -> Result<(), LinkError> {
        self.keepalives.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn send_player_name(&self, player: PlayerId, name: &str) -> Result<(), LinkError> {
        self.announcements.lock().unwrap().push(format!("player {} {}", player.0, name));
        Ok(())
    }

    fn send_path_checksum(&self, _player: PlayerId, checksum: u32) -> Result<(), LinkError> {
        self.announcements.lock().unwrap().push(format!("checksum {}", checksum));
        Ok(())
    }
}

/// Loads in steps, publishing a header and percentages for each.
struct StepLoader {
    steps: Vec<&'static str>,
    step_time: Duration,
    loaded_on: Option<thread::ThreadId>,
}

impl StepLoader {
    fn new(step_time: Duration) -> Self {
        Self {
            steps: vec!["Parsing map", "Creating units", "Initializing pathing"],
            step_time,
            loaded_on: None,
        }
    }
}

impl GameLoader for StepLoader {
    fn load_game(&mut self, target: &LoadTarget, progress: &mut dyn ProgressSink) {
        progress.set_message(&format!("Loading {}", target.map_name), false);

        for step in &self.steps {
            progress.set_message(step, false);
            for pct in [25, 50, 75, 100] {
                thread::sleep(self.step_time);
                progress.set_message(&format!("{}%", pct), true);
            }
        }

        self.loaded_on = Some(thread::current().id());
    }

    fn completion_checksum(&self) -> u32 {
        self.steps.len() as u32
    }
}

#[derive(Default)]
struct Frames {
    drawn: AtomicUsize,
    last: Mutex<String>,
}

struct CountingUi(Arc<Frames>);

impl ProgressUi for CountingUi {
    fn draw_load_screen(&mut self, log: &ProgressLog, _font: FontSelection) {
        self.0.drawn.fetch_add(1, Ordering::SeqCst);
        *self.0.last.lock().unwrap() = log.render_text();
    }
}

fn target() -> LoadTarget {
    LoadTarget::new("Altair Crossing", "Zero-K").with_player(PlayerId(1), "carol")
}

fn run_to_completion<H: Host>(screen: &mut LoadScreen<H, StepLoader>) -> Handoff<StepLoader> {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        match screen.update() {
            UpdateOutcome::Loading => screen.draw(),
            UpdateOutcome::Finished(handoff) => return handoff,
            UpdateOutcome::Destroyed => panic!("session destroyed before finishing"),
        }
        assert!(Instant::now() < deadline, "loading did not finish");
    }
}

//=== Tests ===============================================================

#[test]
fn multi_threaded_session_loads_in_background() {
    let counters = Arc::new(Counters::default());
    let link = Arc::new(TestLink::default());
    let frames = Arc::new(Frames::default());

    let mut screen = LoadScreenBuilder::new(
        target(),
        StepLoader::new(Duration::from_millis(2)),
        TestHost::new(&counters),
        link.clone(),
    )
    .with_loading_mode(LoadingMode::MultiThreaded)
    .with_heartbeat_interval(Duration::from_millis(5))
    .with_progress_ui(CountingUi(Arc::clone(&frames)))
    .start();

    assert!(screen.is_active());
    assert_eq!(counters.contexts.load(Ordering::SeqCst), 1);

    let game = match run_to_completion(&mut screen) {
        Handoff::Game(game) => game,
        Handoff::Quit => panic!("unexpected quit"),
    };

    assert_ne!(game.loaded_on, Some(thread::current().id()), "loaded off the foreground");
    assert_eq!(screen.state(), SessionState::Destroyed);
    assert!(screen.destroy().is_none(), "teardown runs exactly once");

    assert!(frames.drawn.load(Ordering::SeqCst) >= 1);
    assert_eq!(counters.swaps.load(Ordering::SeqCst), 0);
    assert!(link.keepalives.load(Ordering::SeqCst) >= 1);
    assert!(counters.cursor_visible.load(Ordering::SeqCst));
    assert_eq!(
        *link.announcements.lock().unwrap(),
        vec!["player 1 carol".to_string(), "checksum 3".to_string()]
    );

    let log = screen.progress();
    assert_eq!(
        log.archived(),
        ["Loading Altair Crossing", "Parsing map", "Creating units", "Initializing pathing"]
    );
    assert_eq!(log.current(), "100%");
}

#[test]
fn single_threaded_session_renders_each_message() {
    let counters = Arc::new(Counters::default());
    let frames = Arc::new(Frames::default());

    let mut screen = LoadScreenBuilder::new(
        target(),
        StepLoader::new(Duration::ZERO),
        TestHost::new(&counters),
        Arc::new(TestLink::default()),
    )
    .with_progress_ui(CountingUi(Arc::clone(&frames)))
    .start();

    assert!(!screen.is_active());

    // 1 header + 3 steps * (1 + 4 percentages)
    let messages = 1 + 3 * 5;
    assert_eq!(frames.drawn.load(Ordering::SeqCst), messages);
    assert_eq!(counters.swaps.load(Ordering::SeqCst), messages);
    assert_eq!(counters.pumps.load(Ordering::SeqCst), messages);
    assert_eq!(
        *frames.last.lock().unwrap(),
        "Loading Altair Crossing\nParsing map\nCreating units\nInitializing pathing\n100%"
    );

    match screen.update() {
        UpdateOutcome::Finished(Handoff::Game(game)) => {
            assert_eq!(game.loaded_on, Some(thread::current().id()));
        }
        _ => panic!("expected a finished game on the first update"),
    }
}

#[test]
fn demotion_still_completes_loading() {
    let counters = Arc::new(Counters::default());
    let mut host = TestHost::new(&counters);
    host.context_fails = true;

    let mut screen = LoadScreenBuilder::new(
        target(),
        StepLoader::new(Duration::ZERO),
        host,
        Arc::new(TestLink::default()),
    )
    .with_loading_mode(LoadingMode::MultiThreaded)
    .start();

    assert_eq!(screen.mode(), ThreadingMode::SingleThreaded);
    assert_eq!(screen.state(), SessionState::Finishing);
    assert!(matches!(run_to_completion(&mut screen), Handoff::Game(_)));
}

#[test]
fn create_then_destroy_without_update() {
    let counters = Arc::new(Counters::default());

    let mut screen = LoadScreenBuilder::new(
        target(),
        StepLoader::new(Duration::from_millis(1)),
        TestHost::new(&counters),
        Arc::new(TestLink::default()),
    )
    .with_loading_mode(LoadingMode::MultiThreaded)
    .start();

    // Joins the running loader; returns once it finished.
    assert!(matches!(screen.destroy(), Some(Handoff::Game(_))));
    assert!(screen.destroy().is_none());
}

/// Stays silent for `delay` before its only progress message.
struct SlowStartLoader {
    delay: Duration,
}

impl GameLoader for SlowStartLoader {
    fn load_game(&mut self, _target: &LoadTarget, progress: &mut dyn ProgressSink) {
        thread::sleep(self.delay);
        progress.set_message("Parsing map", false);
        thread::sleep(self.delay);
    }
}

#[test]
fn watchdog_cleared_by_progress() {
    let counters = Arc::new(Counters::default());

    let mut screen = LoadScreenBuilder::new(
        target(),
        SlowStartLoader { delay: Duration::from_millis(150) },
        TestHost::new(&counters),
        Arc::new(TestLink::default()),
    )
    .with_loading_mode(LoadingMode::MultiThreaded)
    .start();

    let watchdog = screen.watchdog();
    thread::sleep(Duration::from_millis(50));
    assert!(watchdog.is_stalled(Duration::from_millis(20)), "no progress yet");

    let deadline = Instant::now() + Duration::from_secs(5);
    while screen.progress().current() != "Parsing map" {
        assert!(Instant::now() < deadline, "first message never published");
        thread::sleep(Duration::from_millis(1));
    }
    assert!(!watchdog.is_stalled(Duration::from_millis(100)), "cleared by the message");

    assert!(matches!(screen.destroy(), Some(Handoff::Game(_))));
}

#[test]
fn config_file_drives_threading_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loading.yaml");
    std::fs::write(&path, "loading_mode: auto\ntarget_fps: 100\n").unwrap();
    let config = LoadingConfig::from_file(&path).unwrap();

    let counters = Arc::new(Counters::default());
    let mut host = TestHost::new(&counters);
    host.caps.have_intel = true;

    let mut screen = LoadScreenBuilder::new(
        target(),
        StepLoader::new(Duration::ZERO),
        host,
        Arc::new(TestLink::default()),
    )
    .with_config(config)
    .start();

    assert_eq!(screen.mode(), ThreadingMode::SingleThreaded);
    assert_eq!(counters.contexts.load(Ordering::SeqCst), 0);
    screen.destroy();
}
