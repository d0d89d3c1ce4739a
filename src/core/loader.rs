//=========================================================================
// Game Loader
//=========================================================================
//
// The long-running load and the worker thread that may run it.
//
// Architecture:
// ```text
//   GameLoader (game code)
//     └─ load_game(target, &mut dyn ProgressSink)   blocking
//
//   LoaderWorker (multi-threaded mode)
//     ├─ thread "load-game": bind OffscreenContext → load_game → unbind
//     ├─ finished: AtomicBool   set when the thread leaves, even by panic
//     └─ join() → L             loader handed back to the foreground
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::bounded;
use log::{debug, error, info};

//=== Internal Dependencies ===============================================

use super::host::{OffscreenContext, PlayerId};
use super::progress::SharedLoadState;

//=== LoadTarget ==========================================================

/// What a session loads, and who is loading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTarget {
    pub map_name: String,
    pub mod_name: String,

    /// Restore from this save instead of starting fresh.
    pub save_file: Option<PathBuf>,

    /// Local player, announced to peers once loading finished.
    pub player: PlayerId,
    pub player_name: String,
}

impl LoadTarget {
    pub fn new(map_name: impl Into<String>, mod_name: impl Into<String>) -> Self {
        Self {
            map_name: map_name.into(),
            mod_name: mod_name.into(),
            save_file: None,
            player: PlayerId::default(),
            player_name: String::new(),
        }
    }

    pub fn with_save_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_file = Some(path.into());
        self
    }

    pub fn with_player(mut self, player: PlayerId, name: impl Into<String>) -> Self {
        self.player = player;
        self.player_name = name.into();
        self
    }
}

//=== ProgressSink ========================================================

/// Where a loader publishes its progress messages.
pub trait ProgressSink {
    /// Publishes `text`. With `replace_last` the message updates the
    /// previous line (percentages) instead of starting a new one.
    fn set_message(&mut self, text: &str, replace_last: bool);
}

/// Sink used on the loader thread; only touches the shared state.
pub struct ThreadedProgress {
    shared: Arc<SharedLoadState>,
}

impl ThreadedProgress {
    pub fn new(shared: Arc<SharedLoadState>) -> Self {
        Self { shared }
    }
}

impl ProgressSink for ThreadedProgress {
    fn set_message(&mut self, text: &str, replace_last: bool) {
        self.shared.publish(text, replace_last);
    }
}

//=== GameLoader ==========================================================

/// The game being loaded.
///
/// After loading it becomes the next active controller, so the load
/// screen hands it back to the caller when the session ends.
pub trait GameLoader: Send + 'static {
    /// Loads everything for `target`. Blocks for seconds to minutes.
    fn load_game(&mut self, target: &LoadTarget, progress: &mut dyn ProgressSink);

    /// Checksum of the loaded state, announced to peers for sync checks.
    fn completion_checksum(&self) -> u32 {
        0
    }
}

//=== LoaderWorker ========================================================

/// Thread could not be created; the loader is returned untouched.
pub struct SpawnFailure<L> {
    pub loader: L,
    pub error: io::Error,
}

/// A [`GameLoader`] running on its own thread with its own GPU context.
pub struct LoaderWorker<L: GameLoader> {
    handle: JoinHandle<Option<L>>,
    finished: Arc<AtomicBool>,
}

struct FinishedOnDrop(Arc<AtomicBool>);

impl Drop for FinishedOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Unbinds the offscreen context when the worker exits, panicking or not.
struct ReleaseOnDrop(Box<dyn OffscreenContext>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.release_current();
    }
}

impl<L: GameLoader> LoaderWorker<L> {
    /// Starts loading on a new thread.
    ///
    /// # Errors
    ///
    /// If the OS refuses the thread the loader is handed back inside
    /// [`SpawnFailure`] so it can still run inline.
    pub fn spawn(
        loader: L,
        target: LoadTarget,
        context: Box<dyn OffscreenContext>,
        shared: Arc<SharedLoadState>,
    ) -> Result<Self, SpawnFailure<L>> {
        let finished = Arc::new(AtomicBool::new(false));

        // The loader travels through a channel so a failed spawn can
        // recover it from the second receiver.
        let (loader_tx, loader_rx) = bounded::<L>(1);
        let fallback_rx = loader_rx.clone();
        if let Err(e) = loader_tx.send(loader) {
            return Err(SpawnFailure {
                loader: e.into_inner(),
                error: io::Error::other("loader channel closed"),
            });
        }

        let thread_finished = Arc::clone(&finished);
        let spawned = thread::Builder::new()
            .name("load-game".to_string())
            .spawn(move || {
                let _finished = FinishedOnDrop(thread_finished);
                let mut loader = loader_rx.recv().ok()?;

                // Dropped before `_finished`, so the context is released
                // before completion is observable.
                let mut context = ReleaseOnDrop(context);
                context.0.make_current();
                debug!(target: "loadscreen::loader", "Loading {} on worker thread", target.map_name);

                loader.load_game(&target, &mut ThreadedProgress::new(shared));

                drop(context);
                info!(target: "loadscreen::loader", "Finished loading {}", target.map_name);
                Some(loader)
            });

        match spawned {
            Ok(handle) => Ok(Self { handle, finished }),
            Err(error) => match fallback_rx.try_recv() {
                Ok(loader) => Err(SpawnFailure { loader, error }),
                // Unreachable: the closure owning the other receiver never ran.
                Err(_) => panic!("loader lost after failed spawn: {}", error),
            },
        }
    }

    /// Non-blocking, thread-safe completion poll.
    pub fn is_finished_loading(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Joins the worker and returns the loaded game.
    ///
    /// # Panics
    ///
    /// Re-raises a panic of the loader thread on the calling thread.
    pub fn join(self) -> L {
        match self.handle.join() {
            Ok(Some(loader)) => loader,
            Ok(None) => panic!("loader thread exited without its loader"),
            Err(payload) => {
                error!(target: "loadscreen::loader", "Game loading thread panicked");
                std::panic::resume_unwind(payload)
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
