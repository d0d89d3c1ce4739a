//=========================================================================
// Load Screen Core
//=========================================================================
//
// Building blocks of a load session, independent of any window system.
//
// Responsibilities:
// - Share progress text between loader and renderer threads
// - Run the loader and the heartbeat on their own threads
// - Track liveness (watchdog) and floating-point state (FPU guard)
// - Define the seams to the host engine, network and progress UI
//
// Notes:
// The controller in `crate::load_screen` composes these pieces; nothing
// here decides threading mode or owns the session lifecycle.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod fpu;
pub mod heartbeat;
pub mod host;
pub mod loader;
pub mod progress;
pub mod watchdog;

//=== Public API ==========================================================

pub use heartbeat::HeartbeatWorker;
pub use host::{
    FontId, FontSelection, GraphicsCapabilities, Host, OffscreenContext, PlayerId, ProgressUi,
    SessionLink,
};
pub use loader::{GameLoader, LoadTarget, LoaderWorker, ProgressSink, SpawnFailure, ThreadedProgress};
pub use progress::{ProgressLog, ProgressNotice, SharedLoadState};
pub use watchdog::Watchdog;
