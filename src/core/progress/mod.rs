//=========================================================================
// Progress
//=========================================================================
//
// Progress text produced by the loader and consumed by the renderer.
//
//   ProgressLog      archive + current line (plain data)
//   SharedLoadState  mutex + watchdog around it (cross-thread)
//
//=========================================================================

//=== Module Declarations =================================================

mod progress_log;
mod shared_state;

//=== Public API ==========================================================

pub use progress_log::ProgressLog;
pub use shared_state::{ProgressNotice, ProgressState, SharedLoadState};
