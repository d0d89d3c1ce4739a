//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use aetheric_loadscreen::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Controller
pub use crate::{run_load_screen, Handoff, LoadScreen, LoadScreenBuilder, SessionState, UpdateOutcome};

// Configuration
pub use crate::config::{LoadingConfig, LoadingMode, ThreadingMode};

// Host seams
pub use crate::core::{
    FontId, FontSelection, GameLoader, GraphicsCapabilities, Host, LoadTarget, OffscreenContext,
    PlayerId, ProgressLog, ProgressSink, ProgressUi, SessionLink,
};

// Errors
pub use crate::error::{ConfigError, ContextError, LinkError, PlatformError};
