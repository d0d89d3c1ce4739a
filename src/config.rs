//=========================================================================
// Loading Configuration
//=========================================================================
//
// The tri-state loading mode plus the load screen's timing knobs.
//
// Resolution:
// ```text
//   LoadingMode ──┐
//                 ├─ resolve() ──> ThreadingMode (once per session)
//   Capabilities ─┘
// ```
//
// The legacy integer setting maps as: > 0 multi, 0 single, < 0 auto.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::GraphicsCapabilities;
use crate::error::ConfigError;

//=== LoadingMode =========================================================

/// User-facing selection of how a game is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingMode {
    /// Always load on the foreground thread.
    #[default]
    SingleThreaded,

    /// Always load on a background thread with its own GPU context.
    MultiThreaded,

    /// Multi-threaded unless the graphics driver is known to crash with
    /// concurrent GL contexts.
    Auto,
}

impl From<i32> for LoadingMode {
    fn from(value: i32) -> Self {
        match value {
            v if v > 0 => Self::MultiThreaded,
            0 => Self::SingleThreaded,
            _ => Self::Auto,
        }
    }
}

impl LoadingMode {
    /// Resolves the threading decision for one session.
    pub fn resolve(self, caps: &GraphicsCapabilities) -> ThreadingMode {
        if caps.headless {
            return ThreadingMode::SingleThreaded;
        }

        let multi = match self {
            Self::SingleThreaded => false,
            Self::MultiThreaded => true,
            Self::Auto => !caps.is_mt_unsafe_driver(),
        };

        if multi {
            ThreadingMode::MultiThreaded
        } else {
            ThreadingMode::SingleThreaded
        }
    }
}

//=== ThreadingMode =======================================================

/// Resolved threading decision of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadingMode {
    SingleThreaded,
    MultiThreaded,
}

impl ThreadingMode {
    pub fn is_multi_threaded(self) -> bool {
        matches!(self, Self::MultiThreaded)
    }
}

//=== LoadingConfig =======================================================

/// Load screen configuration.
///
/// # Default Values
///
/// - **loading_mode**: `SingleThreaded`
/// - **target_fps**: 50 (draw throttle in multi-threaded mode)
/// - **heartbeat_interval_ms**: 100
/// - **safe_mode**: off
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    pub loading_mode: LoadingMode,
    pub target_fps: u32,
    pub heartbeat_interval_ms: u64,

    /// Pins loading to the foreground thread whatever `loading_mode` says.
    pub safe_mode: bool,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            loading_mode: LoadingMode::SingleThreaded,
            target_fps: 50,
            heartbeat_interval_ms: 100,
            safe_mode: false,
        }
    }
}

impl LoadingConfig {
    /// Settings used when the engine starts in safe mode.
    ///
    /// Loading stays single-threaded even if `loading_mode` is changed
    /// afterwards.
    pub fn safe_mode() -> Self {
        Self {
            loading_mode: LoadingMode::SingleThreaded,
            safe_mode: true,
            ..Self::default()
        }
    }

    /// Threading mode for a session on `caps`.
    pub fn resolve(&self, caps: &GraphicsCapabilities) -> ThreadingMode {
        if self.safe_mode {
            return ThreadingMode::SingleThreaded;
        }
        self.loading_mode.resolve(caps)
    }

    /// Parses and validates a YAML document.
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a YAML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::Invalid("target_fps must be positive".into()));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "heartbeat_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Minimum spacing between two draws in multi-threaded mode.
    pub fn min_frame_time(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.target_fps.max(1)))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
