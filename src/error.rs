//=========================================================================
// Error Types
//=========================================================================
//
// Errors crossing the load screen's boundaries.
//
// None of these abort a load session on their own: context failures
// demote to single-threaded loading, link failures are tolerated, and
// config failures surface before a session exists.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== ContextError ========================================================

/// Failure to obtain a secondary (offscreen) GPU context or a resource
/// bound to one.
///
/// Returned by [`crate::core::Host`] implementations. The load screen
/// treats this as the designed demotion path to single-threaded loading.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The driver or windowing system refused to create the context.
    #[error("offscreen GL context creation failed: {0}")]
    Creation(String),

    /// The host does not support shared contexts at all.
    #[error("host does not support a secondary GPU context")]
    Unsupported,

    /// A thread-local rendering resource (e.g. a font) could not be loaded.
    #[error("failed to load thread-local resource: {0}")]
    Resource(String),
}

//=== LinkError ===========================================================

/// Best-effort network signalling failure.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Connection to the coordinating peer is gone.
    #[error("session link disconnected")]
    Disconnected,

    /// Message could not be sent.
    #[error("send failed: {0}")]
    Send(String),
}

//=== ConfigError =========================================================

/// Loading configuration could not be read or is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

//=== PlatformError =======================================================

/// Event loop errors raised while driving a load screen from winit.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Event loop execution error.
    #[error("event loop error: {0}")]
    EventLoopExecution(#[from] winit::error::EventLoopError),

    /// The event loop returned before the load screen handed off.
    #[error("event loop exited before loading finished")]
    ExitedEarly,
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_implement_error_trait() {
        fn assert_error<T: std::error::Error + 'static>() {}
        assert_error::<ContextError>();
        assert_error::<LinkError>();
        assert_error::<ConfigError>();
        assert_error::<PlatformError>();
    }

    #[test]
    fn context_error_display_includes_reason() {
        let err = ContextError::Creation("no shared visual".to_string());
        assert_eq!(
            err.to_string(),
            "offscreen GL context creation failed: no shared visual"
        );
    }

    #[test]
    fn config_error_wraps_io_source() {
        let err = ConfigError::Io {
            path: "loading.yaml".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("loading.yaml"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
