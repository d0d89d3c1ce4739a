//=========================================================================
// Host Boundaries
//=========================================================================
//
// Seams between the load screen and the rest of the engine.
//
//   Host         windowing, GL contexts, fonts, presentation (foreground)
//   SessionLink  network signalling to the coordinating peer (any thread)
//   ProgressUi   optional scripted progress renderer (foreground)
//
// Implementations live in the game; the load screen only orchestrates.
//
//=========================================================================

//=== External Dependencies ===============================================

use winit::keyboard::KeyCode;

//=== Internal Dependencies ===============================================

use super::progress::ProgressLog;
use crate::error::{ContextError, LinkError};

//=== GraphicsCapabilities ================================================

/// Facts about the running graphics stack, queried once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphicsCapabilities {
    /// Mesa driver in use.
    pub have_mesa: bool,

    /// Intel driver in use.
    pub have_intel: bool,

    /// No window or GL context at all (dedicated server, tests).
    pub headless: bool,
}

impl GraphicsCapabilities {
    /// Drivers known to crash when GL is used from two contexts at once.
    pub fn is_mt_unsafe_driver(&self) -> bool {
        self.have_mesa || self.have_intel
    }
}

//=== Fonts ===============================================================

/// Opaque handle to a font instance owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(pub u32);

/// Which font the progress renderer should draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontSelection {
    /// The engine-wide font (single-threaded, or after demotion).
    #[default]
    Shared,

    /// A font instance created for the foreground thread while the
    /// loader thread uses the shared one.
    Local(FontId),
}

//=== OffscreenContext ====================================================

/// A secondary GPU context handed to the loader thread.
///
/// Created on the foreground thread, then moved to and bound on the
/// loader thread for the whole load.
pub trait OffscreenContext: Send {
    /// Binds the context to the calling thread.
    fn make_current(&mut self);

    /// Unbinds the context before the loader thread exits.
    fn release_current(&mut self) {}
}

//=== Host ================================================================

/// Foreground engine services the load screen drives.
pub trait Host {
    fn capabilities(&self) -> GraphicsCapabilities;

    /// Creates the one secondary GPU context a loader thread may use.
    fn create_offscreen_context(&mut self) -> Result<Box<dyn OffscreenContext>, ContextError>;

    /// Makes font rendering safe to call from two threads.
    fn set_font_thread_safety(&mut self, enabled: bool);

    /// Loads a private font instance for the foreground thread.
    fn load_local_font(&mut self) -> Result<FontId, ContextError>;

    fn release_font(&mut self, font: FontId);

    /// Drains the OS event queue so the window is not flagged unresponsive.
    fn pump_events(&mut self);

    /// Refreshes the named texture cache.
    fn update_textures(&mut self) {}

    fn clear_screen(&mut self);

    fn swap_buffers(&mut self);

    fn show_cursor(&mut self, visible: bool);

    /// True once the user asked the whole application to quit.
    fn quit_requested(&self) -> bool {
        false
    }

    /// Called by the window driver when the window is closed.
    fn request_quit(&mut self) {}
}

//=== SessionLink =========================================================

/// Identifier of a player in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlayerId(pub u8);

/// Network seam to the coordinating peer (server or host player).
///
/// Shared between the heartbeat thread and the foreground, hence
/// `Send + Sync` and `&self` methods.
pub trait SessionLink: Send + Sync {
    /// Tells the peer this client is still alive while loading.
    fn send_keepalive(&self) -> Result<(), LinkError>;

    /// Announces the local player after loading finished.
    fn send_player_name(&self, player: PlayerId, name: &str) -> Result<(), LinkError>;

    /// Announces the checksum of the loaded state for sync checking.
    fn send_path_checksum(&self, player: PlayerId, checksum: u32) -> Result<(), LinkError>;
}

//=== ProgressUi ==========================================================

/// Optional scripted progress renderer.
///
/// Every hook runs on the foreground thread. All hooks default to no-ops
/// so a renderer only overrides what it draws.
pub trait ProgressUi {
    fn view_resize(&mut self) {}

    fn key_press(&mut self, _key: KeyCode, _is_repeat: bool) {}

    fn key_release(&mut self, _key: KeyCode) {}

    /// A progress message was published since the last frame.
    fn load_progress(&mut self, _message: &str, _replace_last: bool) {}

    fn update(&mut self) {}

    /// Draws the background before the screen is cleared for the overlay.
    fn draw_genesis(&mut self) {}

    fn draw_load_screen(&mut self, _log: &ProgressLog, _font: FontSelection) {}

    fn shutdown(&mut self) {}
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsafe_driver_detection() {
        assert!(!GraphicsCapabilities::default().is_mt_unsafe_driver());
        assert!(GraphicsCapabilities { have_mesa: true, ..Default::default() }.is_mt_unsafe_driver());
        assert!(GraphicsCapabilities { have_intel: true, ..Default::default() }.is_mt_unsafe_driver());
    }

    #[test]
    fn default_font_is_shared() {
        assert_eq!(FontSelection::default(), FontSelection::Shared);
    }

    #[test]
    fn progress_ui_hooks_default_to_noops() {
        struct Silent;
        impl ProgressUi for Silent {}

        let mut ui = Silent;
        ui.key_press(KeyCode::Escape, false);
        ui.load_progress("x", true);
        ui.draw_load_screen(&ProgressLog::new(), FontSelection::Shared);
        ui.shutdown();
    }
}
