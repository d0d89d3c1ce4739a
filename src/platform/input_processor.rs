//=========================================================================
// Input Processor
//=========================================================================
//
// Converts Winit window events into load screen input.
//
// Architecture:
//   Winit WindowEvent → InputProcessor → LoadScreenInput → LoadScreen
//
// The load screen only forwards keys (by physical code) and resizes to
// the progress UI. Unidentified keys and everything else are dropped.
//
//=========================================================================

//=== External Dependencies ===============================================

use winit::{
    event::{ElementState, KeyEvent},
    keyboard::{KeyCode, PhysicalKey},
};

//=== LoadScreenInput =====================================================

/// Input the load screen understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadScreenInput {
    KeyPressed { key: KeyCode, is_repeat: bool },
    KeyReleased { key: KeyCode },
    Resized,
}

//=== InputProcessor ======================================================

/// Stateless converter from Winit events.
pub(crate) struct InputProcessor;

impl InputProcessor {
    /// Converts a Winit key event (filters unidentified keys).
    pub(crate) fn process_key_event(key_event: &KeyEvent) -> Option<LoadScreenInput> {
        Self::process_key(key_event.physical_key, key_event.state, key_event.repeat)
    }

    pub(crate) fn process_key(
        physical_key: PhysicalKey,
        state: ElementState,
        repeat: bool,
    ) -> Option<LoadScreenInput> {
        let PhysicalKey::Code(key) = physical_key else {
            return None;
        };

        Some(match state {
            ElementState::Pressed => LoadScreenInput::KeyPressed { key, is_repeat: repeat },
            ElementState::Released => LoadScreenInput::KeyReleased { key },
        })
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NativeKeyCode;

    #[test]
    fn pressed_key_keeps_repeat_flag() {
        let input = InputProcessor::process_key(
            PhysicalKey::Code(KeyCode::Escape),
            ElementState::Pressed,
            true,
        );
        assert_eq!(
            input,
            Some(LoadScreenInput::KeyPressed { key: KeyCode::Escape, is_repeat: true })
        );
    }

    #[test]
    fn released_key() {
        let input = InputProcessor::process_key(
            PhysicalKey::Code(KeyCode::KeyA),
            ElementState::Released,
            false,
        );
        assert_eq!(input, Some(LoadScreenInput::KeyReleased { key: KeyCode::KeyA }));
    }

    #[test]
    fn unidentified_key_is_dropped() {
        let input = InputProcessor::process_key(
            PhysicalKey::Unidentified(NativeKeyCode::Unidentified),
            ElementState::Pressed,
            false,
        );
        assert_eq!(input, None);
    }
}
