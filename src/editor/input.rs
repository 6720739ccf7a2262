use winit::keyboard::{KeyCode, ModifiersState};

use crate::editor::command::EditorCommand;
use crate::editor::transform::{AxisMode, MoveKey};

#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Command(EditorCommand),
    /// Arrow key press; the mode comes from the modifiers held at that moment.
    Move(MoveKey, AxisMode),
    Screenshot,
}

pub fn move_key(code: KeyCode) -> Option<MoveKey> {
    match code {
        KeyCode::ArrowUp => Some(MoveKey::Up),
        KeyCode::ArrowDown => Some(MoveKey::Down),
        KeyCode::ArrowLeft => Some(MoveKey::Left),
        KeyCode::ArrowRight => Some(MoveKey::Right),
        _ => None,
    }
}

/// Ctrl on every platform, plus Cmd on macOS.
pub fn command_held(modifiers: ModifiersState) -> bool {
    modifiers.control_key() || modifiers.super_key()
}

/// Maps a key press to an editor action. Releases are handled separately
/// through [`move_key`].
pub fn map_key_press(code: KeyCode, modifiers: ModifiersState) -> Option<KeyAction> {
    let command = command_held(modifiers);

    if let Some(key) = move_key(code) {
        let mode = AxisMode::from_modifiers(command, modifiers.shift_key());
        return Some(KeyAction::Move(key, mode));
    }

    if command {
        return match code {
            KeyCode::KeyZ => Some(KeyAction::Command(EditorCommand::Undo)),
            KeyCode::KeyY => Some(KeyAction::Command(EditorCommand::Redo)),
            _ => None,
        };
    }

    let command = match code {
        KeyCode::Delete | KeyCode::Backspace | KeyCode::KeyD => EditorCommand::DeleteSelected,
        KeyCode::KeyH => EditorCommand::TogglePanels,
        KeyCode::KeyG => EditorCommand::ToggleGrid,
        KeyCode::KeyS => EditorCommand::ToggleStarfield,
        KeyCode::Space => EditorCommand::TogglePause,
        KeyCode::KeyX => EditorCommand::RecenterCamera,
        KeyCode::F12 => return Some(KeyAction::Screenshot),
        _ => return None,
    };

    Some(KeyAction::Command(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(code: KeyCode, modifiers: ModifiersState) -> Option<EditorCommand> {
        match map_key_press(code, modifiers) {
            Some(KeyAction::Command(command)) => Some(command),
            _ => None,
        }
    }

    #[test]
    fn delete_keys() {
        for code in [KeyCode::Delete, KeyCode::Backspace, KeyCode::KeyD] {
            assert_eq!(command(code, ModifiersState::empty()), Some(EditorCommand::DeleteSelected));
        }
    }

    #[test]
    fn undo_redo_accept_ctrl_or_cmd() {
        assert_eq!(command(KeyCode::KeyZ, ModifiersState::CONTROL), Some(EditorCommand::Undo));
        assert_eq!(command(KeyCode::KeyZ, ModifiersState::SUPER), Some(EditorCommand::Undo));
        assert_eq!(command(KeyCode::KeyY, ModifiersState::CONTROL), Some(EditorCommand::Redo));
        assert_eq!(command(KeyCode::KeyZ, ModifiersState::empty()), None);
        // Ctrl+D is not a delete
        assert_eq!(command(KeyCode::KeyD, ModifiersState::CONTROL), None);
    }

    #[test]
    fn arrows_latch_axis_mode_from_modifiers() {
        assert_eq!(
            map_key_press(KeyCode::ArrowUp, ModifiersState::empty()),
            Some(KeyAction::Move(MoveKey::Up, AxisMode::Planar))
        );
        assert_eq!(
            map_key_press(KeyCode::ArrowDown, ModifiersState::SHIFT),
            Some(KeyAction::Move(MoveKey::Down, AxisMode::Vertical))
        );
        assert_eq!(
            map_key_press(KeyCode::ArrowLeft, ModifiersState::SUPER | ModifiersState::SHIFT),
            Some(KeyAction::Move(MoveKey::Left, AxisMode::Scale))
        );
    }

    #[test]
    fn view_toggles() {
        let none = ModifiersState::empty();
        assert_eq!(command(KeyCode::KeyH, none), Some(EditorCommand::TogglePanels));
        assert_eq!(command(KeyCode::KeyG, none), Some(EditorCommand::ToggleGrid));
        assert_eq!(command(KeyCode::KeyS, none), Some(EditorCommand::ToggleStarfield));
        assert_eq!(command(KeyCode::Space, none), Some(EditorCommand::TogglePause));
        assert_eq!(command(KeyCode::KeyX, none), Some(EditorCommand::RecenterCamera));
        assert_eq!(map_key_press(KeyCode::F12, none), Some(KeyAction::Screenshot));
        assert_eq!(map_key_press(KeyCode::KeyQ, none), None);
    }
}
