use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::ControlsSettings;
use crate::engine::Intent;

/// What a key press asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Intent(Intent),
    /// Re-scan the catalog now instead of waiting for the next poll.
    RefreshLibrary,
    Quit,
}

pub fn map_key(key: KeyEvent, controls: &ControlsSettings) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(KeyAction::Quit),
            _ => None,
        };
    }

    let seek = controls.seek_seconds as f64;
    let step = controls.volume_step;
    let intent = match key.code {
        KeyCode::Char(' ') | KeyCode::Char('p') => Intent::TogglePlay,
        KeyCode::Char('l') => Intent::Next,
        KeyCode::Char('h') => Intent::Prev,
        KeyCode::Char('L') => Intent::SeekBy(seek),
        KeyCode::Char('H') => Intent::SeekBy(-seek),
        KeyCode::Char('+') | KeyCode::Char('=') => Intent::AdjustVolume(step),
        KeyCode::Char('-') => Intent::AdjustVolume(-step),
        KeyCode::Char('m') => Intent::ToggleMute,
        KeyCode::Char('f') => Intent::ToggleLike(None),
        KeyCode::Char('s') => Intent::ToggleShuffle,
        KeyCode::Char('r') => Intent::CycleRepeat,
        KeyCode::Char('R') => return Some(KeyAction::RefreshLibrary),
        KeyCode::Char('q') => return Some(KeyAction::Quit),
        _ => return None,
    };
    Some(KeyAction::Intent(intent))
}
