//! Mapping from terminal events to pointer samples and session keys.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::types::PointerPos;

/// Keyboard commands outside the pointer stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    Hint,
    Restart,
    NextLevel,
}

/// One sample of the pointer stream, in terminal cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down(PointerPos),
    Drag(PointerPos),
    Up(PointerPos),
}

impl PointerInput {
    pub fn pos(&self) -> PointerPos {
        match *self {
            PointerInput::Down(p) | PointerInput::Drag(p) | PointerInput::Up(p) => p,
        }
    }
}

/// Map keyboard input to session keys.
pub fn handle_key_event(key: KeyEvent) -> Option<SessionKey> {
    match key.code {
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => Some(SessionKey::Hint),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(SessionKey::Restart),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter => Some(SessionKey::NextLevel),
        _ => None,
    }
}

/// Check if key should quit.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Left-button press, drag and release become pointer samples; everything else is dropped.
pub fn map_mouse_event(event: MouseEvent) -> Option<PointerInput> {
    let pos = PointerPos::new(event.column as f32, event.row as f32);
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(PointerInput::Down(pos)),
        MouseEventKind::Drag(MouseButton::Left) => Some(PointerInput::Drag(pos)),
        MouseEventKind::Up(MouseButton::Left) => Some(PointerInput::Up(pos)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_session_keys() {
        assert_eq!(handle_key_event(KeyEvent::from(KeyCode::Char('h'))), Some(SessionKey::Hint));
        assert_eq!(handle_key_event(KeyEvent::from(KeyCode::Char('R'))), Some(SessionKey::Restart));
        assert_eq!(handle_key_event(KeyEvent::from(KeyCode::Char('n'))), Some(SessionKey::NextLevel));
        assert_eq!(handle_key_event(KeyEvent::from(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_quit_keys() {
        assert!(should_quit(KeyEvent::from(KeyCode::Char('q'))));
        assert!(should_quit(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!should_quit(KeyEvent::from(KeyCode::Char('c'))));
    }

    #[test]
    fn test_mouse_mapping() {
        assert_eq!(
            map_mouse_event(mouse(MouseEventKind::Down(MouseButton::Left), 4, 7)),
            Some(PointerInput::Down(PointerPos::new(4.0, 7.0)))
        );
        assert_eq!(
            map_mouse_event(mouse(MouseEventKind::Drag(MouseButton::Left), 5, 2)),
            Some(PointerInput::Drag(PointerPos::new(5.0, 2.0)))
        );
        assert_eq!(
            map_mouse_event(mouse(MouseEventKind::Up(MouseButton::Left), 5, 2)),
            Some(PointerInput::Up(PointerPos::new(5.0, 2.0)))
        );
        assert_eq!(map_mouse_event(mouse(MouseEventKind::Down(MouseButton::Right), 1, 1)), None);
        assert_eq!(map_mouse_event(mouse(MouseEventKind::Moved, 1, 1)), None);
    }
}
