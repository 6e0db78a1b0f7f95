//! Key predicates shared by the screens.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Ctrl+C quits from anywhere, even while typing.
pub fn is_quit_chord(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// The character of a key typed without Ctrl or Alt.
pub fn is_plain_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

/// Digit shortcut `1`..`9` as a zero-based tab index.
pub fn tab_shortcut(key: &KeyEvent) -> Option<usize> {
    match is_plain_char(key)? {
        c @ '1'..='9' => Some(c as usize - '1' as usize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_chord() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(is_quit_chord(&key));
        let plain = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert!(!is_quit_chord(&plain));
    }

    #[test]
    fn test_plain_char_accepts_shift() {
        let key = KeyEvent::new(KeyCode::Char('H'), KeyModifiers::SHIFT);
        assert_eq!(is_plain_char(&key), Some('H'));
        let ctrl = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(is_plain_char(&ctrl), None);
    }

    #[test]
    fn test_tab_shortcut() {
        let one = KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE);
        assert_eq!(tab_shortcut(&one), Some(0));
        let zero = KeyEvent::new(KeyCode::Char('0'), KeyModifiers::NONE);
        assert_eq!(tab_shortcut(&zero), None);
    }
}
