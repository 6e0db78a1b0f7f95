//! Single-line text input.
//!
//! Used for the search query, the table filter, the tag dialog, project
//! names, export extensions and the masked session-token field. The cursor
//! counts characters, not bytes, so non-ASCII input edits correctly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    /// Cursor position in characters.
    cursor: usize,
    masked: bool,
    placeholder: String,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// An input that displays bullets instead of its value.
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    #[cfg(test)]
    /// Replace the value and move the cursor to the end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    /// The value as it should appear on screen.
    pub fn display_value(&self) -> String {
        if self.masked {
            "•".repeat(self.len())
        } else {
            self.value.clone()
        }
    }

    /// Insert pasted text at the cursor. Line breaks become spaces.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            self.insert_char(if c == '\n' || c == '\r' { ' ' } else { c });
        }
    }

    /// Apply an editing key. Returns `true` when the value changed.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                let changed = !self.value.is_empty();
                self.clear();
                changed
            }
            (KeyCode::Char('w'), KeyModifiers::CONTROL) => self.delete_word(),
            (KeyCode::Char('a'), KeyModifiers::CONTROL) | (KeyCode::Home, _) => {
                self.cursor = 0;
                false
            }
            (KeyCode::Char('e'), KeyModifiers::CONTROL) | (KeyCode::End, _) => {
                self.cursor = self.len();
                false
            }
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.insert_char(c);
                true
            }
            (KeyCode::Backspace, _) if self.cursor > 0 => {
                self.cursor -= 1;
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
                true
            }
            (KeyCode::Delete, _) if self.cursor < self.len() => {
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
                true
            }
            (KeyCode::Left, _) => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            (KeyCode::Right, _) => {
                self.cursor = (self.cursor + 1).min(self.len());
                false
            }
            _ => false,
        }
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the word before the cursor.
    fn delete_word(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let chars: Vec<char> = self.value.chars().collect();
        let mut start = self.cursor;
        while start > 0 && !chars[start - 1].is_alphanumeric() {
            start -= 1;
        }
        while start > 0 && chars[start - 1].is_alphanumeric() {
            start -= 1;
        }
        let from = self.byte_index(start);
        let to = self.byte_index(self.cursor);
        self.value.replace_range(from..to, "");
        self.cursor = start;
        true
    }

    /// Render the input in a bordered box titled `label`.
    pub fn render(&self, frame: &mut Frame, area: Rect, label: &str, focused: bool) {
        let showing_placeholder = self.value.is_empty() && !self.placeholder.is_empty();
        let display = if showing_placeholder {
            self.placeholder.clone()
        } else {
            self.display_value()
        };

        let accent = if focused { Color::Yellow } else { Color::DarkGray };
        let text_style = if showing_placeholder {
            Style::default().fg(Color::DarkGray)
        } else if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let title_style = if focused {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", label), title_style))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent));
        frame.render_widget(Paragraph::new(display).style(text_style).block(block), area);

        if focused {
            let x = area.x + 1 + self.cursor as u16;
            if x < area.x + area.width.saturating_sub(1) {
                frame.set_cursor_position(Position::new(x, area.y + 1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn typed(text: &str) -> TextInput {
        let mut input = TextInput::new();
        for c in text.chars() {
            input.handle_input(key(KeyCode::Char(c)));
        }
        input
    }

    #[test]
    fn test_typing_appends() {
        let input = typed("fraud");
        assert_eq!(input.value(), "fraud");
        assert_eq!(input.cursor(), 5);
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut input = typed("abc");
        assert!(input.handle_input(key(KeyCode::Backspace)));
        assert_eq!(input.value(), "ab");

        input.handle_input(key(KeyCode::Home));
        assert!(!input.handle_input(key(KeyCode::Backspace)));
        assert!(input.handle_input(key(KeyCode::Delete)));
        assert_eq!(input.value(), "b");

        input.handle_input(key(KeyCode::End));
        assert!(!input.handle_input(key(KeyCode::Delete)));
    }

    #[test]
    fn test_insert_in_middle() {
        let mut input = typed("ac");
        input.handle_input(key(KeyCode::Left));
        input.handle_input(key(KeyCode::Char('b')));
        assert_eq!(input.value(), "abc");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn test_non_ascii_editing() {
        let mut input = typed("für");
        input.handle_input(key(KeyCode::Left));
        input.handle_input(key(KeyCode::Backspace));
        assert_eq!(input.value(), "fr");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn test_ctrl_u_clears() {
        let mut input = typed("query");
        assert!(input.handle_input(ctrl('u')));
        assert!(input.is_empty());
        assert!(!input.handle_input(ctrl('u')));
    }

    #[test]
    fn test_ctrl_w_deletes_word() {
        let mut input = typed("invoice march");
        assert!(input.handle_input(ctrl('w')));
        assert_eq!(input.value(), "invoice ");
        assert!(input.handle_input(ctrl('w')));
        assert_eq!(input.value(), "");
    }

    #[test]
    fn test_masked_display() {
        let mut input = TextInput::masked();
        input.set_value("secret");
        assert_eq!(input.display_value(), "••••••");
        assert_eq!(input.value(), "secret");
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut input = TextInput::new();
        input.insert_str("pdf\ndocx");
        assert_eq!(input.value(), "pdf docx");
        assert_eq!(input.cursor(), 8);
    }
}
