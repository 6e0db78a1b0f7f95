//! Dialog asking for the tag to apply to the checked messages.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::input::TextInput;
use super::modal::centered_rect;
use crate::ui::theme::THEME;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagInput {
    Editing,
    Submit(String),
    Cancel,
}

#[derive(Debug, Clone, Default)]
pub struct TagDialogView {
    input: TextInput,
    /// Validation message from the last submit.
    error: Option<String>,
}

impl TagDialogView {
    pub fn new() -> Self {
        Self {
            input: TextInput::new().with_placeholder("e.g. relevant"),
            error: None,
        }
    }

    /// Start with an empty field.
    pub fn reset(&mut self) {
        self.input.clear();
        self.error = None;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> TagInput {
        match key.code {
            KeyCode::Enter => TagInput::Submit(self.input.value().to_string()),
            KeyCode::Esc => TagInput::Cancel,
            _ => {
                if self.input.handle_input(key) {
                    self.error = None;
                }
                TagInput::Editing
            }
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.input.insert_str(text);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(" Add tag ")
            .borders(Borders::ALL)
            .border_style(THEME.border_style(true));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        if inner.height < 4 {
            return;
        }
        self.input
            .render(frame, Rect::new(inner.x, inner.y, inner.width, 3), "Tag", true);

        let message = match &self.error {
            Some(error) => Line::from(Span::styled(
                error.as_str(),
                Style::default().fg(Color::Red),
            )),
            None => Line::from(Span::styled(
                "[Enter] apply  [Esc] cancel",
                THEME.muted_style(),
            )),
        };
        frame.render_widget(
            Paragraph::new(message),
            Rect::new(inner.x, inner.y + 3, inner.width, 1),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_submit_carries_value() {
        let mut dialog = TagDialogView::new();
        for c in "hot".chars() {
            assert_eq!(dialog.handle_key(key(KeyCode::Char(c))), TagInput::Editing);
        }
        assert_eq!(
            dialog.handle_key(key(KeyCode::Enter)),
            TagInput::Submit("hot".into())
        );
    }

    #[test]
    fn test_typing_clears_error() {
        let mut dialog = TagDialogView::new();
        dialog.set_error("Please enter a tag.");
        dialog.handle_key(key(KeyCode::Char('x')));
        assert!(dialog.error.is_none());
    }

    #[test]
    fn test_reset_and_cancel() {
        let mut dialog = TagDialogView::new();
        dialog.handle_paste("draft");
        dialog.reset();
        assert!(dialog.input.is_empty());
        assert_eq!(dialog.handle_key(key(KeyCode::Esc)), TagInput::Cancel);
    }
}
