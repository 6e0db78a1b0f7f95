//! Modal error dialog.
//!
//! Critical errors (bad configuration, keyring failures) block input until
//! dismissed. Everything else goes to a toast instead.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::error::AppError;

#[derive(Debug, Clone, Default)]
pub struct ErrorDialog {
    message: Option<String>,
    suggestion: Option<String>,
}

impl ErrorDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show an application error with its suggested action.
    pub fn show(&mut self, error: &AppError) {
        self.message = Some(error.user_message());
        self.suggestion = error.suggested_action().map(str::to_string);
    }

    pub fn dismiss(&mut self) {
        self.message = None;
        self.suggestion = None;
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(message) = &self.message else {
            return;
        };

        let popup = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup);

        let mut lines = vec![
            Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(Color::White),
            )),
            Line::default(),
        ];
        if let Some(suggestion) = &self.suggestion {
            lines.push(Line::from(Span::styled(
                suggestion.as_str(),
                Style::default().fg(Color::Yellow),
            )));
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            "[Enter/Esc] dismiss",
            Style::default().fg(Color::DarkGray),
        )));

        let block = Block::default()
            .title(Span::styled(
                " Error ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red));
        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup);
    }
}

/// A rectangle of `percent_x` by `percent_y` centred in `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
