//! Colors shared by the screens.

use ratatui::style::{Color, Modifier, Style};

/// Color theme for the application.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color,
    pub muted: Color,
    pub border: Color,
    pub border_focused: Color,
    pub checked: Color,
    pub trigger_fg: Color,
    pub trigger_bg: Color,
}

pub const THEME: Theme = Theme {
    accent: Color::Cyan,
    muted: Color::DarkGray,
    border: Color::DarkGray,
    border_focused: Color::Cyan,
    checked: Color::Green,
    trigger_fg: Color::Black,
    trigger_bg: Color::Yellow,
};

impl Theme {
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn trigger_style(&self) -> Style {
        Style::default()
            .fg(self.trigger_fg)
            .bg(self.trigger_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Style of a tab title.
    pub fn tab_style(&self, active: bool) -> Style {
        if active {
            Style::default()
                .fg(self.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::White)
        }
    }
}
