//! Help panel view displaying keyboard shortcuts.
//!
//! A scrollable overlay listing the key bindings per screen. Opened with
//! '?' and closed with '?', 'q', or Escape.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use crate::ui::theme::THEME;

/// Key bindings grouped by the screen they apply to.
const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[
            ("Tab / S-Tab", "Next / previous screen"),
            ("1-7", "Jump to screen"),
            ("?", "Toggle this help"),
            ("q / C-c", "Quit"),
        ],
    ),
    (
        "Tables",
        &[
            ("j / k", "Move cursor"),
            ("Space", "Check row"),
            ("a", "Check / uncheck all rows"),
            ("Enter", "Open focused row"),
            ("m", "Bulk-action menu"),
            ("s", "Cycle sort of current column"),
            ("h / l", "Previous / next column"),
            ("H / L", "Move column left / right"),
            ("< / >", "Narrow / widen column"),
            ("n / p", "Next / previous page"),
            ("g / G", "First / last page"),
            ("+ / -", "Page size"),
            ("/", "Filter rows"),
            ("mouse", "Click, drag headers, drag borders"),
        ],
    ),
    (
        "Messages",
        &[
            ("d", "Focus the detail panel"),
            ("h / l", "Detail tab (in panel)"),
            ("j / k", "Scroll detail (in panel)"),
            ("Esc", "Back to table"),
        ],
    ),
    (
        "Projects",
        &[
            ("n", "New project (PgDn pages)"),
            ("i", "Watch import of focused project"),
            ("r", "Reload"),
        ],
    ),
    (
        "Filesystem",
        &[
            ("t", "Focus the evidence tree"),
            ("Enter / Space", "Expand or collapse node (in tree)"),
            ("r", "Reload tree"),
        ],
    ),
    ("Search", &[("/ or i", "Edit query"), ("Esc", "Leave query")]),
    ("Network", &[("r", "Reload")]),
    (
        "Export / Report",
        &[
            ("e", "Edit extensions"),
            ("Enter", "Start export / report"),
            ("o", "Open download link"),
        ],
    ),
    (
        "Sign in",
        &[
            ("o", "Open login page"),
            ("Enter", "Submit pasted session token"),
        ],
    ),
];

/// Actions that can be returned from the help view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpAction {
    /// Close the help panel.
    Close,
}

/// The help panel view.
pub struct HelpView {
    /// Current scroll position.
    scroll: usize,
    /// Total number of lines in the help content.
    total_lines: usize,
    /// Visible height (updated on render).
    visible_height: usize,
    log_hint: Option<String>,
}

impl HelpView {
    /// Create a new help view. `log_dir` is shown in the footer.
    pub fn new(log_dir: Option<String>) -> Self {
        let mut view = Self {
            scroll: 0,
            total_lines: 0,
            visible_height: 0,
            log_hint: log_dir.map(|dir| format!("Logs: {}", dir)),
        };
        view.total_lines = view.build_content_lines().len();
        view
    }

    /// Reset scroll position to top.
    pub fn reset_scroll(&mut self) {
        self.scroll = 0;
    }

    fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.visible_height)
    }

    /// Handle keyboard input for the help view.
    ///
    /// Returns `Some(HelpAction)` if an action should be taken, `None` otherwise.
    pub fn handle_input(&mut self, key_event: KeyEvent) -> Option<HelpAction> {
        match (key_event.code, key_event.modifiers) {
            (KeyCode::Char('?'), KeyModifiers::NONE)
            | (KeyCode::Char('q'), KeyModifiers::NONE)
            | (KeyCode::Esc, KeyModifiers::NONE) => Some(HelpAction::Close),

            (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, KeyModifiers::NONE) => {
                self.scroll = (self.scroll + 1).min(self.max_scroll());
                None
            }

            (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, KeyModifiers::NONE) => {
                self.scroll = self.scroll.saturating_sub(1);
                None
            }

            (KeyCode::Char('d'), KeyModifiers::CONTROL)
            | (KeyCode::PageDown, KeyModifiers::NONE) => {
                let page_size = self.visible_height.saturating_sub(2);
                self.scroll = (self.scroll + page_size).min(self.max_scroll());
                None
            }

            (KeyCode::Char('u'), KeyModifiers::CONTROL) | (KeyCode::PageUp, KeyModifiers::NONE) => {
                let page_size = self.visible_height.saturating_sub(2);
                self.scroll = self.scroll.saturating_sub(page_size);
                None
            }

            (KeyCode::Char('g'), KeyModifiers::NONE) => {
                self.scroll = 0;
                None
            }

            (KeyCode::Char('G'), KeyModifiers::SHIFT)
            | (KeyCode::Char('G'), KeyModifiers::NONE) => {
                self.scroll = self.max_scroll();
                None
            }

            // Consume all other input when help is open
            _ => None,
        }
    }

    /// Render the help view.
    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Help - Keyboard Shortcuts ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(THEME.border_style(true));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        self.visible_height = inner.height as usize;
        self.scroll = self.scroll.min(self.max_scroll());

        let paragraph = Paragraph::new(self.build_content_lines())
            .scroll((self.scroll as u16, 0))
            .alignment(Alignment::Left);
        frame.render_widget(paragraph, inner);

        if self.total_lines > self.visible_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));

            let mut scrollbar_state = ScrollbarState::new(self.max_scroll()).position(self.scroll);

            let scrollbar_area = Rect::new(
                area.x + area.width.saturating_sub(1),
                area.y + 1,
                1,
                area.height.saturating_sub(2),
            );

            frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
        }
    }

    fn build_content_lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = Vec::new();

        for (section, bindings) in SECTIONS {
            lines.push(Line::from(vec![Span::styled(
                format!("── {} ──", section),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )]));
            lines.push(Line::from(""));

            for (key, description) in bindings.iter() {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{:>14}", key),
                        Style::default()
                            .fg(THEME.checked)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::raw(*description),
                ]));
            }

            lines.push(Line::from(""));
        }

        if let Some(hint) = &self.log_hint {
            lines.push(Line::from(Span::styled(hint.clone(), THEME.muted_style())));
        }
        lines.push(Line::from(vec![Span::styled(
            "Press ?, q, or Esc to close",
            THEME.muted_style(),
        )]));

        lines
    }
}

impl Default for HelpView {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_help_view_new() {
        let view = HelpView::new(None);
        assert_eq!(view.scroll, 0);
        assert!(view.total_lines > SECTIONS.len());
    }

    #[test]
    fn test_log_hint_adds_a_line() {
        let plain = HelpView::new(None);
        let with_logs = HelpView::new(Some("/tmp/logs".into()));
        assert_eq!(with_logs.total_lines, plain.total_lines + 1);
    }

    #[test]
    fn test_reset_scroll() {
        let mut view = HelpView::default();
        view.scroll = 10;
        view.reset_scroll();
        assert_eq!(view.scroll, 0);
    }

    #[test]
    fn test_close_keys() {
        for code in [KeyCode::Char('?'), KeyCode::Char('q'), KeyCode::Esc] {
            let mut view = HelpView::default();
            assert_eq!(view.handle_input(key(code)), Some(HelpAction::Close));
        }
    }

    #[test]
    fn test_scroll_down_and_up() {
        let mut view = HelpView::default();
        view.visible_height = 10;
        assert_eq!(view.handle_input(key(KeyCode::Char('j'))), None);
        assert_eq!(view.scroll, 1);
        view.handle_input(key(KeyCode::Char('k')));
        assert_eq!(view.scroll, 0);
    }

    #[test]
    fn test_go_top_and_bottom() {
        let mut view = HelpView::default();
        view.visible_height = 10;
        view.handle_input(key(KeyCode::Char('G')));
        assert_eq!(view.scroll, view.max_scroll());
        view.handle_input(key(KeyCode::Char('g')));
        assert_eq!(view.scroll, 0);
    }

    #[test]
    fn test_scroll_is_bounded() {
        let mut view = HelpView::default();
        view.visible_height = 100;
        for _ in 0..200 {
            view.handle_input(key(KeyCode::Char('j')));
        }
        assert!(view.scroll <= view.max_scroll());

        for _ in 0..300 {
            view.handle_input(key(KeyCode::Char('k')));
        }
        assert_eq!(view.scroll, 0);
    }
}
