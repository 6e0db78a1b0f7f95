//! Tabbed detail panel for the focused message.
//!
//! Every server-supplied text goes through [`sanitize::render_text`] before
//! it reaches the terminal.

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::api::types::Message;
use crate::sanitize;
use crate::ui::theme::THEME;

pub const NO_MESSAGE: &str = "No message selected";
pub const NO_ATTACHMENTS: &str = "No attachments found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Message,
    Headers,
    Attachments,
}

impl DetailTab {
    const ALL: [DetailTab; 3] = [DetailTab::Message, DetailTab::Headers, DetailTab::Attachments];

    fn index(self) -> usize {
        Self::ALL.iter().position(|&t| t == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Tab title; the attachments tab carries its badge.
    pub fn title(self, message: Option<&Message>) -> String {
        match self {
            DetailTab::Message => "Message".to_string(),
            DetailTab::Headers => "Headers".to_string(),
            DetailTab::Attachments => match message {
                Some(message) => format!("Attachments {}", message.attachment_badge()),
                None => "Attachments (0)".to_string(),
            },
        }
    }
}

/// Body lines of `tab` for `message`.
pub fn tab_lines(tab: DetailTab, message: Option<&Message>) -> Vec<String> {
    let Some(message) = message else {
        return vec![NO_MESSAGE.to_string()];
    };
    match tab {
        DetailTab::Message => {
            let mut lines = vec![
                format!("Subject: {}", message.subject),
                format!("From: {}", message.from),
                format!("To: {}", message.to),
            ];
            if !message.cc.is_empty() {
                lines.push(format!("Cc: {}", message.cc));
            }
            lines.push(format!("Received: {}", message.received));
            lines.push(String::new());
            lines.extend(sanitize::render_text(&message.body));
            lines
        }
        DetailTab::Headers => sanitize::render_text(&message.headers),
        DetailTab::Attachments => match &message.attachments {
            Some(attachments) if !attachments.is_empty() => {
                attachments.iter().map(|a| a.summary()).collect()
            }
            _ => vec![NO_ATTACHMENTS.to_string()],
        },
    }
}

#[derive(Debug, Clone, Default)]
pub struct DetailPanel {
    tab: DetailTab,
    scroll: u16,
    /// Row and x-ranges of the tab titles from the last render.
    tab_hits: Vec<(DetailTab, u16, u16, u16)>,
}

impl DetailPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self) -> DetailTab {
        self.tab
    }

    pub fn select(&mut self, tab: DetailTab) {
        self.tab = tab;
        self.scroll = 0;
    }

    /// A different message was focused.
    pub fn reset_scroll(&mut self) {
        self.scroll = 0;
    }

    /// Keys while the panel has keyboard focus. Returns `false` for keys it
    /// does not use.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(']') => {
                self.select(self.tab.next())
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('[') => {
                self.select(self.tab.previous())
            }
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            _ => return false,
        }
        true
    }

    /// Clicks on tab titles switch tabs; the wheel scrolls.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let hit = self.tab_hits.iter().find(|(_, y, x0, x1)| {
                    mouse.row == *y && mouse.column >= *x0 && mouse.column < *x1
                });
                match hit {
                    Some(&(tab, ..)) => {
                        self.select(tab);
                        true
                    }
                    None => false,
                }
            }
            MouseEventKind::ScrollDown => {
                self.scroll = self.scroll.saturating_add(1);
                true
            }
            MouseEventKind::ScrollUp => {
                self.scroll = self.scroll.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        message: Option<&Message>,
        focused: bool,
    ) {
        let block = Block::default()
            .title(" Detail ")
            .borders(Borders::ALL)
            .border_style(THEME.border_style(focused));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height < 2 {
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        let mut spans = Vec::new();
        self.tab_hits.clear();
        let mut x = chunks[0].x;
        for tab in DetailTab::ALL {
            let title = format!(" {} ", tab.title(message));
            let width = title.chars().count() as u16;
            self.tab_hits.push((tab, chunks[0].y, x, x + width));
            spans.push(Span::styled(title, THEME.tab_style(tab == self.tab)));
            spans.push(Span::styled("│", THEME.muted_style()));
            x += width + 1;
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);

        let lines: Vec<Line> = tab_lines(self.tab, message)
            .into_iter()
            .map(Line::from)
            .collect();
        let body = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(body, chunks[1]);
    }
}
