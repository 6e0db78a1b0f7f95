//! Attachment export by file extension.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{failure_effects, Effect};
use crate::api::RemoteFailure;
use crate::tasks::{Command, Download};
use crate::ui::components::TextInput;
use crate::ui::theme::THEME;

pub const NO_EXTENSIONS: &str = "Please enter attachment extensions.";

/// Normalise typed extensions into the newline-separated list the backend
/// expects. Leading dots are dropped; `*` selects every attachment.
pub fn normalize_extensions(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .map(|ext| ext.trim().trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct ExportView {
    input: TextInput,
    editing: bool,
    running: bool,
    result: Option<Download>,
}

impl ExportView {
    pub fn new() -> Self {
        Self {
            input: TextInput::new().with_placeholder("pdf docx xlsx  (* for all)"),
            editing: false,
            running: false,
            result: None,
        }
    }

    pub fn result(&self) -> Option<&Download> {
        self.result.as_ref()
    }

    pub fn is_capturing(&self) -> bool {
        self.editing
    }

    pub fn hints(&self) -> &'static str {
        if self.editing {
            "[Enter] export  [Esc] stop editing"
        } else {
            "[e] edit extensions  [Enter] export  [o] open download"
        }
    }

    pub fn finished(&mut self, result: Result<Download, RemoteFailure>) -> Vec<Effect> {
        self.running = false;
        match result {
            Ok(download) => {
                self.result = Some(download);
                vec![Effect::success("Export finished.")]
            }
            Err(failure) => failure_effects(&failure),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if self.editing {
            return match key.code {
                KeyCode::Esc => {
                    self.editing = false;
                    Vec::new()
                }
                KeyCode::Enter => {
                    self.editing = false;
                    self.submit()
                }
                _ => {
                    self.input.handle_input(key);
                    Vec::new()
                }
            };
        }

        if key.modifiers != KeyModifiers::NONE {
            return Vec::new();
        }
        match key.code {
            KeyCode::Char('e') | KeyCode::Char('i') => {
                self.editing = true;
                Vec::new()
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Char('o') => match &self.result {
                Some(download) => vec![Effect::Open(download.url.clone())],
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.editing = true;
        self.input.insert_str(text);
    }

    fn submit(&mut self) -> Vec<Effect> {
        let extensions = normalize_extensions(self.input.value());
        if extensions.is_empty() {
            return vec![Effect::warn(NO_EXTENSIONS)];
        }
        if self.running {
            return vec![Effect::warn("An export is already running.")];
        }
        self.running = true;
        self.result = None;
        vec![Effect::Run(Command::Export(extensions))]
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);
        self.input
            .render(frame, chunks[0], "Attachment extensions", self.editing);

        let lines = match (&self.result, self.running) {
            (_, true) => vec![Line::from(Span::styled(
                "Exporting attachments...",
                THEME.muted_style(),
            ))],
            (Some(download), false) => vec![
                Line::from(vec![
                    Span::styled("Archive: ", THEME.header_style()),
                    Span::raw(download.path.clone()),
                ]),
                Line::from(vec![
                    Span::styled("Download: ", THEME.header_style()),
                    Span::raw(download.url.clone()),
                ]),
                Line::from(""),
                Line::from(Span::styled("[o] open in browser", THEME.muted_style())),
            ],
            (None, false) => vec![Line::from(Span::styled(
                "Enter the extensions to export, separated by spaces or commas.",
                THEME.muted_style(),
            ))],
        };
        let block = Block::default()
            .title(" Export ")
            .borders(Borders::ALL)
            .border_style(THEME.border_style(!self.editing));
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            chunks[1],
        );
    }
}

impl Default for ExportView {
    fn default() -> Self {
        Self::new()
    }
}
