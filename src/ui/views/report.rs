//! Investigation report.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{failure_effects, Effect};
use crate::api::RemoteFailure;
use crate::tasks::{Command, Download};
use crate::ui::theme::THEME;

#[derive(Debug, Default)]
pub struct ReportView {
    running: bool,
    result: Option<Download>,
}

impl ReportView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self) -> Option<&Download> {
        self.result.as_ref()
    }

    pub fn hints(&self) -> &'static str {
        "[r/Enter] create report  [o] open download"
    }

    pub fn finished(&mut self, result: Result<Download, RemoteFailure>) -> Vec<Effect> {
        self.running = false;
        match result {
            Ok(download) => {
                self.result = Some(download);
                vec![Effect::success("Report created.")]
            }
            Err(failure) => failure_effects(&failure),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.modifiers != KeyModifiers::NONE {
            return Vec::new();
        }
        match key.code {
            KeyCode::Char('r') | KeyCode::Enter => {
                if self.running {
                    return vec![Effect::warn("A report is already being created.")];
                }
                self.running = true;
                vec![Effect::Run(Command::Report)]
            }
            KeyCode::Char('o') => match &self.result {
                Some(download) => vec![Effect::Open(download.url.clone())],
                None => vec![Effect::warn("No report created yet.")],
            },
            _ => Vec::new(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let lines = if self.running {
            vec![Line::from(Span::styled("Creating report...", THEME.muted_style()))]
        } else if let Some(download) = &self.result {
            vec![
                Line::from(vec![
                    Span::styled("Download: ", THEME.header_style()),
                    Span::raw(download.url.clone()),
                ]),
                Line::from(""),
                Line::from(Span::styled("[o] open in browser", THEME.muted_style())),
            ]
        } else {
            vec![Line::from(Span::styled(
                "Press r to create a report of the bookmarked and tagged messages.",
                THEME.muted_style(),
            ))]
        };
        let block = Block::default()
            .title(" Report ")
            .borders(Borders::ALL)
            .border_style(THEME.border_style(true));
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, AuthRedirect};

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_report_then_open() {
        let mut view = ReportView::new();
        assert_eq!(view.handle_key(key('o')), vec![Effect::warn("No report created yet.")]);
        assert_eq!(view.handle_key(key('r')), vec![Effect::Run(Command::Report)]);

        view.finished(Ok(Download {
            path: "report.html".into(),
            url: "http://api/file/report.html".into(),
        }));
        assert_eq!(
            view.handle_key(key('o')),
            vec![Effect::Open("http://api/file/report.html".into())]
        );
    }

    #[test]
    fn test_expired_session_redirects() {
        let mut view = ReportView::new();
        view.handle_key(key('r'));
        let effects = view.finished(Err(RemoteFailure::from(ApiError::Unauthorized)));
        assert_eq!(effects, vec![Effect::Redirect(AuthRedirect::Login)]);
        assert!(view.result().is_none());
        // Not stuck in the running state.
        assert_eq!(view.handle_key(key('r')), vec![Effect::Run(Command::Report)]);
    }
}
