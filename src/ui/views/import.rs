//! Import progress of a project.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};
use tracing::info;

use super::{failure_effects, Effect};
use crate::api::{ImportEvent, RemoteFailure};
use crate::tasks::Command;
use crate::ui::theme::THEME;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Status {
    #[default]
    Idle,
    Running(u8),
    Done,
    /// The stream closed early or failed.
    Interrupted,
}

#[derive(Debug, Default)]
pub struct ImportView {
    project: Option<String>,
    label: String,
    status: Status,
}

impl ImportView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin following `project`; `label` is its display name.
    pub fn start(&mut self, project: &str, label: &str) {
        self.project = Some(project.to_string());
        self.label = label.to_string();
        self.status = Status::Running(0);
    }

    pub fn percent(&self) -> Option<u8> {
        match self.status {
            Status::Running(p) => Some(p),
            Status::Done => Some(100),
            Status::Idle | Status::Interrupted => None,
        }
    }

    pub fn hints(&self) -> &'static str {
        "[Tab] other screens"
    }

    fn is_current(&self, project: &str) -> bool {
        self.project.as_deref() == Some(project)
    }

    /// Feed one stream event. Completion activates the imported project; the
    /// app opens the network screen once the backend confirms.
    pub fn progress(
        &mut self,
        project: &str,
        result: Result<ImportEvent, RemoteFailure>,
    ) -> Vec<Effect> {
        if !self.is_current(project) {
            return Vec::new();
        }
        match result {
            Ok(ImportEvent::Progress(percent)) => {
                self.status = Status::Running(percent);
                Vec::new()
            }
            Ok(ImportEvent::Complete) => {
                info!(%project, "Import complete");
                self.status = Status::Done;
                vec![
                    Effect::success("Import complete."),
                    Effect::Run(Command::SetProject(project.to_string())),
                ]
            }
            Err(failure) => {
                self.status = Status::Interrupted;
                failure_effects(&failure)
            }
        }
    }

    pub fn closed(&mut self, project: &str) -> Vec<Effect> {
        if !self.is_current(project) || self.status == Status::Done {
            return Vec::new();
        }
        self.status = Status::Interrupted;
        vec![Effect::warn("Import progress stream closed before completion.")]
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Import ")
            .borders(Borders::ALL)
            .border_style(THEME.border_style(true));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);

        let title = match &self.project {
            Some(_) => format!("Importing {}", self.label),
            None => "No import in progress. Press i on a project to follow its import.".into(),
        };
        frame.render_widget(Paragraph::new(Span::raw(title)), chunks[0]);

        let status = match self.status {
            Status::Idle => return,
            Status::Running(_) => "Processing evidence...",
            Status::Done => "Done.",
            Status::Interrupted => "Interrupted.",
        };
        frame.render_widget(
            Paragraph::new(Span::styled(status, THEME.muted_style())),
            chunks[1],
        );
        let percent = self.percent().unwrap_or(0);
        frame.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(THEME.accent))
                .percent(percent as u16),
            chunks[2],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;

    #[test]
    fn test_progress_then_complete_activates_project() {
        let mut view = ImportView::new();
        view.start("p1", "Alpha");
        assert!(view.progress("p1", Ok(ImportEvent::Progress(40))).is_empty());
        assert_eq!(view.percent(), Some(40));

        let effects = view.progress("p1", Ok(ImportEvent::Complete));
        assert!(effects.contains(&Effect::Run(Command::SetProject("p1".into()))));
        assert_eq!(view.percent(), Some(100));
        assert!(view.closed("p1").is_empty());
    }

    #[test]
    fn test_events_of_other_projects_are_ignored() {
        let mut view = ImportView::new();
        view.start("p2", "Beta");
        assert!(view.progress("p1", Ok(ImportEvent::Complete)).is_empty());
        assert_eq!(view.percent(), Some(0));
    }

    #[test]
    fn test_interruptions() {
        let mut view = ImportView::new();
        view.start("p1", "Alpha");
        assert_eq!(view.closed("p1").len(), 1);
        assert_eq!(view.percent(), None);

        view.start("p1", "Alpha");
        let effects = view.progress(
            "p1",
            Err(RemoteFailure::from(ApiError::ServerError("gone".into()))),
        );
        assert_eq!(effects.len(), 1);
        assert_eq!(view.percent(), None);
    }
}
