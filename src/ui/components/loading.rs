//! Spinner for outstanding remote calls.
//!
//! Several requests can be in flight at once (a search while a bulk action
//! is still running), so the indicator keeps one label per outstanding call
//! and shows the most recent.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone, Default)]
pub struct LoadingIndicator {
    labels: Vec<String>,
    frame: usize,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an outstanding call.
    pub fn start(&mut self, label: impl Into<String>) {
        let label = label.into();
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
    }

    /// Mark the call registered under `label` as finished.
    pub fn stop(&mut self, label: &str) {
        self.labels.retain(|l| l != label);
        if self.labels.is_empty() {
            self.frame = 0;
        }
    }

    pub fn is_active(&self) -> bool {
        !self.labels.is_empty()
    }

    /// Advance the animation; called on every UI tick.
    pub fn tick(&mut self) {
        if self.is_active() {
            self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
        }
    }

    /// Status-line text, empty when idle.
    pub fn text(&self) -> String {
        match self.labels.last() {
            Some(label) if self.labels.len() > 1 => format!(
                "{} {} (+{})",
                SPINNER_FRAMES[self.frame],
                label,
                self.labels.len() - 1
            ),
            Some(label) => format!("{} {}", SPINNER_FRAMES[self.frame], label),
            None => String::new(),
        }
    }

    /// Render right-aligned into a status line.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if !self.is_active() {
            return;
        }
        let paragraph = Paragraph::new(self.text())
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Right);
        frame.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_by_default() {
        let loading = LoadingIndicator::new();
        assert!(!loading.is_active());
        assert_eq!(loading.text(), "");
    }

    #[test]
    fn test_start_stop_tracks_labels() {
        let mut loading = LoadingIndicator::new();
        loading.start("Searching...");
        loading.start("Loading bookmarks...");
        loading.start("Searching...");
        assert_eq!(loading.text(), "⠋ Loading bookmarks... (+1)");

        loading.stop("Loading bookmarks...");
        assert_eq!(loading.text(), "⠋ Searching...");
        loading.stop("Searching...");
        assert!(!loading.is_active());
    }

    #[test]
    fn test_tick_wraps_and_only_runs_when_active() {
        let mut loading = LoadingIndicator::new();
        loading.tick();
        assert_eq!(loading.frame, 0);

        loading.start("Exporting...");
        for _ in 0..SPINNER_FRAMES.len() + 1 {
            loading.tick();
        }
        assert_eq!(loading.frame, 1);
    }

    #[test]
    fn test_stop_resets_frame_when_idle() {
        let mut loading = LoadingIndicator::new();
        loading.start("Loading projects...");
        loading.tick();
        loading.stop("Loading projects...");
        assert_eq!(loading.frame, 0);
    }
}
