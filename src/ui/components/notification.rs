//! Toast notifications.
//!
//! Bulk actions, validation failures and remote errors all surface here.
//! Toasts stack in the bottom-right corner and expire on the UI tick; the
//! clock is passed in so expiry is testable without sleeping.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn icon(&self) -> &'static str {
        match self {
            Level::Info => "ℹ",
            Level::Success => "✓",
            Level::Warning => "⚠",
            Level::Error => "✗",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Level::Info => Color::Blue,
            Level::Success => Color::Green,
            Level::Warning => Color::Yellow,
            Level::Error => Color::Red,
        }
    }

    /// How long a toast of this level stays up.
    pub fn lifetime(&self) -> Duration {
        match self {
            Level::Info | Level::Success => Duration::from_secs(3),
            Level::Warning | Level::Error => Duration::from_secs(5),
        }
    }
}

/// A single toast.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: Level,
    expires_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: Level, now: Instant) -> Self {
        Self {
            message: message.into(),
            level,
            expires_at: now + level.lifetime(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Stack of visible toasts.
#[derive(Debug)]
pub struct NotificationManager {
    notifications: VecDeque<Notification>,
    max_visible: usize,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    /// Removing bookmarks posts one toast per row, so keep a few around.
    pub fn new() -> Self {
        Self::with_max_visible(4)
    }

    pub fn with_max_visible(max_visible: usize) -> Self {
        Self {
            notifications: VecDeque::new(),
            max_visible,
        }
    }

    /// Add a toast, dropping the oldest above the limit.
    pub fn push(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
        while self.notifications.len() > self.max_visible {
            self.notifications.pop_front();
        }
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Notification::new(message, Level::Warning, Instant::now()));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Notification::new(message, Level::Error, Instant::now()));
    }

    /// Drop expired toasts.
    pub fn tick(&mut self, now: Instant) {
        self.notifications.retain(|n| !n.is_expired(now));
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    /// Render the stack in the bottom-right corner of `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if self.notifications.is_empty() {
            return;
        }

        let width = 50.min(area.width.saturating_sub(4));
        // Borders plus the icon take four cells.
        let inner_width = width.saturating_sub(4).max(1) as usize;

        let heights: Vec<u16> = self
            .notifications
            .iter()
            .map(|n| {
                let chars = n.message.chars().count() + 2;
                chars.div_ceil(inner_width) as u16 + 2
            })
            .collect();
        let total_height = heights
            .iter()
            .sum::<u16>()
            .min(area.height.saturating_sub(2));

        let x = area.x + area.width.saturating_sub(width + 2);
        let y = area.y + area.height.saturating_sub(total_height + 1);
        let stack = Rect::new(x, y, width, total_height);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(heights.iter().map(|&h| Constraint::Length(h)))
            .split(stack);

        for (notification, chunk) in self.notifications.iter().zip(chunks.iter()) {
            render_notification(notification, frame, *chunk);
        }
    }
}

fn render_notification(notification: &Notification, frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);

    let style = Style::default().fg(notification.level.color());
    let text = Line::from(vec![
        Span::styled(
            format!("{} ", notification.level.icon()),
            style.add_modifier(Modifier::BOLD),
        ),
        Span::styled(notification.message.as_str(), style),
    ]);

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).border_style(style))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_lifetimes() {
        assert_eq!(Level::Success.lifetime(), Duration::from_secs(3));
        assert_eq!(Level::Error.lifetime(), Duration::from_secs(5));
    }

    #[test]
    fn test_expiry_uses_given_clock() {
        let start = Instant::now();
        let toast = Notification::new("Saved", Level::Info, start);
        assert!(!toast.is_expired(start + Duration::from_secs(2)));
        assert!(toast.is_expired(start + Duration::from_secs(3)));
    }

    #[test]
    fn test_tick_drops_expired_only() {
        let start = Instant::now();
        let mut manager = NotificationManager::new();
        manager.push(Notification::new("short", Level::Success, start));
        manager.push(Notification::new("long", Level::Error, start));
        manager.tick(start + Duration::from_secs(4));
        let left: Vec<&str> = manager.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(left, vec!["long"]);
    }

    #[test]
    fn test_max_visible_drops_oldest() {
        let mut manager = NotificationManager::with_max_visible(2);
        manager.warning("1");
        manager.warning("2");
        manager.error("3");
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.iter().next().unwrap().message, "2");
    }
}
