//! Event handler implementation.
//!
//! Polls for terminal events and converts them to application events.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind, MouseEventKind};

use super::Event;

/// The tick rate for the event loop in milliseconds.
const TICK_RATE_MS: u64 = 100;

/// Handles application events by polling crossterm for terminal events.
pub struct EventHandler {
    /// The tick rate duration.
    tick_rate: Duration,
}

impl EventHandler {
    /// Create a new event handler with the default tick rate.
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(TICK_RATE_MS),
        }
    }

    /// Create a new event handler with a custom tick rate.
    pub fn with_tick_rate(tick_rate_ms: u64) -> Self {
        Self {
            tick_rate: Duration::from_millis(tick_rate_ms),
        }
    }

    /// Poll for the next event.
    ///
    /// This method blocks until an event is available or the tick rate elapses.
    /// Returns `Event::Tick` if no event occurred within the tick rate.
    pub fn next(&self) -> std::io::Result<Event> {
        if event::poll(self.tick_rate)? {
            Ok(convert(event::read()?))
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a crossterm event to an application event.
fn convert(event: CrosstermEvent) -> Event {
    match event {
        // Windows reports both press and release; only presses count.
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Release => Event::Tick,
        CrosstermEvent::Key(key) => Event::Key(key),
        // Plain pointer motion is noise for the table.
        CrosstermEvent::Mouse(mouse) if mouse.kind == MouseEventKind::Moved => Event::Tick,
        CrosstermEvent::Mouse(mouse) => Event::Mouse(mouse),
        CrosstermEvent::Paste(text) => Event::Paste(text),
        CrosstermEvent::Resize(width, height) => Event::Resize(width, height),
        CrosstermEvent::FocusGained | CrosstermEvent::FocusLost => Event::Tick,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{
        KeyCode, KeyEvent, KeyEventState, KeyModifiers, MouseButton, MouseEvent,
    };

    fn mouse(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_event_handler_new() {
        let handler = EventHandler::new();
        assert_eq!(handler.tick_rate, Duration::from_millis(TICK_RATE_MS));
    }

    #[test]
    fn test_event_handler_with_tick_rate() {
        let handler = EventHandler::with_tick_rate(50);
        assert_eq!(handler.tick_rate, Duration::from_millis(50));
    }

    #[test]
    fn test_event_handler_default() {
        let handler = EventHandler::default();
        assert_eq!(handler.tick_rate, Duration::from_millis(TICK_RATE_MS));
    }

    #[test]
    fn test_key_release_is_ignored() {
        let key = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(convert(CrosstermEvent::Key(key)), Event::Tick);
    }

    #[test]
    fn test_mouse_clicks_pass_through() {
        let click = mouse(MouseEventKind::Down(MouseButton::Left));
        assert_eq!(convert(CrosstermEvent::Mouse(click)), Event::Mouse(click));
        assert_eq!(
            convert(CrosstermEvent::Mouse(mouse(MouseEventKind::Moved))),
            Event::Tick
        );
    }

    #[test]
    fn test_paste_is_forwarded() {
        assert_eq!(
            convert(CrosstermEvent::Paste("token".into())),
            Event::Paste("token".into())
        );
    }
}
