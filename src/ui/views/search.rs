//! Free-text search over the active project.
//!
//! The query is sent 500 ms after the last keystroke. Every request carries a
//! generation; a response for anything but the latest request is dropped.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};
use tracing::debug;

use super::messages::MessagesView;
use super::{failure_effects, Effect};
use crate::actions::{ReconcilePolicy, RemoveMode};
use crate::api::types::Message;
use crate::api::{RemoteFailure, SearchRequest};
use crate::table::Debouncer;
use crate::tasks::{Command, Generation, ListKind};
use crate::ui::components::TextInput;

/// Quiet period before a query is sent.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

pub struct SearchView {
    query: TextInput,
    editing: bool,
    debounce: Debouncer<String>,
    generation: Generation,
    /// Query of the request in flight or last applied.
    sent: Option<String>,
    messages: MessagesView,
    query_area: Rect,
}

impl SearchView {
    pub fn new(policy: ReconcilePolicy, page_size: usize) -> Self {
        Self {
            query: TextInput::new().with_placeholder("Search subject, body, addresses..."),
            editing: true,
            debounce: Debouncer::new(SEARCH_DEBOUNCE),
            generation: Generation::new(),
            sent: None,
            messages: MessagesView::new(
                ListKind::Search,
                RemoveMode::ClearFlag,
                policy,
                page_size,
                "No messages found.",
            ),
            query_area: Rect::default(),
        }
    }

    pub fn messages_mut(&mut self) -> &mut MessagesView {
        &mut self.messages
    }

    pub fn query(&self) -> &str {
        self.query.value()
    }

    pub fn reset(&mut self) {
        self.query.clear();
        self.debounce.cancel();
        self.generation.next();
        self.sent = None;
        self.editing = true;
        self.messages.replace(Vec::new());
    }

    pub fn is_capturing(&self) -> bool {
        self.editing || self.messages.is_capturing()
    }

    pub fn hints(&self) -> &'static str {
        if self.editing {
            "[type] query  [Enter/Esc] results"
        } else {
            self.messages.hints()
        }
    }

    /// Fire the debounced query once it has settled.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        self.messages.tick(now);
        match self.debounce.poll(now) {
            Some(query) => self.search(query),
            None => Vec::new(),
        }
    }

    fn search(&mut self, query: String) -> Vec<Effect> {
        let query = query.trim().to_string();
        let generation = self.generation.next();
        if query.is_empty() {
            self.sent = None;
            self.messages.replace(Vec::new());
            return Vec::new();
        }
        debug!(generation, "Searching");
        self.sent = Some(query.clone());
        vec![Effect::Run(Command::Search {
            list: ListKind::Search,
            generation,
            request: SearchRequest::Query { query },
        })]
    }

    /// Apply a search response. Stale generations are dropped.
    pub fn apply_results(
        &mut self,
        generation: u64,
        result: Result<Vec<Message>, RemoteFailure>,
    ) -> Vec<Effect> {
        if !self.generation.is_current(generation) {
            debug!(generation, "Dropping stale search response");
            return Vec::new();
        }
        match result {
            Ok(messages) => {
                self.messages.replace(messages);
                Vec::new()
            }
            Err(failure) => {
                self.messages.replace(Vec::new());
                failure_effects(&failure)
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        if !self.editing {
            if !self.messages.is_capturing()
                && key.modifiers == KeyModifiers::NONE
                && matches!(key.code, KeyCode::Char('i') | KeyCode::Char('/'))
            {
                self.editing = true;
                return Vec::new();
            }
            return self.messages.handle_key(key, now);
        }

        match key.code {
            KeyCode::Esc | KeyCode::Down => {
                self.editing = false;
                Vec::new()
            }
            KeyCode::Enter => {
                // Send right away instead of waiting for the quiet period.
                self.editing = false;
                self.debounce.cancel();
                let query = self.query.value().to_string();
                if self.sent.as_deref() == Some(query.trim()) {
                    return Vec::new();
                }
                self.search(query)
            }
            _ => {
                if self.query.handle_input(key) {
                    self.debounce.push(self.query.value().to_string(), now);
                }
                Vec::new()
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Effect> {
        let area = self.query_area;
        let on_query = mouse.column >= area.x
            && mouse.column < area.right()
            && mouse.row >= area.y
            && mouse.row < area.bottom();
        if let MouseEventKind::Down(_) = mouse.kind {
            self.editing = on_query;
        }
        if on_query {
            return Vec::new();
        }
        self.messages.handle_mouse(mouse)
    }

    pub fn handle_paste(&mut self, text: &str, now: Instant) {
        if self.editing {
            self.query.insert_str(text);
            self.debounce.push(self.query.value().to_string(), now);
        } else {
            self.messages.handle_paste(text, now);
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(5)])
            .split(area);
        self.query_area = chunks[0];
        self.query.render(frame, chunks[0], "Search", self.editing);
        self.messages
            .render(frame, chunks[1], "Results", !self.editing);
    }
}
