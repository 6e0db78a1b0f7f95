//! Contact network of the active project.
//!
//! Rendered as a contacts table with the neighbours of the focused contact
//! and the time range of the sent messages.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tracing::debug;

use super::{failure_effects, Effect};
use crate::api::types::{Contact, NetworkGraph};
use crate::api::RemoteFailure;
use crate::table::{ColumnDescriptor, FocusedRow, SelectionSet, TableAction, TableState};
use crate::tasks::Command;
use crate::ui::components::{TableInput, TableView};
use crate::ui::theme::THEME;

pub const NO_CONTACTS: &str =
    "No contacts with at least one sent and received message found.";

fn contact_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("address", "Contact")
            .with_bounds(4, 80)
            .with_width(40),
        ColumnDescriptor::new("size", "Messages")
            .with_bounds(4, 20)
            .with_width(10),
        ColumnDescriptor::new("links", "Links")
            .with_bounds(4, 20)
            .with_width(8),
    ]
}

pub struct NetworkView {
    graph: Option<NetworkGraph>,
    contacts: Vec<Contact>,
    table: TableState,
    table_view: TableView,
    selection: SelectionSet,
    focus: FocusedRow,
}

impl NetworkView {
    pub fn new(page_size: usize) -> Self {
        Self {
            graph: None,
            contacts: Vec::new(),
            table: TableState::with_page_size(contact_columns(), page_size),
            table_view: TableView::with_empty_message(NO_CONTACTS),
            selection: SelectionSet::new(),
            focus: FocusedRow::none(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.graph.is_some()
    }

    pub fn reset(&mut self) {
        self.graph = None;
        self.contacts.clear();
        self.table
            .replace_records(&self.contacts, &mut self.selection, &mut self.focus);
    }

    pub fn set_graph(&mut self, result: Result<NetworkGraph, RemoteFailure>) -> Vec<Effect> {
        match result {
            Ok(graph) => {
                self.contacts = graph.contacts();
                debug!(contacts = self.contacts.len(), "Network loaded");
                self.graph = Some(graph);
                self.table
                    .replace_records(&self.contacts, &mut self.selection, &mut self.focus);
                Vec::new()
            }
            Err(failure) => {
                self.reset();
                failure_effects(&failure)
            }
        }
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Neighbours of the focused contact, or of the cursor row.
    pub fn neighbors(&self) -> Vec<String> {
        let Some(graph) = &self.graph else {
            return Vec::new();
        };
        let id = self
            .focus
            .get()
            .map(str::to_string)
            .or_else(|| self.table.cursor_id(&self.contacts));
        match id {
            Some(id) => graph.neighbors(&id),
            None => Vec::new(),
        }
    }

    /// "first → last" sent-message range, if the backend reported one.
    pub fn time_range(&self) -> Option<String> {
        let graph = self.graph.as_ref()?;
        if graph.is_empty() {
            return None;
        }
        Some(format!(
            "{} → {}",
            NetworkGraph::describe_timestamp(&graph.first_sent_message_data),
            NetworkGraph::describe_timestamp(&graph.last_sent_message_date)
        ))
    }

    pub fn is_capturing(&self) -> bool {
        self.table_view.is_filtering()
    }

    pub fn hints(&self) -> &'static str {
        if self.table_view.is_filtering() {
            self.table_view.hints()
        } else {
            "[j/k] move  [Enter] focus contact  [r] reload  [/] filter  [s] sort  [n/p] page"
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.table.tick(&self.contacts, now);
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        if !self.table_view.is_filtering()
            && key.code == KeyCode::Char('r')
            && key.modifiers == KeyModifiers::NONE
        {
            return vec![Effect::Run(Command::FetchNetwork)];
        }
        let input = self.table_view.handle_key(
            key,
            &mut self.table,
            &self.contacts,
            &mut self.selection,
            &mut self.focus,
            now,
        );
        self.table_input(input)
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Effect> {
        let input = self.table_view.handle_mouse(
            mouse,
            &mut self.table,
            &self.contacts,
            &mut self.selection,
            &mut self.focus,
        );
        self.table_input(input)
    }

    pub fn handle_paste(&mut self, text: &str, now: Instant) {
        self.table_view.handle_paste(text, &mut self.table, now);
    }

    fn table_input(&mut self, input: TableInput) -> Vec<Effect> {
        if let TableInput::Action(TableAction::OpenMenu) = input {
            return vec![Effect::warn("Contacts have no bulk actions.")];
        }
        Vec::new()
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);

        self.table_view.render(
            frame,
            chunks[0],
            "Contacts",
            &self.table,
            &self.contacts,
            &self.selection,
            &self.focus,
            true,
        );

        let mut lines = Vec::new();
        match self.time_range() {
            Some(range) => lines.push(Line::from(vec![
                Span::styled("Sent: ", THEME.header_style()),
                Span::raw(range),
            ])),
            None if self.graph.is_none() => {
                lines.push(Line::from(Span::styled("Loading...", THEME.muted_style())))
            }
            None => {}
        }
        let neighbors = self.neighbors();
        if !neighbors.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Linked contacts ({})", neighbors.len()),
                THEME.header_style(),
            )));
            lines.extend(neighbors.into_iter().map(|n| Line::from(format!("  {}", n))));
        }

        let block = Block::default()
            .title(" Network ")
            .borders(Borders::ALL)
            .border_style(THEME.border_style(false));
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            chunks[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{NetworkLink, NetworkNode};

    fn graph() -> NetworkGraph {
        let node = |id: &str, size: f64| NetworkNode {
            id: id.into(),
            size,
        };
        let link = |source: &str, target: &str| NetworkLink {
            source: source.into(),
            target: target.into(),
        };
        NetworkGraph {
            nodes: Some(vec![node("a@x", 3.0), node("b@x", 1.0), node("c@x", 2.0)]),
            links: Some(vec![link("a@x", "b@x"), link("c@x", "a@x")]),
            first_sent_message_data: "0".into(),
            last_sent_message_date: "not a number".into(),
        }
    }

    #[test]
    fn test_null_nodes_yield_no_contacts() {
        let mut view = NetworkView::new(10);
        view.set_graph(Ok(NetworkGraph::default()));
        assert!(view.contacts().is_empty());
        assert!(view.time_range().is_none());
        assert!(view.is_loaded());
    }

    #[test]
    fn test_neighbors_follow_cursor() {
        let mut view = NetworkView::new(10);
        view.set_graph(Ok(graph()));
        assert_eq!(view.contacts().len(), 3);
        assert_eq!(view.neighbors(), vec!["b@x".to_string(), "c@x".to_string()]);

        view.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE), Instant::now());
        assert_eq!(view.neighbors(), vec!["a@x".to_string()]);
    }

    #[test]
    fn test_time_range_formats_numbers_only() {
        let mut view = NetworkView::new(10);
        view.set_graph(Ok(graph()));
        let range = view.time_range().unwrap();
        assert!(range.starts_with("Thursday, 01 January, 1970"));
        assert!(range.ends_with("not a number"));
    }

    #[test]
    fn test_reload_key() {
        let mut view = NetworkView::new(10);
        assert_eq!(
            view.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE), Instant::now()),
            vec![Effect::Run(Command::FetchNetwork)]
        );
    }
}
