//! Evidence tree with the messages of the checked nodes.
//!
//! The tree is flattened for display. Checking or unchecking a node issues a
//! tree-scoped search tagged with a new generation; only the response of the
//! latest search is applied.

use std::collections::HashSet;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::debug;

use super::messages::MessagesView;
use super::{failure_effects, Effect};
use crate::actions::{ReconcilePolicy, RemoveMode};
use crate::api::types::{Message, TreeNode};
use crate::api::{RemoteFailure, SearchRequest};
use crate::tasks::{Command, Generation, ListKind};
use crate::ui::theme::THEME;

/// One visible line of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatNode {
    pub depth: usize,
    pub label: String,
    pub value: String,
    pub has_children: bool,
    pub expanded: bool,
}

/// Width of the "▸ [x] " prefix after the indentation.
const CHECKBOX_END: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Tree,
    Messages,
}

pub struct FilesystemView {
    nodes: Vec<TreeNode>,
    expanded: HashSet<String>,
    checked: Vec<String>,
    cursor: usize,
    offset: usize,
    tree_error: Option<String>,
    loaded: bool,
    generation: Generation,
    messages: MessagesView,
    pane: Pane,
    tree_area: Rect,
}

impl FilesystemView {
    pub fn new(policy: ReconcilePolicy, page_size: usize) -> Self {
        Self {
            nodes: Vec::new(),
            expanded: HashSet::new(),
            checked: Vec::new(),
            cursor: 0,
            offset: 0,
            tree_error: None,
            loaded: false,
            generation: Generation::new(),
            messages: MessagesView::new(
                ListKind::Filesystem,
                RemoveMode::ClearFlag,
                policy,
                page_size,
                "Check a folder to list its messages.",
            ),
            pane: Pane::Tree,
            tree_area: Rect::default(),
        }
    }

    pub fn messages_mut(&mut self) -> &mut MessagesView {
        &mut self.messages
    }

    /// Whether the tree was fetched since the last project switch.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Forget everything, e.g. when another project is opened.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.expanded.clear();
        self.checked.clear();
        self.cursor = 0;
        self.offset = 0;
        self.tree_error = None;
        self.loaded = false;
        self.generation.next();
        self.messages.replace(Vec::new());
    }

    pub fn set_tree(&mut self, result: Result<Vec<TreeNode>, RemoteFailure>) -> Vec<Effect> {
        self.loaded = true;
        self.cursor = 0;
        self.offset = 0;
        self.checked.clear();
        self.expanded.clear();
        match result {
            Ok(nodes) => {
                debug!(roots = nodes.len(), "Evidence tree loaded");
                self.nodes = nodes;
                self.tree_error = None;
                Vec::new()
            }
            Err(failure) => {
                self.nodes.clear();
                self.tree_error = Some(failure.user_message());
                match failure.redirect() {
                    Some(redirect) => vec![Effect::Redirect(redirect)],
                    None => Vec::new(),
                }
            }
        }
    }

    /// Apply a search response. Stale generations are dropped.
    pub fn apply_results(
        &mut self,
        generation: u64,
        result: Result<Vec<Message>, RemoteFailure>,
    ) -> Vec<Effect> {
        if !self.generation.is_current(generation) {
            debug!(generation, "Dropping stale tree search response");
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

    /// Visible lines of the tree, depth first.
    pub fn flatten(&self) -> Vec<FlatNode> {
        let mut out = Vec::new();
        flatten_into(&self.nodes, 0, &self.expanded, &mut out);
        out
    }

    pub fn checked(&self) -> &[String] {
        &self.checked
    }

    pub fn is_capturing(&self) -> bool {
        self.pane == Pane::Messages && self.messages.is_capturing()
    }

    pub fn hints(&self) -> &'static str {
        match self.pane {
            Pane::Tree => "[j/k] move  [Space] check  [Enter/l/h] expand/collapse  [t] messages  [r] reload",
            Pane::Messages => self.messages.hints(),
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.messages.tick(now);
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        if self.pane == Pane::Messages {
            if !self.messages.is_capturing()
                && key.code == KeyCode::Char('t')
                && key.modifiers == KeyModifiers::NONE
            {
                self.pane = Pane::Tree;
                return Vec::new();
            }
            return self.messages.handle_key(key, now);
        }

        let visible = self.flatten();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < visible.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Home | KeyCode::Char('g') => self.cursor = 0,
            KeyCode::End | KeyCode::Char('G') => self.cursor = visible.len().saturating_sub(1),
            KeyCode::Enter => {
                if let Some(node) = visible.get(self.cursor) {
                    self.toggle_expanded(&node.value);
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if let Some(node) = visible.get(self.cursor) {
                    if node.has_children && !node.expanded {
                        self.expanded.insert(node.value.clone());
                    }
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                if let Some(node) = visible.get(self.cursor) {
                    self.expanded.remove(&node.value);
                }
            }
            KeyCode::Char(' ') => {
                if let Some(node) = visible.get(self.cursor) {
                    return self.toggle_checked(&node.value);
                }
            }
            KeyCode::Char('t') | KeyCode::Esc => self.pane = Pane::Messages,
            KeyCode::Char('r') => return vec![Effect::Run(Command::FetchTree)],
            _ => {}
        }
        Vec::new()
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Effect> {
        let area = self.tree_area;
        let inside = mouse.column >= area.x
            && mouse.column < area.right()
            && mouse.row >= area.y
            && mouse.row < area.bottom();
        if !inside {
            if matches!(mouse.kind, MouseEventKind::Down(_)) {
                self.pane = Pane::Messages;
            }
            return self.messages.handle_mouse(mouse);
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.pane = Pane::Tree;
                let inner_y = area.y + 1;
                if mouse.row < inner_y {
                    return Vec::new();
                }
                let index = self.offset + (mouse.row - inner_y) as usize;
                let visible = self.flatten();
                let Some(node) = visible.get(index) else {
                    return Vec::new();
                };
                self.cursor = index;
                let checkbox_end = area.x + 1 + (node.depth as u16) * 2 + CHECKBOX_END;
                if mouse.column < checkbox_end {
                    self.toggle_checked(&node.value)
                } else {
                    self.toggle_expanded(&node.value);
                    Vec::new()
                }
            }
            MouseEventKind::ScrollDown => {
                let len = self.flatten().len();
                self.cursor = (self.cursor + 1).min(len.saturating_sub(1));
                Vec::new()
            }
            MouseEventKind::ScrollUp => {
                self.cursor = self.cursor.saturating_sub(1);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn handle_paste(&mut self, text: &str, now: Instant) {
        if self.pane == Pane::Messages {
            self.messages.handle_paste(text, now);
        }
    }

    fn toggle_expanded(&mut self, value: &str) {
        if !self.expanded.remove(value) {
            self.expanded.insert(value.to_string());
        }
    }

    /// Flip a node's check and search the checked set again.
    fn toggle_checked(&mut self, value: &str) -> Vec<Effect> {
        match self.checked.iter().position(|v| v == value) {
            Some(index) => {
                self.checked.remove(index);
            }
            None => self.checked.push(value.to_string()),
        }

        let generation = self.generation.next();
        if self.checked.is_empty() {
            self.messages.replace(Vec::new());
            return Vec::new();
        }
        vec![Effect::Run(Command::Search {
            list: ListKind::Filesystem,
            generation,
            request: SearchRequest::TreeNodes {
                tree_node_uuids: self.checked.clone(),
            },
        })]
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(area);
        self.tree_area = chunks[0];
        self.render_tree(frame, chunks[0]);
        self.messages
            .render(frame, chunks[1], "Messages", self.pane == Pane::Messages);
    }

    fn render_tree(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Evidence ")
            .borders(Borders::ALL)
            .border_style(THEME.border_style(self.pane == Pane::Tree));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if let Some(error) = &self.tree_error {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    error.clone(),
                    Style::default().fg(Color::Red),
                ))),
                inner,
            );
            return;
        }

        let visible = self.flatten();
        if visible.is_empty() {
            let text = if self.loaded {
                "No evidence found."
            } else {
                "Loading..."
            };
            frame.render_widget(
                Paragraph::new(Span::styled(text, THEME.muted_style())),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if height > 0 && self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        let lines: Vec<Line> = visible
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(height)
            .map(|(i, node)| {
                let arrow = match (node.has_children, node.expanded) {
                    (false, _) => " ",
                    (true, false) => "▸",
                    (true, true) => "▾",
                };
                let check = if self.checked.contains(&node.value) {
                    "[x]"
                } else {
                    "[ ]"
                };
                let mut style = Style::default();
                if i == self.cursor && self.pane == Pane::Tree {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Line::from(Span::styled(
                    format!("{}{} {} {}", "  ".repeat(node.depth), arrow, check, node.label),
                    style,
                ))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn flatten_into(
    nodes: &[TreeNode],
    depth: usize,
    expanded: &HashSet<String>,
    out: &mut Vec<FlatNode>,
) {
    for node in nodes {
        let is_expanded = expanded.contains(&node.value);
        out.push(FlatNode {
            depth,
            label: node.label.clone(),
            value: node.value.clone(),
            has_children: !node.children.is_empty(),
            expanded: is_expanded,
        });
        if is_expanded {
            flatten_into(&node.children, depth + 1, expanded, out);
        }
    }
}
