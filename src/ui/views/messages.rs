//! Messages table with bulk actions and the detail panel.
//!
//! Shared by the filesystem, search and bookmarks screens. The view owns the
//! loaded messages together with their selection and focus; the table state
//! and bulk actions only ever see them through references.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};
use tracing::debug;

use super::detail::DetailPanel;
use super::Effect;
use crate::actions::{
    BulkActions, BulkError, BulkRequest, Completion, MenuEntry, Notice, ReconcilePolicy,
    RemoveMode, TagDialog, Ticket,
};
use crate::api::types::Message;
use crate::api::RemoteFailure;
use crate::table::{ColumnDescriptor, FocusedRow, SelectionSet, TableAction, TableState};
use crate::tasks::{Command, ListKind};
use crate::ui::components::{
    ActionMenu, Level, MenuInput, TableInput, TableView, TagDialogView, TagInput,
};

/// Columns of every message table.
pub fn message_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("subject", "Subject").with_bounds(4, 80).with_width(30),
        ColumnDescriptor::new("from", "From").with_bounds(4, 60).with_width(24),
        ColumnDescriptor::new("to", "To").with_bounds(4, 60).with_width(24),
        ColumnDescriptor::new("cc", "CC").with_bounds(4, 60).with_width(10),
        ColumnDescriptor::new("bcc", "BCC").with_bounds(4, 60).with_width(10),
        ColumnDescriptor::new("received", "Received").with_bounds(4, 40).with_width(20),
        ColumnDescriptor::new("size", "Size").with_bounds(4, 20).with_width(8),
        ColumnDescriptor::new("tag", "Tag").with_bounds(4, 40).with_width(12),
        ColumnDescriptor::new("bookmark", "Bookmarked").with_bounds(4, 20).with_width(12),
    ]
}

/// Which half of the view receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Pane {
    #[default]
    Table,
    Detail,
}

pub struct MessagesView {
    list: ListKind,
    records: Vec<Message>,
    table: TableState,
    table_view: TableView,
    selection: SelectionSet,
    focus: FocusedRow,
    bulk: BulkActions<Message>,
    menu: ActionMenu,
    tag_dialog: TagDialogView,
    detail: DetailPanel,
    pane: Pane,
    table_area: Rect,
    detail_area: Rect,
}

impl MessagesView {
    pub fn new(
        list: ListKind,
        remove_mode: RemoveMode,
        policy: ReconcilePolicy,
        page_size: usize,
        empty_message: &str,
    ) -> Self {
        Self {
            list,
            records: Vec::new(),
            table: TableState::with_page_size(message_columns(), page_size),
            table_view: TableView::with_empty_message(empty_message),
            selection: SelectionSet::new(),
            focus: FocusedRow::none(),
            bulk: BulkActions::new(remove_mode, policy),
            menu: ActionMenu::new(),
            tag_dialog: TagDialogView::new(),
            detail: DetailPanel::new(),
            pane: Pane::Table,
            table_area: Rect::default(),
            detail_area: Rect::default(),
        }
    }

    pub fn records(&self) -> &[Message] {
        &self.records
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn focused(&self) -> Option<&Message> {
        self.focus.resolve(&self.records)
    }

    /// Swap in a freshly fetched list.
    pub fn replace(&mut self, records: Vec<Message>) {
        self.records = records;
        self.table
            .replace_records(&self.records, &mut self.selection, &mut self.focus);
        self.detail.reset_scroll();
    }

    /// Whether keys must not be taken as global shortcuts.
    pub fn is_capturing(&self) -> bool {
        self.table_view.is_filtering()
            || self.menu.is_open()
            || self.bulk.tag_dialog() == TagDialog::Open
    }

    pub fn hints(&self) -> &'static str {
        if self.bulk.tag_dialog() == TagDialog::Open {
            "[Enter] apply tag  [Esc] cancel"
        } else if self.menu.is_open() {
            "[j/k] choose  [Enter] run  [Esc] close"
        } else if self.pane == Pane::Detail {
            "[h/l] tab  [j/k] scroll  [d/Esc] back to table"
        } else if self.table_view.is_filtering() {
            self.table_view.hints()
        } else {
            "[Space] check  [a] all  [m] actions  [Enter] open  [d] detail  [/] filter  [s] sort  [H/L] move col  [</>] width  [n/p] page"
        }
    }

    /// Drive the filter debounce.
    pub fn tick(&mut self, now: Instant) {
        if self.table.tick(&self.records, now) {
            debug!(list = ?self.list, "Filter applied");
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        if self.bulk.tag_dialog() == TagDialog::Open {
            return self.handle_tag_key(key);
        }
        if self.menu.is_open() {
            return match self.menu.handle_key(key) {
                MenuInput::Chosen(entry) => self.run(entry),
                MenuInput::Pending | MenuInput::Closed => Vec::new(),
            };
        }
        if self.pane == Pane::Detail {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('d')) {
                self.pane = Pane::Table;
            } else {
                self.detail.handle_key(key);
            }
            return Vec::new();
        }

        let input = self.table_view.handle_key(
            key,
            &mut self.table,
            &self.records,
            &mut self.selection,
            &mut self.focus,
            now,
        );
        match input {
            TableInput::Action(action) => self.table_action(action),
            TableInput::Handled => Vec::new(),
            TableInput::Ignored => {
                if key.code == KeyCode::Char('d') && key.modifiers.is_empty() {
                    self.pane = Pane::Detail;
                }
                Vec::new()
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Effect> {
        if self.bulk.tag_dialog() == TagDialog::Open {
            return Vec::new();
        }
        if self.menu.is_open() {
            return match self.menu.handle_mouse(mouse) {
                MenuInput::Chosen(entry) => self.run(entry),
                MenuInput::Pending | MenuInput::Closed => Vec::new(),
            };
        }

        if contains(self.detail_area, mouse) && self.detail.handle_mouse(mouse) {
            self.pane = Pane::Detail;
            return Vec::new();
        }

        let input = self.table_view.handle_mouse(
            mouse,
            &mut self.table,
            &self.records,
            &mut self.selection,
            &mut self.focus,
        );
        match input {
            TableInput::Action(action) => {
                self.pane = Pane::Table;
                self.table_action(action)
            }
            TableInput::Handled | TableInput::Ignored => Vec::new(),
        }
    }

    pub fn handle_paste(&mut self, text: &str, now: Instant) {
        if self.bulk.tag_dialog() == TagDialog::Open {
            self.tag_dialog.handle_paste(text);
        } else {
            self.table_view.handle_paste(text, &mut self.table, now);
        }
    }

    fn table_action(&mut self, action: TableAction) -> Vec<Effect> {
        match action {
            TableAction::RowActivated(id) => {
                debug!(%id, "Message focused");
                self.detail.reset_scroll();
            }
            TableAction::OpenMenu => self.menu.open(),
        }
        Vec::new()
    }

    fn handle_tag_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match self.tag_dialog.handle_key(key) {
            TagInput::Editing => Vec::new(),
            TagInput::Cancel => {
                self.bulk.cancel_tag();
                Vec::new()
            }
            TagInput::Submit(tag) => {
                match self
                    .bulk
                    .confirm_tag(&tag, &mut self.records, &self.selection)
                {
                    Ok(requests) => self.requests(requests),
                    Err(BulkError::EmptyTag) => {
                        self.tag_dialog.set_error(BulkError::EmptyTag.to_string());
                        Vec::new()
                    }
                    Err(e) => vec![Effect::warn(e.to_string())],
                }
            }
        }
    }

    // ========================================================================
    // Bulk actions
    // ========================================================================

    /// Run a menu entry against the live selection.
    pub fn run(&mut self, entry: MenuEntry) -> Vec<Effect> {
        let result = self
            .bulk
            .run(entry, &mut self.records, &mut self.selection);
        self.table.clamp(&self.records);

        match result {
            Ok(requests) if entry == MenuEntry::AddTag => {
                debug_assert!(requests.is_empty());
                self.tag_dialog.reset();
                Vec::new()
            }
            Ok(requests) => self.requests(requests),
            Err(e) => vec![Effect::warn(e.to_string())],
        }
    }

    fn requests(&self, requests: Vec<BulkRequest>) -> Vec<Effect> {
        if requests.is_empty() {
            return Vec::new();
        }
        vec![Effect::Run(Command::Bulk {
            list: self.list,
            requests,
        })]
    }

    /// Feed back a finished bulk request.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<String, RemoteFailure>,
    ) -> Vec<Effect> {
        let Completion {
            notice,
            redirect,
            reverted,
        } = self.bulk.complete(ticket, result, &mut self.records);
        if reverted > 0 {
            self.selection.retain_present(&self.records);
            self.table.clamp(&self.records);
        }

        let mut effects = Vec::new();
        match notice {
            Some(Notice::Success(message)) => effects.push(Effect::success(message)),
            Some(Notice::Error(message)) => effects.push(Effect::error(message)),
            None => {}
        }
        if reverted > 0 {
            effects.push(Effect::Notify(
                Level::Info,
                format!("Reverted {} local change(s).", reverted),
            ));
        }
        if let Some(redirect) = redirect {
            effects.push(Effect::Redirect(redirect));
        }
        effects
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    pub fn render(&mut self, frame: &mut Frame, area: Rect, title: &str, focused: bool) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        self.table_area = chunks[0];
        self.detail_area = chunks[1];

        self.table_view.render(
            frame,
            chunks[0],
            title,
            &self.table,
            &self.records,
            &self.selection,
            &self.focus,
            focused && self.pane == Pane::Table,
        );
        let message = self.focus.resolve(&self.records);
        self.detail
            .render(frame, chunks[1], message, focused && self.pane == Pane::Detail);

        self.menu.render(frame, chunks[0]);
        if self.bulk.tag_dialog() == TagDialog::Open {
            self.tag_dialog.render(frame, area);
        }
    }
}

fn contains(area: Rect, mouse: MouseEvent) -> bool {
    mouse.column >= area.x
        && mouse.column < area.right()
        && mouse.row >= area.y
        && mouse.row < area.bottom()
}
