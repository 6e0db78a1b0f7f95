//! Bookmark and tag mutations applied to the checked rows.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::Annotated;
use crate::api::{AuthRedirect, RemoteFailure};
use crate::table::{RowId, SelectionSet};

// ============================================================================
// Configuration
// ============================================================================

/// What "remove bookmark" does to the local list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoveMode {
    /// Keep the row and clear its flag.
    #[default]
    ClearFlag,
    /// Drop the row from the list (bookmark views).
    DropRow,
}

/// How local changes react to a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilePolicy {
    /// Keep the optimistic change; the next refresh shows the server state.
    #[default]
    Keep,
    /// Undo the optimistic change when its request fails.
    Revert,
}

// ============================================================================
// Menu
// ============================================================================

/// Bulk operation kinds. Each kind has its own in-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkKind {
    AddBookmarks,
    RemoveBookmarks,
    AddTag,
}

impl fmt::Display for BulkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BulkKind::AddBookmarks => "Adding bookmarks",
            BulkKind::RemoveBookmarks => "Removing bookmarks",
            BulkKind::AddTag => "Tagging",
        };
        f.write_str(name)
    }
}

/// Entries of the bulk-action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    AddBookmarks,
    RemoveBookmarks,
    AddTag,
    RemoveTag,
}

/// Menu entries in display order.
pub const MENU_ENTRIES: [MenuEntry; 4] = [
    MenuEntry::AddBookmarks,
    MenuEntry::RemoveBookmarks,
    MenuEntry::AddTag,
    MenuEntry::RemoveTag,
];

impl MenuEntry {
    /// Submenu heading.
    pub fn group(&self) -> &'static str {
        match self {
            MenuEntry::AddBookmarks | MenuEntry::RemoveBookmarks => "Bookmark",
            MenuEntry::AddTag | MenuEntry::RemoveTag => "Tag",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuEntry::AddBookmarks | MenuEntry::AddTag => "Add checked rows",
            MenuEntry::RemoveBookmarks | MenuEntry::RemoveTag => "Remove checked rows",
        }
    }
}

// ============================================================================
// Requests and outcomes
// ============================================================================

/// Correlates a remote request with its local change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

/// A remote call produced by a bulk action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkRequest {
    /// `POST /bookmarks` with the whole batch.
    AddBookmarks { ticket: Ticket, ids: Vec<RowId> },
    /// `DELETE /bookmark/{id}`, one per row.
    RemoveBookmark { ticket: Ticket, id: RowId },
    /// `POST /tag` with the whole batch.
    AddTag {
        ticket: Ticket,
        ids: Vec<RowId>,
        tag: String,
    },
}

impl BulkRequest {
    pub fn ticket(&self) -> Ticket {
        match self {
            BulkRequest::AddBookmarks { ticket, .. }
            | BulkRequest::RemoveBookmark { ticket, .. }
            | BulkRequest::AddTag { ticket, .. } => *ticket,
        }
    }
}

/// Why a bulk action was refused. Nothing changed locally or remotely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkError {
    #[error("No messages selected.")]
    EmptySelection,

    #[error("Please enter a tag.")]
    EmptyTag,

    #[error("{0} is already in progress.")]
    InFlight(BulkKind),

    #[error("{0} is not supported yet.")]
    Unsupported(&'static str),
}

/// A user-facing notification produced by a bulk action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Result of feeding a remote completion back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    pub notice: Option<Notice>,
    /// Set when the failure calls for the sign-in flow instead of a notice.
    pub redirect: Option<AuthRedirect>,
    /// Number of local changes that were undone.
    pub reverted: usize,
}

/// Tag-entry dialog state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagDialog {
    #[default]
    Closed,
    Open,
}

/// Undo information for one optimistic change.
#[derive(Debug, Clone)]
enum Undo<R> {
    Bookmark { id: RowId, was: bool },
    Tag { id: RowId, was: Option<String> },
    /// `order` is the list as it was before the drop; `index` is the row's
    /// slot in it.
    Dropped {
        index: usize,
        order: Arc<[RowId]>,
        record: R,
    },
}

#[derive(Debug, Clone)]
struct Pending<R> {
    kind: BulkKind,
    count: usize,
    undo: Vec<Undo<R>>,
}

// ============================================================================
// BulkActions
// ============================================================================

/// Bulk-action controller for one record list.
#[derive(Debug, Clone)]
pub struct BulkActions<R> {
    remove_mode: RemoveMode,
    policy: ReconcilePolicy,
    pending: HashMap<Ticket, Pending<R>>,
    next_ticket: u64,
    tag_dialog: TagDialog,
}

impl<R: Annotated + Clone> BulkActions<R> {
    pub fn new(remove_mode: RemoveMode, policy: ReconcilePolicy) -> Self {
        Self {
            remove_mode,
            policy,
            pending: HashMap::new(),
            next_ticket: 0,
            tag_dialog: TagDialog::Closed,
        }
    }

    pub fn remove_mode(&self) -> RemoveMode {
        self.remove_mode
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    pub fn tag_dialog(&self) -> TagDialog {
        self.tag_dialog
    }

    /// Whether requests of `kind` are still outstanding.
    pub fn is_in_flight(&self, kind: BulkKind) -> bool {
        self.pending.values().any(|p| p.kind == kind)
    }

    #[cfg(test)]
    /// Number of outstanding requests.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Dispatch a menu entry. `AddTag` opens the dialog and yields no request.
    pub fn run(
        &mut self,
        entry: MenuEntry,
        records: &mut Vec<R>,
        selection: &mut SelectionSet,
    ) -> Result<Vec<BulkRequest>, BulkError> {
        match entry {
            MenuEntry::AddBookmarks => self.add_bookmarks(records, selection),
            MenuEntry::RemoveBookmarks => self.remove_bookmarks(records, selection),
            MenuEntry::AddTag => self.request_add_tag(selection).map(|()| Vec::new()),
            MenuEntry::RemoveTag => self.remove_tags(selection),
        }
    }

    /// Flag every checked record as bookmarked and batch one request.
    pub fn add_bookmarks(
        &mut self,
        records: &mut [R],
        selection: &SelectionSet,
    ) -> Result<Vec<BulkRequest>, BulkError> {
        self.guard(BulkKind::AddBookmarks, selection)?;

        let mut ids = Vec::new();
        let mut undo = Vec::new();
        for record in records.iter_mut().filter(|r| selection.contains(&r.id())) {
            let id = record.id();
            undo.push(Undo::Bookmark {
                id: id.clone(),
                was: record.bookmarked(),
            });
            record.set_bookmarked(true);
            ids.push(id);
        }

        let ticket = self.track(BulkKind::AddBookmarks, ids.len(), undo);
        info!(count = ids.len(), "Adding bookmarks");
        Ok(vec![BulkRequest::AddBookmarks { ticket, ids }])
    }

    /// Unflag or drop every checked record, clear the selection, and issue one
    /// delete per record.
    pub fn remove_bookmarks(
        &mut self,
        records: &mut Vec<R>,
        selection: &mut SelectionSet,
    ) -> Result<Vec<BulkRequest>, BulkError> {
        self.guard(BulkKind::RemoveBookmarks, selection)?;

        let mut changes: Vec<(RowId, Undo<R>)> = Vec::new();
        match self.remove_mode {
            RemoveMode::ClearFlag => {
                for record in records.iter_mut().filter(|r| selection.contains(&r.id())) {
                    let id = record.id();
                    changes.push((
                        id.clone(),
                        Undo::Bookmark {
                            id,
                            was: record.bookmarked(),
                        },
                    ));
                    record.set_bookmarked(false);
                }
            }
            RemoveMode::DropRow => {
                let order: Arc<[RowId]> = records.iter().map(|r| r.id()).collect();
                let mut kept = Vec::with_capacity(records.len());
                for (index, record) in records.drain(..).enumerate() {
                    let id = record.id();
                    if selection.contains(&id) {
                        let order = Arc::clone(&order);
                        changes.push((id, Undo::Dropped { index, order, record }));
                    } else {
                        kept.push(record);
                    }
                }
                *records = kept;
            }
        }
        selection.clear();

        info!(count = changes.len(), mode = ?self.remove_mode, "Removing bookmarks");
        let requests = changes
            .into_iter()
            .map(|(id, undo)| {
                let ticket = self.track(BulkKind::RemoveBookmarks, 1, vec![undo]);
                BulkRequest::RemoveBookmark { ticket, id }
            })
            .collect();
        Ok(requests)
    }

    /// Open the tag dialog, or refuse when nothing is checked.
    pub fn request_add_tag(&mut self, selection: &SelectionSet) -> Result<(), BulkError> {
        self.guard(BulkKind::AddTag, selection)?;
        self.tag_dialog = TagDialog::Open;
        Ok(())
    }

    /// Close the tag dialog without changes.
    pub fn cancel_tag(&mut self) {
        self.tag_dialog = TagDialog::Closed;
    }

    /// Apply `tag` to every checked record and batch one request.
    ///
    /// An empty tag keeps the dialog open. The selection is read now, not
    /// when the dialog opened.
    pub fn confirm_tag(
        &mut self,
        tag: &str,
        records: &mut [R],
        selection: &SelectionSet,
    ) -> Result<Vec<BulkRequest>, BulkError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(BulkError::EmptyTag);
        }
        self.tag_dialog = TagDialog::Closed;
        self.guard(BulkKind::AddTag, selection)?;

        let mut ids = Vec::new();
        let mut undo = Vec::new();
        for record in records.iter_mut().filter(|r| selection.contains(&r.id())) {
            let id = record.id();
            undo.push(Undo::Tag {
                id: id.clone(),
                was: record.tag().map(str::to_string),
            });
            record.set_tag(Some(tag.to_string()));
            ids.push(id);
        }

        let ticket = self.track(BulkKind::AddTag, ids.len(), undo);
        info!(count = ids.len(), tag = %tag, "Tagging messages");
        Ok(vec![BulkRequest::AddTag {
            ticket,
            ids,
            tag: tag.to_string(),
        }])
    }

    /// Tag removal has no backend operation.
    pub fn remove_tags(&self, _selection: &SelectionSet) -> Result<Vec<BulkRequest>, BulkError> {
        Err(BulkError::Unsupported("Removing tags"))
    }

    /// Feed back the outcome of a request.
    ///
    /// Unknown tickets (for example after the list was reloaded) produce an
    /// empty completion.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<String, RemoteFailure>,
        records: &mut Vec<R>,
    ) -> Completion {
        let Some(pending) = self.pending.remove(&ticket) else {
            debug!(?ticket, "Completion for unknown ticket");
            return Completion::default();
        };

        match result {
            Ok(_) => Completion {
                notice: Some(Notice::Success(success_message(pending.kind, pending.count))),
                ..Completion::default()
            },
            Err(failure) => {
                warn!(kind = ?pending.kind, "Bulk request failed: {}", failure.message);
                let reverted = match self.policy {
                    ReconcilePolicy::Keep => 0,
                    ReconcilePolicy::Revert => revert(records, pending.undo),
                };
                match failure.redirect() {
                    Some(redirect) => Completion {
                        notice: None,
                        redirect: Some(redirect),
                        reverted,
                    },
                    None => Completion {
                        notice: Some(Notice::Error(failure.user_message())),
                        redirect: None,
                        reverted,
                    },
                }
            }
        }
    }

    /// Forget outstanding requests, e.g. when the list is reloaded.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.tag_dialog = TagDialog::Closed;
    }

    fn guard(&self, kind: BulkKind, selection: &SelectionSet) -> Result<(), BulkError> {
        if selection.is_empty() {
            return Err(BulkError::EmptySelection);
        }
        if self.is_in_flight(kind) {
            return Err(BulkError::InFlight(kind));
        }
        Ok(())
    }

    fn track(&mut self, kind: BulkKind, count: usize, undo: Vec<Undo<R>>) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        let undo = match self.policy {
            ReconcilePolicy::Keep => Vec::new(),
            ReconcilePolicy::Revert => undo,
        };
        self.pending.insert(ticket, Pending { kind, count, undo });
        ticket
    }
}

fn success_message(kind: BulkKind, count: usize) -> String {
    match kind {
        BulkKind::AddBookmarks => format!("Added {} bookmarks.", count),
        BulkKind::RemoveBookmarks => "Removed bookmark.".to_string(),
        BulkKind::AddTag => format!("Added tag to {} messages.", count),
    }
}

/// Undo optimistic changes. Returns how many were applied.
fn revert<R: Annotated>(records: &mut Vec<R>, undo: Vec<Undo<R>>) -> usize {
    let mut applied = 0;
    for change in undo {
        match change {
            Undo::Bookmark { id, was } => {
                if let Some(record) = records.iter_mut().find(|r| r.id() == id) {
                    record.set_bookmarked(was);
                    applied += 1;
                }
            }
            Undo::Tag { id, was } => {
                if let Some(record) = records.iter_mut().find(|r| r.id() == id) {
                    record.set_tag(was);
                    applied += 1;
                }
            }
            Undo::Dropped {
                index,
                order,
                record,
            } => {
                let id = record.id();
                if !records.iter().any(|r| r.id() == id) {
                    let slot = restore_slot(records, &order[..index]);
                    records.insert(slot, record);
                    applied += 1;
                }
            }
        }
    }
    applied
}

/// Slot right after the last present row that preceded the dropped one.
///
/// Failures complete in any order, so the slot is derived from the rows that
/// are back in the list rather than from the original index.
fn restore_slot<R: Annotated>(records: &[R], preceding: &[RowId]) -> usize {
    let preceding: HashSet<&RowId> = preceding.iter().collect();
    records
        .iter()
        .rposition(|r| preceding.contains(&r.id()))
        .map_or(0, |i| i + 1)
}
