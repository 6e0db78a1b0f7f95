//! Bulk actions over the checked rows of a table.
//!
//! A bulk action mutates the loaded records immediately and hands back the
//! remote requests that carry the same change to the backend. Completions of
//! those requests come back through [`BulkActions::complete`].

mod bulk;

pub use bulk::{
    BulkActions, BulkError, BulkKind, BulkRequest, Completion, MenuEntry, Notice, ReconcilePolicy,
    RemoveMode, TagDialog, Ticket, MENU_ENTRIES,
};

use crate::table::Record;

/// A record carrying the flags bulk actions toggle.
pub trait Annotated: Record {
    fn bookmarked(&self) -> bool;

    fn set_bookmarked(&mut self, bookmarked: bool);

    fn tag(&self) -> Option<&str>;

    fn set_tag(&mut self, tag: Option<String>);
}
