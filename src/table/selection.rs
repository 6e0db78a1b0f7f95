//! Checkbox selection and row focus.
//!
//! Both types are owned by the screen that owns the records. The table only
//! mutates them through the methods here, it never decides their lifetime.

use std::collections::BTreeSet;

use super::{Record, RowId};

/// Visual state of the select-all checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    /// Nothing selected.
    Unchecked,
    /// Some, but not all, records selected.
    Indeterminate,
    /// Every loaded record selected.
    Checked,
}

impl CheckState {
    /// Checkbox glyph for rendering.
    pub fn glyph(&self) -> &'static str {
        match self {
            CheckState::Unchecked => "[ ]",
            CheckState::Indeterminate => "[-]",
            CheckState::Checked => "[x]",
        }
    }
}

/// The set of checked row identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RowId>,
}

impl SelectionSet {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a row.
    pub fn insert(&mut self, id: impl Into<RowId>) {
        self.ids.insert(id.into());
    }

    /// Uncheck a row.
    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Flip the checkbox of a single row.
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Check whether a row is selected.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of selected rows.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Uncheck everything.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Iterate over the selected identifiers in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = &RowId> {
        self.ids.iter()
    }

    /// The selected identifiers as an owned list.
    pub fn to_vec(&self) -> Vec<RowId> {
        self.ids.iter().cloned().collect()
    }

    /// Tri-state of the select-all checkbox for a list of `total` records.
    ///
    /// An empty selection is always unchecked, even for an empty list.
    pub fn check_state(&self, total: usize) -> CheckState {
        if self.ids.is_empty() {
            CheckState::Unchecked
        } else if self.ids.len() >= total {
            CheckState::Checked
        } else {
            CheckState::Indeterminate
        }
    }

    /// Apply a click on the select-all checkbox.
    ///
    /// Clears the selection when it is checked or indeterminate, otherwise
    /// selects every loaded record (not only the visible page).
    pub fn toggle_all<R: Record>(&mut self, records: &[R]) {
        match self.check_state(records.len()) {
            CheckState::Checked | CheckState::Indeterminate => self.ids.clear(),
            CheckState::Unchecked => {
                self.ids = records.iter().map(Record::id).collect();
            }
        }
    }

    /// Drop identifiers that no longer belong to a loaded record.
    pub fn retain_present<R: Record>(&mut self, records: &[R]) {
        if self.ids.is_empty() {
            return;
        }
        let present: BTreeSet<RowId> = records.iter().map(Record::id).collect();
        self.ids.retain(|id| present.contains(id));
    }

    #[cfg(test)]
    /// Whether every selected identifier belongs to a loaded record.
    pub fn is_subset_of<R: Record>(&self, records: &[R]) -> bool {
        self.ids
            .iter()
            .all(|id| records.iter().any(|r| &r.id() == id))
    }
}

/// The single row whose details are shown in the side panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusedRow(Option<RowId>);

impl FocusedRow {
    /// No row focused.
    pub fn none() -> Self {
        Self(None)
    }

    /// Focus a row.
    pub fn set(&mut self, id: impl Into<RowId>) {
        self.0 = Some(id.into());
    }

    /// Drop the focus.
    pub fn clear(&mut self) {
        self.0 = None;
    }

    /// The focused identifier, if any.
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Whether `id` is the focused row.
    pub fn is(&self, id: &str) -> bool {
        self.0.as_deref() == Some(id)
    }

    /// Look up the focused record in `records`.
    pub fn resolve<'a, R: Record>(&self, records: &'a [R]) -> Option<&'a R> {
        let id = self.0.as_deref()?;
        records.iter().find(|r| r.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::Row;

    fn rows(n: usize) -> Vec<Row> {
        (0..n).map(|i| Row::new(i, "x", "y", "z")).collect()
    }

    #[test]
    fn test_check_state_transitions() {
        let records = rows(3);
        let mut selection = SelectionSet::new();
        assert_eq!(selection.check_state(records.len()), CheckState::Unchecked);

        selection.insert("row-1");
        assert_eq!(
            selection.check_state(records.len()),
            CheckState::Indeterminate
        );

        selection.insert("row-0");
        selection.insert("row-2");
        assert_eq!(selection.check_state(records.len()), CheckState::Checked);
    }

    #[test]
    fn test_empty_list_is_unchecked() {
        let selection = SelectionSet::new();
        assert_eq!(selection.check_state(0), CheckState::Unchecked);
    }

    #[test]
    fn test_toggle_all_selects_every_record() {
        let records = rows(25);
        let mut selection = SelectionSet::new();
        selection.toggle_all(&records);
        assert_eq!(selection.len(), 25);
    }

    #[test]
    fn test_toggle_all_clears_indeterminate() {
        let records = rows(4);
        let mut selection = SelectionSet::new();
        selection.insert("row-2");
        selection.toggle_all(&records);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle_all_twice_is_identity() {
        let records = rows(6);

        let mut empty = SelectionSet::new();
        empty.toggle_all(&records);
        empty.toggle_all(&records);
        assert_eq!(empty, SelectionSet::new());

        let mut full = SelectionSet::new();
        full.toggle_all(&records);
        let snapshot = full.clone();
        full.toggle_all(&records);
        full.toggle_all(&records);
        assert_eq!(full, snapshot);
    }

    #[test]
    fn test_toggle_single_row() {
        let mut selection = SelectionSet::new();
        selection.toggle("row-3");
        assert!(selection.contains("row-3"));
        selection.toggle("row-3");
        assert!(!selection.contains("row-3"));
    }

    #[test]
    fn test_retain_present_drops_stale_ids() {
        let mut records = rows(5);
        let mut selection = SelectionSet::new();
        selection.toggle_all(&records);
        records.truncate(2);

        selection.retain_present(&records);

        assert_eq!(selection.to_vec(), vec!["row-0", "row-1"]);
        assert!(selection.is_subset_of(&records));
    }

    #[test]
    fn test_focused_row_resolve() {
        let records = rows(3);
        let mut focus = FocusedRow::none();
        assert!(focus.resolve(&records).is_none());

        focus.set("row-2");
        assert!(focus.is("row-2"));
        assert_eq!(focus.resolve(&records).map(|r| r.id()), Some("row-2".into()));

        focus.clear();
        assert_eq!(focus.get(), None);
    }
}
