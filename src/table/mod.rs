//! Headless state of the selectable, sortable, filterable table.
//!
//! The table never owns its records. Screens hand in a slice of records on
//! every call together with the [`SelectionSet`] and [`FocusedRow`] they own,
//! and the table computes the visible page, mutates selection and focus
//! through those references, and reports gestures back as [`TableAction`]s.
//!
//! Rendering and input mapping live in `ui::components::table`.

mod column;
mod filter;
mod pagination;
mod selection;
mod sort;

use std::collections::HashMap;
use std::time::Instant;

pub use column::{reorder, ColumnDescriptor, ColumnOrder, DragUpdate};
pub use filter::{Debouncer, GlobalFilter, FILTER_DEBOUNCE};
pub use pagination::{Pagination, DEFAULT_PAGE_SIZE, PAGE_SIZES};
pub use selection::{CheckState, FocusedRow, SelectionSet};
pub use sort::{compare_values, SortDirection, SortState};

/// Stable identity of a record.
pub type RowId = String;

/// One displayable, selectable item.
pub trait Record {
    /// Stable identity, unique within a list.
    fn id(&self) -> RowId;

    /// Display value for the column `key`. Unknown keys yield an empty string.
    fn cell(&self, key: &str) -> String;
}

/// Gestures the owning screen has to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    /// A row was clicked or activated; it is now the focused row.
    RowActivated(RowId),
    /// The bulk-action menu was requested.
    OpenMenu,
}

/// View state of one table instance.
#[derive(Debug, Clone)]
pub struct TableState {
    columns: Vec<ColumnDescriptor>,
    order: ColumnOrder,
    widths: HashMap<String, u16>,
    sort: SortState,
    filter: GlobalFilter,
    pagination: Pagination,
    /// Row cursor within the current page.
    cursor: usize,
    /// Display position of the keyboard-focused column.
    column_cursor: usize,
    /// Order captured when a column drag began.
    drag_snapshot: Option<ColumnOrder>,
}

impl TableState {
    /// Create a table for the given columns.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self::with_page_size(columns, DEFAULT_PAGE_SIZE)
    }

    /// Create a table with an initial page size.
    pub fn with_page_size(columns: Vec<ColumnDescriptor>, page_size: usize) -> Self {
        let order = ColumnOrder::from_columns(&columns);
        let widths = columns.iter().map(|c| (c.key.clone(), c.width)).collect();
        Self {
            columns,
            order,
            widths,
            sort: SortState::new(),
            filter: GlobalFilter::new(),
            pagination: Pagination::new(page_size),
            cursor: 0,
            column_cursor: 0,
            drag_snapshot: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Column descriptors in declaration order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Current display order of the column keys.
    pub fn order(&self) -> &ColumnOrder {
        &self.order
    }

    /// Active sort column and direction.
    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    /// Global filter, typed and applied text.
    pub fn filter(&self) -> &GlobalFilter {
        &self.filter
    }

    /// Page size and index.
    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Row cursor within the current page.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Display position of the keyboard-focused column.
    pub fn column_cursor(&self) -> usize {
        self.column_cursor
    }

    /// Descriptor for `key`.
    pub fn column(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Columns in display order.
    pub fn ordered_columns(&self) -> Vec<&ColumnDescriptor> {
        self.order
            .keys()
            .iter()
            .filter_map(|k| self.column(k))
            .collect()
    }

    /// Current width of `key`.
    pub fn width(&self, key: &str) -> u16 {
        self.widths
            .get(key)
            .copied()
            .or_else(|| self.column(key).map(|c| c.width))
            .unwrap_or(column::DEFAULT_WIDTH)
    }

    // ------------------------------------------------------------------
    // Row pipeline
    // ------------------------------------------------------------------

    /// Positions into `records` that pass the filter, in sorted order.
    pub fn visible_indices<R: Record>(&self, records: &[R]) -> Vec<usize> {
        let mut indices: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.filter.matches(*r, &self.columns))
            .map(|(i, _)| i)
            .collect();
        self.sort.apply(records, &mut indices);
        indices
    }

    /// Positions into `records` shown on the current page.
    pub fn page_indices<R: Record>(&self, records: &[R]) -> Vec<usize> {
        let visible = self.visible_indices(records);
        let range = self.pagination.page_range(visible.len());
        visible[range].to_vec()
    }

    /// Page count for the filtered rows.
    pub fn page_count<R: Record>(&self, records: &[R]) -> usize {
        self.pagination.page_count(self.visible_indices(records).len())
    }

    /// Number of rows passing the filter.
    pub fn visible_count<R: Record>(&self, records: &[R]) -> usize {
        self.visible_indices(records).len()
    }

    /// Re-clamp page index and cursor after anything changed the row count.
    pub fn clamp<R: Record>(&mut self, records: &[R]) {
        let total = self.visible_count(records);
        self.pagination.clamp(total);
        let on_page = self.pagination.page_range(total).len();
        self.cursor = self.cursor.min(on_page.saturating_sub(1));
    }

    /// Called when the screen swapped in a new record list.
    ///
    /// Focus is cleared, stale selections dropped and the page re-clamped.
    pub fn replace_records<R: Record>(
        &mut self,
        records: &[R],
        selection: &mut SelectionSet,
        focus: &mut FocusedRow,
    ) {
        focus.clear();
        selection.retain_present(records);
        self.clamp(records);
    }

    // ------------------------------------------------------------------
    // Sorting and filtering
    // ------------------------------------------------------------------

    /// Advance the sort cycle of `key`.
    pub fn toggle_sort(&mut self, key: &str) {
        if self.column(key).is_some() {
            self.sort.toggle(key);
        }
    }

    /// Advance the sort cycle of the keyboard-focused column.
    pub fn toggle_sort_at_cursor(&mut self) {
        if let Some(key) = self.order.key_at(self.column_cursor).map(str::to_string) {
            self.toggle_sort(&key);
        }
    }

    /// Mutable access to the typed filter text.
    pub fn filter_mut(&mut self) -> &mut GlobalFilter {
        &mut self.filter
    }

    /// Drive the filter debounce. Returns `true` when rows changed.
    pub fn tick<R: Record>(&mut self, records: &[R], now: Instant) -> bool {
        if self.filter.tick(now) {
            self.pagination.reset();
            self.cursor = 0;
            self.clamp(records);
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    /// Jump to the first page and reset the row cursor.
    pub fn first_page(&mut self) {
        self.pagination.first();
        self.cursor = 0;
    }

    /// Go back one page; stays on the first page.
    pub fn previous_page(&mut self) {
        self.pagination.previous();
        self.cursor = 0;
    }

    /// Advance one page; stays on the last page.
    pub fn next_page<R: Record>(&mut self, records: &[R]) {
        self.pagination.next(self.visible_count(records));
        self.cursor = 0;
    }

    /// Jump to the last page of the filtered rows.
    pub fn last_page<R: Record>(&mut self, records: &[R]) {
        self.pagination.last(self.visible_count(records));
        self.cursor = 0;
    }

    /// Switch to a page size from [`PAGE_SIZES`].
    pub fn set_page_size<R: Record>(&mut self, records: &[R], page_size: usize) -> bool {
        let changed = self
            .pagination
            .set_page_size(page_size, self.visible_count(records));
        self.clamp(records);
        changed
    }

    /// Step through [`PAGE_SIZES`].
    pub fn cycle_page_size<R: Record>(&mut self, records: &[R], forward: bool) {
        self.pagination
            .cycle_page_size(forward, self.visible_count(records));
        self.clamp(records);
    }

    // ------------------------------------------------------------------
    // Columns
    // ------------------------------------------------------------------

    /// Grow or shrink `key` by `delta` cells within its bounds.
    pub fn resize(&mut self, key: &str, delta: i32) {
        let Some(column) = self.column(key) else {
            return;
        };
        let width = column.clamp_width(self.width(key) as i32 + delta);
        self.widths.insert(key.to_string(), width);
    }

    /// Resize the keyboard-focused column.
    pub fn resize_at_cursor(&mut self, delta: i32) {
        if let Some(key) = self.order.key_at(self.column_cursor).map(str::to_string) {
            self.resize(&key, delta);
        }
    }

    /// Move the keyboard column cursor.
    pub fn move_column_cursor(&mut self, delta: isize) {
        if self.order.is_empty() {
            return;
        }
        let last = self.order.len() as isize - 1;
        self.column_cursor = (self.column_cursor as isize + delta).clamp(0, last) as usize;
    }

    /// Capture the order a drag gesture starts from.
    pub fn begin_drag(&mut self) {
        self.drag_snapshot = Some(self.order.clone());
    }

    /// Apply one drag step, committing the order immediately.
    ///
    /// A step outside any valid target keeps the current live order.
    pub fn update_drag(&mut self, update: &DragUpdate) {
        if update.destination_index.is_none() {
            return;
        }
        let snapshot = self.drag_snapshot.get_or_insert_with(|| self.order.clone());
        self.order = reorder(snapshot, update);
    }

    /// Finish a drag gesture.
    pub fn end_drag(&mut self) {
        self.drag_snapshot = None;
    }

    #[cfg(test)]
    /// Whether a column drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag_snapshot.is_some()
    }

    /// Move the keyboard-focused column one slot left or right.
    ///
    /// Runs as a one-step drag so it follows the same rules as mouse drags.
    pub fn move_column_at_cursor(&mut self, delta: isize) {
        let Some(key) = self.order.key_at(self.column_cursor).map(str::to_string) else {
            return;
        };
        let source = self.column_cursor;
        let destination = source as isize + delta;
        let destination = if destination < 0 || destination >= self.order.len() as isize {
            None
        } else {
            Some(destination as usize)
        };

        self.begin_drag();
        self.update_drag(&DragUpdate::new(key.clone(), source, destination));
        self.end_drag();

        if let Some(position) = self.order.position(&key) {
            self.column_cursor = position;
        }
    }

    // ------------------------------------------------------------------
    // Rows, selection and focus
    // ------------------------------------------------------------------

    /// Move the row cursor down, stopping at the last row of the page.
    pub fn cursor_down<R: Record>(&mut self, records: &[R]) {
        let on_page = self.page_indices(records).len();
        if on_page > 0 && self.cursor + 1 < on_page {
            self.cursor += 1;
        }
    }

    /// Move the row cursor up, stopping at the first row.
    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Place the cursor on a page row.
    pub fn set_cursor<R: Record>(&mut self, records: &[R], row: usize) {
        let on_page = self.page_indices(records).len();
        if row < on_page {
            self.cursor = row;
        }
    }

    /// Identity of the record under the cursor.
    pub fn cursor_id<R: Record>(&self, records: &[R]) -> Option<RowId> {
        self.page_indices(records)
            .get(self.cursor)
            .map(|&i| records[i].id())
    }

    /// Focus the cursor row, as a row click does.
    pub fn activate<R: Record>(
        &mut self,
        records: &[R],
        focus: &mut FocusedRow,
    ) -> Option<TableAction> {
        let id = self.cursor_id(records)?;
        focus.set(id.clone());
        Some(TableAction::RowActivated(id))
    }

    /// Toggle the checkbox of the cursor row.
    pub fn toggle_cursor_selection<R: Record>(
        &mut self,
        records: &[R],
        selection: &mut SelectionSet,
    ) {
        if let Some(id) = self.cursor_id(records) {
            selection.toggle(&id);
        }
    }

    /// Click on the select-all checkbox.
    pub fn toggle_select_all<R: Record>(&mut self, records: &[R], selection: &mut SelectionSet) {
        selection.toggle_all(records);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal record used across the table tests.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Row {
        pub index: usize,
        pub name: String,
        pub email: String,
        pub note: String,
    }

    impl Row {
        pub fn new(index: usize, name: &str, email: &str, note: &str) -> Self {
            Self {
                index,
                name: name.to_string(),
                email: email.to_string(),
                note: note.to_string(),
            }
        }
    }

    impl Record for Row {
        fn id(&self) -> RowId {
            format!("row-{}", self.index)
        }

        fn cell(&self, key: &str) -> String {
            match key {
                "name" => self.name.clone(),
                "email" => self.email.clone(),
                "note" => self.note.clone(),
                "index" => self.index.to_string(),
                _ => String::new(),
            }
        }
    }

    pub fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("name", "Name").with_bounds(4, 40),
            ColumnDescriptor::new("email", "Email"),
            ColumnDescriptor::new("note", "Note"),
        ]
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| Row::new(i, &format!("user {i}"), &format!("u{i}@example.com"), ""))
            .collect()
    }

    #[test]
    fn test_page_indices_follow_pagination() {
        let records = rows(25);
        let mut table = TableState::new(columns());
        assert_eq!(table.page_count(&records), 3);
        assert_eq!(table.page_indices(&records), (0..10).collect::<Vec<_>>());
        table.last_page(&records);
        assert_eq!(table.page_indices(&records), (20..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_select_all_then_drop_rows_scenario() {
        let mut records = rows(25);
        let mut table = TableState::new(columns());
        let mut selection = SelectionSet::new();
        let mut focus = FocusedRow::none();

        table.toggle_select_all(&records, &mut selection);
        assert_eq!(selection.len(), 25);

        table.last_page(&records);
        records.drain(20..25);
        selection.clear();
        table.replace_records(&records, &mut selection, &mut focus);

        assert_eq!(records.len(), 20);
        assert!(selection.is_empty());
        assert_eq!(table.page_count(&records), 2);
        assert_eq!(table.pagination().page_index(), 1);
    }

    #[test]
    fn test_table_operations_keep_selection_subset() {
        let records = rows(12);
        let mut table = TableState::new(columns());
        let mut selection = SelectionSet::new();
        selection.insert("row-3");
        selection.insert("row-11");
        let start = Instant::now();

        table.resize("name", 5);
        assert!(selection.is_subset_of(&records));
        table.move_column_at_cursor(1);
        assert!(selection.is_subset_of(&records));
        table.toggle_sort("email");
        assert!(selection.is_subset_of(&records));
        table.filter_mut().set_input("user 1", start);
        table.tick(&records, start + FILTER_DEBOUNCE);
        assert!(selection.is_subset_of(&records));
        table.next_page(&records);
        assert!(selection.is_subset_of(&records));
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_filter_resets_to_first_page() {
        let records = rows(25);
        let mut table = TableState::new(columns());
        let start = Instant::now();
        table.last_page(&records);

        table.filter_mut().set_input("user 2", start);
        assert!(!table.tick(&records, start));
        assert_eq!(table.pagination().page_index(), 2);

        assert!(table.tick(&records, start + FILTER_DEBOUNCE));
        assert_eq!(table.pagination().page_index(), 0);
        // "user 2" and "user 20".."user 24"
        assert_eq!(table.visible_count(&records), 6);
    }

    #[test]
    fn test_resize_respects_bounds() {
        let mut table = TableState::new(columns());
        table.resize("name", 100);
        assert_eq!(table.width("name"), 40);
        table.resize("name", -100);
        assert_eq!(table.width("name"), 4);
        table.resize("missing", 3);
        assert_eq!(table.width("email"), column::DEFAULT_WIDTH);
    }

    #[test]
    fn test_live_drag_commits_each_update() {
        let mut table = TableState::new(columns());
        table.begin_drag();
        table.update_drag(&DragUpdate::new("name", 0, Some(1)));
        assert_eq!(table.order().keys(), ["email", "name", "note"]);
        table.update_drag(&DragUpdate::new("name", 0, Some(2)));
        assert_eq!(table.order().keys(), ["email", "note", "name"]);
        table.update_drag(&DragUpdate::new("name", 0, None));
        assert_eq!(table.order().keys(), ["email", "note", "name"]);
        table.end_drag();
        assert!(!table.is_dragging());
        assert!(table.order().is_permutation_of(table.columns()));
    }

    #[test]
    fn test_move_column_at_edge_is_noop() {
        let mut table = TableState::new(columns());
        table.move_column_at_cursor(-1);
        assert_eq!(table.order().keys(), ["name", "email", "note"]);
        table.move_column_at_cursor(1);
        assert_eq!(table.order().keys(), ["email", "name", "note"]);
        assert_eq!(table.column_cursor(), 1);
    }

    #[test]
    fn test_activate_sets_focus_and_reports_row() {
        let records = rows(3);
        let mut table = TableState::new(columns());
        let mut focus = FocusedRow::none();
        table.cursor_down(&records);

        let action = table.activate(&records, &mut focus);

        assert_eq!(action, Some(TableAction::RowActivated("row-1".into())));
        assert!(focus.is("row-1"));
    }

    #[test]
    fn test_activate_on_empty_list() {
        let records: Vec<Row> = Vec::new();
        let mut table = TableState::new(columns());
        let mut focus = FocusedRow::none();
        assert_eq!(table.activate(&records, &mut focus), None);
        assert_eq!(focus.get(), None);
    }

    #[test]
    fn test_replace_records_clears_focus() {
        let records = rows(3);
        let mut table = TableState::new(columns());
        let mut selection = SelectionSet::new();
        let mut focus = FocusedRow::none();
        focus.set("row-0");
        selection.insert("row-9");

        table.replace_records(&records, &mut selection, &mut focus);

        assert_eq!(focus.get(), None);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_sort_by_cursor_column() {
        let records = vec![Row::new(0, "b", "", ""), Row::new(1, "a", "", "")];
        let mut table = TableState::new(columns());
        table.toggle_sort_at_cursor();
        assert_eq!(table.page_indices(&records), vec![1, 0]);
    }
}
