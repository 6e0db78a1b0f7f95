//! Rendering and input mapping for [`TableState`].
//!
//! The layout inside the border is, top to bottom: a toolbar with the
//! select-all checkbox and the "Actions" trigger, the column header, the rows
//! of the current page, and a footer with pagination and the filter line.
//! The geometry of the last render is kept so mouse events can be hit-tested
//! against it.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::table::{DragUpdate, FocusedRow, Record, SelectionSet, TableAction, TableState};
use crate::ui::theme::THEME;

/// Cells taken by the row checkbox, including the gap after it.
const CHECK_WIDTH: u16 = 4;

const SELECT_ALL_LABEL: &str = " Select all";
const ACTIONS_TRIGGER: &str = "[ Actions ▾ ]";

/// Cells a keyboard resize step grows or shrinks a column by.
const RESIZE_STEP: i32 = 2;

/// What an input did to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableInput {
    /// Not a table key; the screen may use it.
    Ignored,
    /// Consumed without anything for the screen to do.
    Handled,
    /// The screen has to react.
    Action(TableAction),
}

/// Horizontal extent of a rendered column.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnSpan {
    key: String,
    x: u16,
    width: u16,
}

/// Where everything was drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Geometry {
    inner: Rect,
    toolbar_y: u16,
    header_y: u16,
    first_row_y: u16,
    row_capacity: u16,
    /// x-range of the select-all checkbox and its label.
    select_all: (u16, u16),
    /// x-range of the "Actions" trigger when shown.
    trigger: Option<(u16, u16)>,
    columns: Vec<ColumnSpan>,
}

impl Geometry {
    fn compute(area: Rect, state: &TableState, show_trigger: bool) -> Self {
        let inner = Rect {
            x: area.x.saturating_add(1),
            y: area.y.saturating_add(1),
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(2),
        };

        let select_all_end = inner.x + 3 + SELECT_ALL_LABEL.chars().count() as u16;
        let trigger = show_trigger.then(|| {
            let start = select_all_end + 2;
            (start, start + ACTIONS_TRIGGER.chars().count() as u16)
        });

        let mut columns = Vec::new();
        let mut x = inner.x + CHECK_WIDTH;
        for column in state.ordered_columns() {
            if x >= inner.right() {
                break;
            }
            let width = state.width(&column.key).min(inner.right() - x);
            columns.push(ColumnSpan {
                key: column.key.clone(),
                x,
                width,
            });
            x = x.saturating_add(width + 1);
        }

        // Toolbar, header and footer take three lines.
        let row_capacity = inner.height.saturating_sub(3);
        Self {
            inner,
            toolbar_y: inner.y,
            header_y: inner.y + 1,
            first_row_y: inner.y + 2,
            row_capacity,
            select_all: (inner.x, select_all_end),
            trigger,
            columns,
        }
    }

    fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.inner.x
            && column < self.inner.right()
            && row >= self.inner.y
            && row < self.inner.bottom()
    }

    fn column_at(&self, x: u16) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| x >= c.x && x < c.x + c.width)
    }

    /// Column whose right-hand separator cell is at `x`.
    fn separator_at(&self, x: u16) -> Option<usize> {
        self.columns.iter().position(|c| x == c.x + c.width)
    }

    fn row_at(&self, y: u16) -> Option<usize> {
        (y >= self.first_row_y && y < self.first_row_y + self.row_capacity)
            .then(|| (y - self.first_row_y) as usize)
    }
}

/// A mouse gesture started on the header.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Gesture {
    /// Dragging a column; a release without movement sorts it instead.
    Reorder {
        key: String,
        source: usize,
        moved: bool,
    },
    /// Dragging a column's right edge.
    Resize { key: String, last_x: u16 },
}

/// Stateful renderer for one table instance.
#[derive(Debug, Clone, Default)]
pub struct TableView {
    filtering: bool,
    empty_message: String,
    geometry: Option<Geometry>,
    gesture: Option<Gesture>,
}

impl TableView {
    pub fn new() -> Self {
        Self::with_empty_message("No rows.")
    }

    /// Text shown in place of rows when nothing is visible.
    pub fn with_empty_message(message: impl Into<String>) -> Self {
        Self {
            empty_message: message.into(),
            ..Self::default()
        }
    }

    /// Whether keystrokes currently go to the filter line.
    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    /// Key hints for the help bar.
    pub fn hints(&self) -> &'static str {
        if self.filtering {
            "[Enter] done  [Esc] clear filter"
        } else {
            "[Space] check  [a] all  [Enter] open  [m] actions  [s] sort  [/] filter  [H/L] move col  [</>] width  [n/p] page  [+/-] page size"
        }
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    /// Map a key press onto the table.
    pub fn handle_key<R: Record>(
        &mut self,
        key: KeyEvent,
        state: &mut TableState,
        records: &[R],
        selection: &mut SelectionSet,
        focus: &mut FocusedRow,
        now: Instant,
    ) -> TableInput {
        if self.filtering {
            return self.handle_filter_key(key, state, now);
        }
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return TableInput::Ignored;
        }

        match key.code {
            KeyCode::Down | KeyCode::Char('j') => state.cursor_down(records),
            KeyCode::Up | KeyCode::Char('k') => state.cursor_up(),
            KeyCode::Char(' ') => state.toggle_cursor_selection(records, selection),
            KeyCode::Char('a') => state.toggle_select_all(records, selection),
            KeyCode::Enter => {
                return match state.activate(records, focus) {
                    Some(action) => TableInput::Action(action),
                    None => TableInput::Handled,
                };
            }
            KeyCode::Char('m') => return TableInput::Action(TableAction::OpenMenu),
            KeyCode::Char('s') => state.toggle_sort_at_cursor(),
            KeyCode::Left | KeyCode::Char('h') => state.move_column_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => state.move_column_cursor(1),
            KeyCode::Char('H') => state.move_column_at_cursor(-1),
            KeyCode::Char('L') => state.move_column_at_cursor(1),
            KeyCode::Char('<') => state.resize_at_cursor(-RESIZE_STEP),
            KeyCode::Char('>') => state.resize_at_cursor(RESIZE_STEP),
            KeyCode::PageDown | KeyCode::Char('n') => state.next_page(records),
            KeyCode::PageUp | KeyCode::Char('p') => state.previous_page(),
            KeyCode::Home | KeyCode::Char('g') => state.first_page(),
            KeyCode::End | KeyCode::Char('G') => state.last_page(records),
            KeyCode::Char('+') => state.cycle_page_size(records, true),
            KeyCode::Char('-') => state.cycle_page_size(records, false),
            KeyCode::Char('/') => self.filtering = true,
            _ => return TableInput::Ignored,
        }
        TableInput::Handled
    }

    fn handle_filter_key(
        &mut self,
        key: KeyEvent,
        state: &mut TableState,
        now: Instant,
    ) -> TableInput {
        match key.code {
            KeyCode::Enter => self.filtering = false,
            KeyCode::Esc => {
                self.filtering = false;
                state.filter_mut().set_input("", now);
            }
            KeyCode::Backspace => state.filter_mut().pop_char(now),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                state.filter_mut().set_input("", now)
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                state.filter_mut().push_char(c, now)
            }
            _ => {}
        }
        TableInput::Handled
    }

    /// Pasted text goes to the filter line while it is open.
    pub fn handle_paste(&mut self, text: &str, state: &mut TableState, now: Instant) -> bool {
        if !self.filtering {
            return false;
        }
        let mut input = state.filter().input().to_string();
        input.extend(text.chars().filter(|c| !c.is_control()));
        state.filter_mut().set_input(input, now);
        true
    }

    // ========================================================================
    // Mouse
    // ========================================================================

    /// Hit-test a mouse event against the last render.
    pub fn handle_mouse<R: Record>(
        &mut self,
        mouse: MouseEvent,
        state: &mut TableState,
        records: &[R],
        selection: &mut SelectionSet,
        focus: &mut FocusedRow,
    ) -> TableInput {
        let Some(geometry) = self.geometry.clone() else {
            return TableInput::Ignored;
        };

        match mouse.kind {
            MouseEventKind::Drag(MouseButton::Left) => self.drag(&geometry, mouse.column, state),
            MouseEventKind::Up(MouseButton::Left) => self.release(state),
            _ if !geometry.contains(mouse.column, mouse.row) => TableInput::Ignored,
            MouseEventKind::Down(MouseButton::Left) => {
                self.press(&geometry, mouse, state, records, selection, focus)
            }
            MouseEventKind::Down(MouseButton::Right) => TableInput::Action(TableAction::OpenMenu),
            MouseEventKind::ScrollDown => {
                state.cursor_down(records);
                TableInput::Handled
            }
            MouseEventKind::ScrollUp => {
                state.cursor_up();
                TableInput::Handled
            }
            _ => TableInput::Ignored,
        }
    }

    fn press<R: Record>(
        &mut self,
        geometry: &Geometry,
        mouse: MouseEvent,
        state: &mut TableState,
        records: &[R],
        selection: &mut SelectionSet,
        focus: &mut FocusedRow,
    ) -> TableInput {
        let (x, y) = (mouse.column, mouse.row);

        if y == geometry.toolbar_y {
            if x >= geometry.select_all.0 && x < geometry.select_all.1 {
                state.toggle_select_all(records, selection);
                return TableInput::Handled;
            }
            if let Some((start, end)) = geometry.trigger {
                if x >= start && x < end {
                    return TableInput::Action(TableAction::OpenMenu);
                }
            }
            return TableInput::Ignored;
        }

        if y == geometry.header_y {
            if x < geometry.inner.x + CHECK_WIDTH {
                state.toggle_select_all(records, selection);
                return TableInput::Handled;
            }
            if let Some(index) = geometry.separator_at(x) {
                self.gesture = Some(Gesture::Resize {
                    key: geometry.columns[index].key.clone(),
                    last_x: x,
                });
                return TableInput::Handled;
            }
            if let Some(index) = geometry.column_at(x) {
                state.begin_drag();
                self.gesture = Some(Gesture::Reorder {
                    key: geometry.columns[index].key.clone(),
                    source: index,
                    moved: false,
                });
                return TableInput::Handled;
            }
            return TableInput::Ignored;
        }

        let Some(row) = geometry.row_at(y) else {
            return TableInput::Ignored;
        };
        if row >= state.page_indices(records).len() {
            return TableInput::Ignored;
        }
        state.set_cursor(records, row);
        if x < geometry.inner.x + CHECK_WIDTH {
            state.toggle_cursor_selection(records, selection);
            return TableInput::Handled;
        }
        match state.activate(records, focus) {
            Some(action) => TableInput::Action(action),
            None => TableInput::Handled,
        }
    }

    fn drag(&mut self, geometry: &Geometry, x: u16, state: &mut TableState) -> TableInput {
        match &mut self.gesture {
            Some(Gesture::Reorder { key, source, moved }) => {
                let destination = geometry.column_at(x);
                if destination != Some(*source) {
                    *moved = true;
                }
                state.update_drag(&DragUpdate::new(key.clone(), *source, destination));
                TableInput::Handled
            }
            Some(Gesture::Resize { key, last_x }) => {
                let delta = i32::from(x) - i32::from(*last_x);
                if delta != 0 {
                    state.resize(key.as_str(), delta);
                    *last_x = x;
                }
                TableInput::Handled
            }
            None => TableInput::Ignored,
        }
    }

    fn release(&mut self, state: &mut TableState) -> TableInput {
        match self.gesture.take() {
            Some(Gesture::Reorder { key, moved, .. }) => {
                state.end_drag();
                if !moved {
                    state.toggle_sort(&key);
                }
                TableInput::Handled
            }
            Some(Gesture::Resize { .. }) => TableInput::Handled,
            None => TableInput::Ignored,
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Record the geometry for `area` without drawing.
    fn layout(&mut self, area: Rect, state: &TableState, selection: &SelectionSet) -> Geometry {
        let geometry = Geometry::compute(area, state, !selection.is_empty());
        self.geometry = Some(geometry.clone());
        geometry
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render<R: Record>(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        state: &TableState,
        records: &[R],
        selection: &SelectionSet,
        focus: &FocusedRow,
        focused: bool,
    ) {
        let geometry = self.layout(area, state, selection);
        let visible = state.visible_count(records);

        let block = Block::default()
            .title(format!(" {} ({}) ", title, visible))
            .borders(Borders::ALL)
            .border_style(THEME.border_style(focused));

        let mut lines = vec![self.toolbar(records, selection), self.header(&geometry, state)];

        let page = state.page_indices(records);
        if page.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("{:width$}{}", "", self.empty_message, width = CHECK_WIDTH as usize),
                THEME.muted_style(),
            )));
        }
        for (row, &index) in page.iter().take(geometry.row_capacity as usize).enumerate() {
            let record = &records[index];
            let id = record.id();
            lines.push(row_line(
                &geometry,
                record,
                selection.contains(&id),
                focus.is(&id),
                focused && row == state.cursor(),
            ));
        }

        let used = lines.len() as u16;
        let footer_y = geometry.inner.height.saturating_sub(1);
        for _ in used..footer_y {
            lines.push(Line::default());
        }
        lines.push(self.footer(state, visible));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn toolbar<R: Record>(&self, records: &[R], selection: &SelectionSet) -> Line<'static> {
        let check = selection.check_state(records.len());
        let mut spans = vec![
            Span::styled(check.glyph(), Style::default().fg(THEME.checked)),
            Span::raw(SELECT_ALL_LABEL),
        ];
        if !selection.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(ACTIONS_TRIGGER, THEME.trigger_style()));
            spans.push(Span::styled(
                format!("  {} checked", selection.len()),
                THEME.muted_style(),
            ));
        }
        Line::from(spans)
    }

    fn header(&self, geometry: &Geometry, state: &TableState) -> Line<'static> {
        let dragging = match &self.gesture {
            Some(Gesture::Reorder { key, .. }) => Some(key.as_str()),
            _ => None,
        };

        let mut spans = vec![Span::raw(" ".repeat(CHECK_WIDTH as usize))];
        for (position, column) in geometry.columns.iter().enumerate() {
            let header = state
                .column(&column.key)
                .map_or(String::new(), |c| c.header.clone());
            let label = match state.sort().direction_for(&column.key) {
                Some(direction) => format!("{} {}", header, direction.indicator()),
                None => header,
            };

            let mut style = THEME.header_style();
            if position == state.column_cursor() {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            if dragging == Some(column.key.as_str()) {
                style = style.fg(Color::Magenta);
            }
            spans.push(Span::styled(fit(&label, column.width), style));
            spans.push(Span::styled("│", THEME.muted_style()));
        }
        Line::from(spans)
    }

    fn footer(&self, state: &TableState, visible: usize) -> Line<'static> {
        let pagination = state.pagination();
        let pages = pagination.page_count(visible);
        let position = if pages == 0 {
            "No pages".to_string()
        } else {
            format!("Page {} of {}", pagination.page_index() + 1, pages)
        };
        let mut spans = vec![Span::styled(
            format!(
                "{}  ·  {} rows  ·  {} per page",
                position,
                visible,
                pagination.page_size()
            ),
            THEME.muted_style(),
        )];

        let filter = state.filter();
        if self.filtering || !filter.input().is_empty() {
            let pending = if filter.input() != filter.applied() {
                " …"
            } else {
                ""
            };
            let cursor = if self.filtering { "_" } else { "" };
            spans.push(Span::styled(
                format!("   Filter: {}{}{}", filter.input(), cursor, pending),
                Style::default().fg(Color::Yellow),
            ));
        }
        Line::from(spans)
    }
}

fn row_line<R: Record>(
    geometry: &Geometry,
    record: &R,
    checked: bool,
    focused_row: bool,
    under_cursor: bool,
) -> Line<'static> {
    let glyph = if checked { "[x] " } else { "[ ] " };
    let mut spans = vec![Span::styled(glyph, Style::default().fg(THEME.checked))];
    for column in &geometry.columns {
        spans.push(Span::raw(fit(&record.cell(&column.key), column.width)));
        spans.push(Span::raw(" "));
    }

    let mut style = Style::default();
    if focused_row {
        style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
    }
    if under_cursor {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Line::from(spans).style(style)
}

/// Pad or truncate `text` to exactly `width` cells.
fn fit(text: &str, width: u16) -> String {
    let width = width as usize;
    let text: String = text.chars().map(|c| if c.is_control() { ' ' } else { c }).collect();
    let count = text.chars().count();
    if count <= width {
        format!("{:width$}", text, width = width)
    } else if width == 0 {
        String::new()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::{columns, Row};
    use crate::table::CheckState;

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| Row::new(i, &format!("user {i}"), &format!("u{i}@example.com"), ""))
            .collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    struct Fixture {
        view: TableView,
        state: TableState,
        records: Vec<Row>,
        selection: SelectionSet,
        focus: FocusedRow,
    }

    impl Fixture {
        fn new(n: usize) -> Self {
            let mut view = TableView::new();
            let state = TableState::new(columns());
            let selection = SelectionSet::new();
            view.layout(Rect::new(0, 0, 120, 20), &state, &selection);
            Self {
                view,
                state,
                records: rows(n),
                selection,
                focus: FocusedRow::none(),
            }
        }

        fn key(&mut self, code: KeyCode) -> TableInput {
            self.view.handle_key(
                key(code),
                &mut self.state,
                &self.records,
                &mut self.selection,
                &mut self.focus,
                Instant::now(),
            )
        }

        fn mouse(&mut self, kind: MouseEventKind, column: u16, row: u16) -> TableInput {
            let result = self.view.handle_mouse(
                mouse(kind, column, row),
                &mut self.state,
                &self.records,
                &mut self.selection,
                &mut self.focus,
            );
            // Re-layout as a render would.
            self.view
                .layout(Rect::new(0, 0, 120, 20), &self.state, &self.selection);
            result
        }
    }

    #[test]
    fn test_fit_pads_and_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("a\tb", 3), "a b");
        assert_eq!(fit("abc", 0), "");
    }

    #[test]
    fn test_geometry_places_columns_after_checkbox() {
        let state = TableState::new(columns());
        let geometry = Geometry::compute(Rect::new(0, 0, 120, 20), &state, false);
        assert_eq!(geometry.header_y, 2);
        assert_eq!(geometry.first_row_y, 3);
        assert_eq!(geometry.columns[0].x, 5);
        assert_eq!(geometry.columns[1].x, 5 + state.width("name") + 1);
        assert!(geometry.trigger.is_none());
    }

    #[test]
    fn test_trigger_only_with_selection() {
        let state = TableState::new(columns());
        let with = Geometry::compute(Rect::new(0, 0, 120, 20), &state, true);
        let (start, end) = with.trigger.unwrap();
        assert!(start > with.select_all.1);
        assert_eq!(end - start, ACTIONS_TRIGGER.chars().count() as u16);
    }

    #[test]
    fn test_space_and_select_all_keys() {
        let mut f = Fixture::new(3);
        assert_eq!(f.key(KeyCode::Char(' ')), TableInput::Handled);
        assert!(f.selection.contains("row-0"));
        assert_eq!(f.selection.check_state(3), CheckState::Indeterminate);

        // Indeterminate clears, unchecked selects every row.
        f.key(KeyCode::Char('a'));
        assert!(f.selection.is_empty());
        f.key(KeyCode::Char('a'));
        assert_eq!(f.selection.check_state(3), CheckState::Checked);
    }

    #[test]
    fn test_enter_focuses_cursor_row() {
        let mut f = Fixture::new(3);
        f.key(KeyCode::Down);
        assert_eq!(
            f.key(KeyCode::Enter),
            TableInput::Action(TableAction::RowActivated("row-1".into()))
        );
        assert!(f.focus.is("row-1"));
    }

    #[test]
    fn test_menu_key_leaves_focus_alone() {
        let mut f = Fixture::new(3);
        assert_eq!(
            f.key(KeyCode::Char('m')),
            TableInput::Action(TableAction::OpenMenu)
        );
        assert_eq!(f.focus.get(), None);
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut f = Fixture::new(3);
        assert_eq!(f.key(KeyCode::Char('z')), TableInput::Ignored);
        assert_eq!(f.key(KeyCode::Esc), TableInput::Ignored);
    }

    #[test]
    fn test_filter_mode_captures_keys() {
        let mut f = Fixture::new(3);
        f.key(KeyCode::Char('/'));
        assert!(f.view.is_filtering());
        assert_eq!(f.key(KeyCode::Char('a')), TableInput::Handled);
        assert!(f.selection.is_empty());
        assert_eq!(f.state.filter().input(), "a");

        f.key(KeyCode::Esc);
        assert!(!f.view.is_filtering());
        assert_eq!(f.state.filter().input(), "");
    }

    #[test]
    fn test_paste_only_while_filtering() {
        let mut f = Fixture::new(3);
        assert!(!f.view.handle_paste("alice", &mut f.state, Instant::now()));
        f.key(KeyCode::Char('/'));
        assert!(f.view.handle_paste("alice\n", &mut f.state, Instant::now()));
        assert_eq!(f.state.filter().input(), "alice");
    }

    #[test]
    fn test_row_click_focuses_and_checkbox_click_toggles() {
        let mut f = Fixture::new(5);
        // Third row of the page, inside the name column.
        let result = f.mouse(MouseEventKind::Down(MouseButton::Left), 8, 5);
        assert_eq!(
            result,
            TableInput::Action(TableAction::RowActivated("row-2".into()))
        );
        assert!(f.focus.is("row-2"));

        f.mouse(MouseEventKind::Down(MouseButton::Left), 2, 4);
        assert!(f.selection.contains("row-1"));
        assert!(f.focus.is("row-2"));
    }

    #[test]
    fn test_click_below_last_row_is_ignored() {
        let mut f = Fixture::new(2);
        assert_eq!(
            f.mouse(MouseEventKind::Down(MouseButton::Left), 8, 10),
            TableInput::Ignored
        );
        assert_eq!(f.focus.get(), None);
    }

    #[test]
    fn test_right_click_opens_menu_without_focus() {
        let mut f = Fixture::new(3);
        assert_eq!(
            f.mouse(MouseEventKind::Down(MouseButton::Right), 8, 3),
            TableInput::Action(TableAction::OpenMenu)
        );
        assert_eq!(f.focus.get(), None);
    }

    #[test]
    fn test_toolbar_select_all_and_trigger() {
        let mut f = Fixture::new(3);
        f.mouse(MouseEventKind::Down(MouseButton::Left), 1, 1);
        assert_eq!(f.selection.len(), 3);

        let (start, _) = f.view.geometry.as_ref().unwrap().trigger.unwrap();
        assert_eq!(
            f.mouse(MouseEventKind::Down(MouseButton::Left), start, 1),
            TableInput::Action(TableAction::OpenMenu)
        );
    }

    #[test]
    fn test_header_click_without_drag_sorts() {
        let mut f = Fixture::new(3);
        f.mouse(MouseEventKind::Down(MouseButton::Left), 6, 2);
        assert!(f.state.is_dragging());
        f.mouse(MouseEventKind::Up(MouseButton::Left), 6, 2);
        assert!(!f.state.is_dragging());
        assert!(f.state.sort().direction_for("name").is_some());
    }

    #[test]
    fn test_header_drag_reorders_live() {
        let mut f = Fixture::new(3);
        let email_x = f.view.geometry.as_ref().unwrap().columns[1].x + 1;

        f.mouse(MouseEventKind::Down(MouseButton::Left), 6, 2);
        f.mouse(MouseEventKind::Drag(MouseButton::Left), email_x, 2);
        assert_eq!(f.state.order().keys(), ["email", "name", "note"]);

        f.mouse(MouseEventKind::Up(MouseButton::Left), email_x, 2);
        assert_eq!(f.state.order().keys(), ["email", "name", "note"]);
        assert!(f.state.sort().column().is_none());
    }

    #[test]
    fn test_drag_outside_columns_keeps_live_order() {
        let mut f = Fixture::new(3);
        let email_x = f.view.geometry.as_ref().unwrap().columns[1].x + 1;

        f.mouse(MouseEventKind::Down(MouseButton::Left), 6, 2);
        f.mouse(MouseEventKind::Drag(MouseButton::Left), 1, 2);
        assert_eq!(f.state.order().keys(), ["name", "email", "note"]);

        f.mouse(MouseEventKind::Drag(MouseButton::Left), email_x, 2);
        f.mouse(MouseEventKind::Drag(MouseButton::Left), 1, 2);
        assert_eq!(f.state.order().keys(), ["email", "name", "note"]);
        f.mouse(MouseEventKind::Up(MouseButton::Left), 1, 2);
        assert_eq!(f.state.order().keys(), ["email", "name", "note"]);
    }

    #[test]
    fn test_separator_drag_resizes() {
        let mut f = Fixture::new(3);
        let before = f.state.width("name");
        let edge = f.view.geometry.as_ref().unwrap().columns[0].x + before;

        f.mouse(MouseEventKind::Down(MouseButton::Left), edge, 2);
        f.mouse(MouseEventKind::Drag(MouseButton::Left), edge + 3, 2);
        f.mouse(MouseEventKind::Up(MouseButton::Left), edge + 3, 2);
        assert_eq!(f.state.width("name"), before + 3);
        assert!(!f.state.is_dragging());
    }

    #[test]
    fn test_mouse_before_first_render_is_ignored() {
        let mut view = TableView::new();
        let mut state = TableState::new(columns());
        let records = rows(2);
        let mut selection = SelectionSet::new();
        let mut focus = FocusedRow::none();
        let result = view.handle_mouse(
            mouse(MouseEventKind::Down(MouseButton::Left), 5, 5),
            &mut state,
            &records,
            &mut selection,
            &mut focus,
        );
        assert_eq!(result, TableInput::Ignored);
    }
}
