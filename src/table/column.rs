//! Column configuration, ordering and drag reordering.

/// Default column width in terminal cells.
pub const DEFAULT_WIDTH: u16 = 24;

/// Default lower width bound.
pub const DEFAULT_MIN_WIDTH: u16 = 4;

/// Default upper width bound.
pub const DEFAULT_MAX_WIDTH: u16 = 80;

/// Static description of one table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Key passed to [`Record::cell`](super::Record::cell).
    pub key: String,
    /// Header label.
    pub header: String,
    /// Initial width.
    pub width: u16,
    /// Smallest width a resize may reach.
    pub min_width: u16,
    /// Largest width a resize may reach.
    pub max_width: u16,
}

impl ColumnDescriptor {
    /// Create a column with default width bounds.
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            width: DEFAULT_WIDTH,
            min_width: DEFAULT_MIN_WIDTH,
            max_width: DEFAULT_MAX_WIDTH,
        }
    }

    /// Set the initial width, clamped into the current bounds.
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width.clamp(self.min_width, self.max_width);
        self
    }

    /// Set the width bounds. The initial width is re-clamped.
    pub fn with_bounds(mut self, min_width: u16, max_width: u16) -> Self {
        self.min_width = min_width.min(max_width);
        self.max_width = max_width.max(min_width);
        self.width = self.width.clamp(self.min_width, self.max_width);
        self
    }

    /// Clamp a candidate width into this column's bounds.
    pub fn clamp_width(&self, width: i32) -> u16 {
        width.clamp(self.min_width as i32, self.max_width as i32) as u16
    }
}

/// The display order of the column keys.
///
/// Always a permutation of the configured keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrder(Vec<String>);

impl ColumnOrder {
    /// The configured order of `columns`.
    pub fn from_columns(columns: &[ColumnDescriptor]) -> Self {
        Self(columns.iter().map(|c| c.key.clone()).collect())
    }

    /// Keys in display order.
    pub fn keys(&self) -> &[String] {
        &self.0
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Display position of `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|k| k == key)
    }

    /// Key at display position `index`.
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    #[cfg(test)]
    /// Whether this order holds exactly the keys of `columns`, once each.
    pub fn is_permutation_of(&self, columns: &[ColumnDescriptor]) -> bool {
        let mut mine: Vec<&str> = self.0.iter().map(String::as_str).collect();
        let mut theirs: Vec<&str> = columns.iter().map(|c| c.key.as_str()).collect();
        mine.sort_unstable();
        theirs.sort_unstable();
        mine == theirs
    }
}

/// One step of a column drag gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragUpdate {
    /// Key of the column being dragged.
    pub draggable_id: String,
    /// Position of the dragged column when the drag started.
    pub source_index: usize,
    /// Position currently hovered, `None` outside any valid target.
    pub destination_index: Option<usize>,
}

impl DragUpdate {
    /// Build an update for dragging `key` from `source_index`.
    pub fn new(
        draggable_id: impl Into<String>,
        source_index: usize,
        destination_index: Option<usize>,
    ) -> Self {
        Self {
            draggable_id: draggable_id.into(),
            source_index,
            destination_index,
        }
    }
}

/// Compute the column order for a drag step.
///
/// `order` is the order captured when the drag began. The dragged key is
/// removed from its source slot and inserted at the destination. An update
/// without a destination, or one whose source slot does not hold the dragged
/// key, returns `order` unchanged.
pub fn reorder(order: &ColumnOrder, update: &DragUpdate) -> ColumnOrder {
    let Some(destination) = update.destination_index else {
        return order.clone();
    };
    if order.key_at(update.source_index) != Some(update.draggable_id.as_str()) {
        return order.clone();
    }

    let mut keys = order.0.clone();
    let moved = keys.remove(update.source_index);
    let destination = destination.min(keys.len());
    keys.insert(destination, moved);
    ColumnOrder(keys)
}
