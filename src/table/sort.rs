//! Single-column sorting.

use std::cmp::Ordering;

use super::Record;

/// Sort direction of the active column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Header indicator.
    pub fn indicator(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Which column, if any, the rows are sorted by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    active: Option<(String, SortDirection)>,
}

impl SortState {
    /// Unsorted state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the sort cycle for `key`.
    ///
    /// The same column cycles unsorted → ascending → descending → unsorted.
    /// A different column always starts at ascending.
    pub fn toggle(&mut self, key: &str) {
        self.active = match self.active.take() {
            Some((current, SortDirection::Ascending)) if current == key => {
                Some((current, SortDirection::Descending))
            }
            Some((current, SortDirection::Descending)) if current == key => None,
            _ => Some((key.to_string(), SortDirection::Ascending)),
        };
    }

    /// Direction for `key` if it is the active column.
    pub fn direction_for(&self, key: &str) -> Option<SortDirection> {
        match &self.active {
            Some((current, direction)) if current == key => Some(*direction),
            _ => None,
        }
    }

    /// The active column key.
    pub fn column(&self) -> Option<&str> {
        self.active.as_ref().map(|(k, _)| k.as_str())
    }

    /// Sort `indices` (positions into `records`) in place.
    ///
    /// The sort is stable: equal keys keep their relative order in both
    /// directions.
    pub fn apply<R: Record>(&self, records: &[R], indices: &mut [usize]) {
        let Some((key, direction)) = &self.active else {
            return;
        };
        indices.sort_by(|&a, &b| {
            let ordering = compare_values(&records[a].cell(key), &records[b].cell(key));
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}

/// Compare two cell values.
///
/// Values that both parse as numbers compare numerically, everything else
/// compares case-insensitively.
pub fn compare_values(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::Row;

    fn sample() -> Vec<Row> {
        vec![
            Row::new(0, "carol", "c@example.com", "b"),
            Row::new(1, "alice", "a@example.com", "a"),
            Row::new(2, "Bob", "b@example.com", "b"),
            Row::new(3, "dave", "d@example.com", "a"),
        ]
    }

    fn sorted(state: &SortState, records: &[Row]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..records.len()).collect();
        state.apply(records, &mut indices);
        indices
    }

    #[test]
    fn test_toggle_cycle() {
        let mut state = SortState::new();
        state.toggle("name");
        assert_eq!(state.direction_for("name"), Some(SortDirection::Ascending));
        state.toggle("name");
        assert_eq!(state.direction_for("name"), Some(SortDirection::Descending));
        state.toggle("name");
        assert_eq!(state.direction_for("name"), None);
        assert_eq!(state.column(), None);
    }

    #[test]
    fn test_toggle_other_column_starts_ascending() {
        let mut state = SortState::new();
        state.toggle("name");
        state.toggle("name");
        state.toggle("email");
        assert_eq!(state.direction_for("email"), Some(SortDirection::Ascending));
        assert_eq!(state.direction_for("name"), None);
    }

    #[test]
    fn test_ascending_is_case_insensitive() {
        let records = sample();
        let mut state = SortState::new();
        state.toggle("name");
        assert_eq!(sorted(&state, &records), vec![1, 2, 0, 3]);
    }

    #[test]
    fn test_full_cycle_restores_original_order() {
        let records = sample();
        let mut state = SortState::new();
        for _ in 0..3 {
            state.toggle("name");
        }
        assert_eq!(sorted(&state, &records), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let records = sample();
        let mut state = SortState::new();
        state.toggle("note");
        assert_eq!(sorted(&state, &records), vec![1, 3, 0, 2]);
        state.toggle("note");
        assert_eq!(sorted(&state, &records), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_numeric_values_compare_numerically() {
        assert_eq!(compare_values("9", "10"), Ordering::Less);
        assert_eq!(compare_values("b", "A"), Ordering::Greater);
        assert_eq!(compare_values("10", "abc"), Ordering::Less);
    }
}
