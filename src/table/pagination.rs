//! Page size and page index bookkeeping.

use std::ops::Range;

/// Page sizes offered to the user.
pub const PAGE_SIZES: [usize; 7] = [5, 10, 20, 30, 40, 50, 100];

/// Page size used when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Current page of a row list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: usize,
    page_index: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    /// Start at the first page. Unsupported sizes fall back to the default.
    pub fn new(page_size: usize) -> Self {
        let page_size = if PAGE_SIZES.contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        Self {
            page_size,
            page_index: 0,
        }
    }

    /// Rows per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Zero-based current page.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Number of pages for `total` rows: `ceil(total / page_size)`.
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }

    /// Pull the page index back into `[0, page_count - 1]`.
    pub fn clamp(&mut self, total: usize) {
        let last = self.page_count(total).saturating_sub(1);
        self.page_index = self.page_index.min(last);
    }

    /// Switch to one of [`PAGE_SIZES`]. Returns `false` for other values.
    pub fn set_page_size(&mut self, page_size: usize, total: usize) -> bool {
        if !PAGE_SIZES.contains(&page_size) {
            return false;
        }
        // Keep the first visible row on screen.
        let first_row = self.page_index * self.page_size;
        self.page_size = page_size;
        self.page_index = first_row / page_size;
        self.clamp(total);
        true
    }

    /// Step to the next (or previous) entry of [`PAGE_SIZES`], wrapping.
    pub fn cycle_page_size(&mut self, forward: bool, total: usize) {
        let current = PAGE_SIZES
            .iter()
            .position(|&s| s == self.page_size)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % PAGE_SIZES.len()
        } else {
            (current + PAGE_SIZES.len() - 1) % PAGE_SIZES.len()
        };
        self.set_page_size(PAGE_SIZES[next], total);
    }

    /// Go back to the first page.
    pub fn reset(&mut self) {
        self.page_index = 0;
    }

    /// Whether a page follows the current one.
    pub fn can_next(&self, total: usize) -> bool {
        self.page_index + 1 < self.page_count(total)
    }

    /// Jump to the first page.
    pub fn first(&mut self) {
        self.page_index = 0;
    }

    /// Go back one page, never below the first.
    pub fn previous(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    /// Advance one page, never past the last.
    pub fn next(&mut self, total: usize) {
        if self.can_next(total) {
            self.page_index += 1;
        }
    }

    /// Jump to the last page; index 0 for an empty list.
    pub fn last(&mut self, total: usize) {
        self.page_index = self.page_count(total).saturating_sub(1);
    }

    /// Positions of the current page within a list of `total` rows.
    pub fn page_range(&self, total: usize) -> Range<usize> {
        let start = (self.page_index * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }
}
