//! Debounced global text filter.

use std::time::{Duration, Instant};

use super::{ColumnDescriptor, Record};

/// Quiet period before typed filter text is applied.
pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(200);

/// Holds back a value until its input has been quiet for a fixed period.
///
/// Time is passed in explicitly so callers drive it from the UI tick.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given quiet period.
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a new value, restarting the quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Release the pending value once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.quiet => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    #[cfg(test)]
    /// Whether a value is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// The free-text filter applied across every column of a record.
#[derive(Debug, Clone)]
pub struct GlobalFilter {
    /// Text as typed.
    input: String,
    /// Lowercased text currently in effect.
    applied: String,
    debouncer: Debouncer<String>,
}

impl Default for GlobalFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalFilter {
    /// An empty filter with the standard quiet period.
    pub fn new() -> Self {
        Self {
            input: String::new(),
            applied: String::new(),
            debouncer: Debouncer::new(FILTER_DEBOUNCE),
        }
    }

    /// Text as typed, possibly not yet applied.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Text currently in effect.
    pub fn applied(&self) -> &str {
        &self.applied
    }

    /// Replace the typed text.
    pub fn set_input(&mut self, text: impl Into<String>, now: Instant) {
        self.input = text.into();
        self.debouncer.push(self.input.clone(), now);
    }

    /// Append a typed character.
    pub fn push_char(&mut self, c: char, now: Instant) {
        let mut text = self.input.clone();
        text.push(c);
        self.set_input(text, now);
    }

    /// Remove the last typed character.
    pub fn pop_char(&mut self, now: Instant) {
        let mut text = self.input.clone();
        if text.pop().is_some() {
            self.set_input(text, now);
        }
    }

    /// Apply the typed text if it has been quiet long enough.
    ///
    /// Returns `true` when the effective filter changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(text) => {
                let text = text.trim().to_lowercase();
                let changed = text != self.applied;
                self.applied = text;
                changed
            }
            None => false,
        }
    }

    /// Whether `record` passes the applied filter.
    pub fn matches<R: Record>(&self, record: &R, columns: &[ColumnDescriptor]) -> bool {
        if self.applied.is_empty() {
            return true;
        }
        columns
            .iter()
            .any(|c| record.cell(&c.key).to_lowercase().contains(&self.applied))
    }
}
