//! Bookmarked messages of the active project.
//!
//! Removing a bookmark here drops the row instead of clearing its flag.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{layout::Rect, Frame};
use tracing::debug;

use super::messages::MessagesView;
use super::{failure_effects, Effect};
use crate::actions::{ReconcilePolicy, RemoveMode};
use crate::api::types::Message;
use crate::api::RemoteFailure;
use crate::tasks::{Command, Generation, ListKind};

pub const NO_BOOKMARKS: &str = "No bookmarks found.";

pub struct BookmarksView {
    generation: Generation,
    messages: MessagesView,
}

impl BookmarksView {
    pub fn new(policy: ReconcilePolicy, page_size: usize) -> Self {
        Self {
            generation: Generation::new(),
            messages: MessagesView::new(
                ListKind::Bookmarks,
                RemoveMode::DropRow,
                policy,
                page_size,
                NO_BOOKMARKS,
            ),
        }
    }

    pub fn messages_mut(&mut self) -> &mut MessagesView {
        &mut self.messages
    }

    /// Request a fresh list.
    pub fn reload(&mut self) -> Vec<Effect> {
        let generation = self.generation.next();
        vec![Effect::Run(Command::FetchBookmarks { generation })]
    }

    pub fn apply_results(
        &mut self,
        generation: u64,
        result: Result<Vec<Message>, RemoteFailure>,
    ) -> Vec<Effect> {
        if !self.generation.is_current(generation) {
            debug!(generation, "Dropping stale bookmarks response");
            return Vec::new();
        }
        match result {
            Ok(messages) => {
                self.messages.replace(messages);
                Vec::new()
            }
            Err(failure) => {
                self.messages.replace(Vec::new());
                failure_effects(&failure)
            }
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.messages.is_capturing()
    }

    pub fn hints(&self) -> &'static str {
        self.messages.hints()
    }

    pub fn tick(&mut self, now: Instant) {
        self.messages.tick(now);
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        if !self.messages.is_capturing()
            && key.code == KeyCode::Char('r')
            && key.modifiers == KeyModifiers::NONE
        {
            return self.reload();
        }
        self.messages.handle_key(key, now)
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Effect> {
        self.messages.handle_mouse(mouse)
    }

    pub fn handle_paste(&mut self, text: &str, now: Instant) {
        self.messages.handle_paste(text, now);
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.messages.render(frame, area, "Bookmarks", true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{BulkRequest, MenuEntry};

    fn bookmarked(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| Message {
                uuid: format!("b{i}"),
                bookmark: true,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_reload_uses_new_generation() {
        let mut view = BookmarksView::new(ReconcilePolicy::Keep, 10);
        assert_eq!(
            view.reload(),
            vec![Effect::Run(Command::FetchBookmarks { generation: 1 })]
        );
        view.reload();
        view.apply_results(1, Ok(bookmarked(3)));
        assert!(view.messages_mut().records().is_empty());
        view.apply_results(2, Ok(bookmarked(3)));
        assert_eq!(view.messages_mut().records().len(), 3);
    }

    #[test]
    fn test_remove_drops_rows() {
        let mut view = BookmarksView::new(ReconcilePolicy::Keep, 10);
        view.reload();
        view.apply_results(1, Ok(bookmarked(3)));

        let now = Instant::now();
        view.handle_key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE), now);
        let effects = view.messages_mut().run(MenuEntry::RemoveBookmarks);
        assert!(matches!(
            &effects[0],
            Effect::Run(Command::Bulk { list: ListKind::Bookmarks, requests })
                if matches!(&requests[0], BulkRequest::RemoveBookmark { id, .. } if id == "b0")
        ));
        assert_eq!(view.messages_mut().records().len(), 2);
    }
}
