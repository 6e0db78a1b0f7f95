//! Context menu listing the bulk actions.

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::actions::{MenuEntry, MENU_ENTRIES};
use crate::ui::theme::THEME;

/// Result of feeding input to an open menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuInput {
    /// Still open.
    Pending,
    /// An entry was chosen; the menu closed.
    Chosen(MenuEntry),
    /// Dismissed without a choice.
    Closed,
}

/// Popup over the table. Entries are grouped under "Bookmark" and "Tag".
#[derive(Debug, Clone, Default)]
pub struct ActionMenu {
    open: bool,
    selected: usize,
    /// Screen rows of each entry from the last render.
    entry_rows: Vec<u16>,
    area: Rect,
}

impl ActionMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
        self.selected = 0;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.entry_rows.clear();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn selected(&self) -> MenuEntry {
        MENU_ENTRIES[self.selected]
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> MenuInput {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.selected = (self.selected + 1) % MENU_ENTRIES.len();
                MenuInput::Pending
            }
            KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => {
                self.selected = (self.selected + MENU_ENTRIES.len() - 1) % MENU_ENTRIES.len();
                MenuInput::Pending
            }
            KeyCode::Enter => self.choose(self.selected),
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('m') => {
                self.close();
                MenuInput::Closed
            }
            _ => MenuInput::Pending,
        }
    }

    /// A left click on an entry chooses it; a click elsewhere closes.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> MenuInput {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return MenuInput::Pending;
        }
        let inside = mouse.column >= self.area.x && mouse.column < self.area.right();
        match self.entry_rows.iter().position(|&row| row == mouse.row) {
            Some(index) if inside => self.choose(index),
            _ => {
                self.close();
                MenuInput::Closed
            }
        }
    }

    fn choose(&mut self, index: usize) -> MenuInput {
        let entry = MENU_ENTRIES[index];
        self.close();
        MenuInput::Chosen(entry)
    }

    /// Lines of the popup and the line index of each entry.
    fn lines(&self) -> (Vec<Line<'static>>, Vec<usize>) {
        let mut lines = Vec::new();
        let mut entry_lines = Vec::new();
        let mut group = "";
        for (index, entry) in MENU_ENTRIES.iter().enumerate() {
            if entry.group() != group {
                group = entry.group();
                lines.push(Line::from(Span::styled(group, THEME.muted_style())));
            }
            let style = if index == self.selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            entry_lines.push(lines.len());
            lines.push(Line::from(Span::styled(format!("  {}", entry.label()), style)));
        }
        (lines, entry_lines)
    }

    /// Render anchored at the top-left of `anchor`.
    pub fn render(&mut self, frame: &mut Frame, anchor: Rect) {
        if !self.open {
            return;
        }
        let (lines, entry_lines) = self.lines();
        let width = 28.min(anchor.width);
        let height = (lines.len() as u16 + 2).min(anchor.height);
        let area = Rect::new(anchor.x + 1, anchor.y + 1, width, height);

        self.area = area;
        self.entry_rows = entry_lines
            .into_iter()
            .map(|line| area.y + 1 + line as u16)
            .collect();

        frame.render_widget(Clear, area);
        let block = Block::default()
            .title(" Actions ")
            .borders(Borders::ALL)
            .border_style(THEME.border_style(true));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_groups_precede_entries() {
        let menu = ActionMenu::new();
        let (lines, entries) = menu.lines();
        assert_eq!(lines.len(), 6);
        assert_eq!(entries, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_keyboard_choice_closes() {
        let mut menu = ActionMenu::new();
        menu.open();
        assert_eq!(menu.handle_key(key(KeyCode::Down)), MenuInput::Pending);
        assert_eq!(menu.selected(), MenuEntry::RemoveBookmarks);
        assert_eq!(
            menu.handle_key(key(KeyCode::Enter)),
            MenuInput::Chosen(MenuEntry::RemoveBookmarks)
        );
        assert!(!menu.is_open());
    }

    #[test]
    fn test_selection_wraps() {
        let mut menu = ActionMenu::new();
        menu.open();
        menu.handle_key(key(KeyCode::Up));
        assert_eq!(menu.selected(), MenuEntry::RemoveTag);
    }

    #[test]
    fn test_escape_closes() {
        let mut menu = ActionMenu::new();
        menu.open();
        assert_eq!(menu.handle_key(key(KeyCode::Esc)), MenuInput::Closed);
        assert!(!menu.is_open());
    }

    #[test]
    fn test_click_outside_closes() {
        let mut menu = ActionMenu::new();
        menu.open();
        menu.area = Rect::new(1, 1, 28, 8);
        menu.entry_rows = vec![3, 4, 6, 7];
        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            menu.handle_mouse(click(5, 6)),
            MenuInput::Chosen(MenuEntry::AddTag)
        );

        menu.open();
        menu.area = Rect::new(1, 1, 28, 8);
        menu.entry_rows = vec![3, 4, 6, 7];
        assert_eq!(menu.handle_mouse(click(60, 6)), MenuInput::Closed);
    }
}
