//! Project list with creation and activation.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};
use tracing::debug;

use super::{Effect, Screen};
use crate::api::types::Project;
use crate::table::{ColumnDescriptor, FocusedRow, SelectionSet, TableAction, TableState};
use crate::tasks::Command;
use crate::ui::components::{TableInput, TableView, TextInput};

pub const INVALID_NAME: &str = "Please enter a valid project name.";

fn project_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("name", "Name").with_bounds(4, 80).with_width(40),
        ColumnDescriptor::new("creation_date", "Date")
            .with_bounds(4, 60)
            .with_width(32),
    ]
}

pub struct ProjectsView {
    records: Vec<Project>,
    table: TableState,
    table_view: TableView,
    selection: SelectionSet,
    focus: FocusedRow,
    /// Open while a new project name is being typed.
    new_project: Option<TextInput>,
}

impl ProjectsView {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            table: TableState::with_page_size(project_columns(), page_size),
            table_view: TableView::with_empty_message("No projects yet. Press n to create one."),
            selection: SelectionSet::new(),
            focus: FocusedRow::none(),
            new_project: None,
        }
    }

    pub fn records(&self) -> &[Project] {
        &self.records
    }

    pub fn replace(&mut self, records: Vec<Project>) {
        self.records = records;
        self.table
            .replace_records(&self.records, &mut self.selection, &mut self.focus);
    }

    /// A project was created on the backend.
    pub fn created(&mut self, project: Project) {
        debug!(uuid = %project.uuid, "Project added to list");
        self.records.push(project);
        self.table.clamp(&self.records);
    }

    pub fn name_of(&self, uuid: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|p| p.uuid == uuid)
            .map(|p| p.name.as_str())
    }

    pub fn is_capturing(&self) -> bool {
        self.new_project.is_some() || self.table_view.is_filtering()
    }

    pub fn hints(&self) -> &'static str {
        if self.new_project.is_some() {
            "[Enter] create  [Esc] cancel"
        } else if self.table_view.is_filtering() {
            self.table_view.hints()
        } else {
            "[Enter] open  [n] new project  [i] import progress  [r] reload  [/] filter  [s] sort  [PgDn/p] page"
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.table.tick(&self.records, now);
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        if let Some(input) = self.new_project.as_mut() {
            return match key.code {
                KeyCode::Esc => {
                    self.new_project = None;
                    Vec::new()
                }
                KeyCode::Enter => {
                    let name = input.value().trim().to_string();
                    if name.is_empty() {
                        return vec![Effect::warn(INVALID_NAME)];
                    }
                    self.new_project = None;
                    vec![Effect::Run(Command::CreateProject(name))]
                }
                _ => {
                    input.handle_input(key);
                    Vec::new()
                }
            };
        }

        // Screen keys win over the table's own bindings while not filtering.
        if !self.table_view.is_filtering() && key.modifiers == KeyModifiers::NONE {
            match key.code {
                KeyCode::Char('n') => {
                    self.new_project = Some(TextInput::new().with_placeholder("Project name"));
                    return Vec::new();
                }
                KeyCode::Char('i') => {
                    return match self.table.cursor_id(&self.records) {
                        Some(uuid) => vec![
                            Effect::Run(Command::WatchImport(uuid)),
                            Effect::Navigate(Screen::Import),
                        ],
                        None => vec![Effect::warn("No project selected.")],
                    };
                }
                KeyCode::Char('r') => return vec![Effect::Run(Command::FetchProjects)],
                _ => {}
            }
        }

        let input = self.table_view.handle_key(
            key,
            &mut self.table,
            &self.records,
            &mut self.selection,
            &mut self.focus,
            now,
        );
        self.table_input(input)
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Effect> {
        if self.new_project.is_some() {
            return Vec::new();
        }
        let input = self.table_view.handle_mouse(
            mouse,
            &mut self.table,
            &self.records,
            &mut self.selection,
            &mut self.focus,
        );
        self.table_input(input)
    }

    pub fn handle_paste(&mut self, text: &str, now: Instant) {
        match self.new_project.as_mut() {
            Some(input) => input.insert_str(text),
            None => {
                self.table_view.handle_paste(text, &mut self.table, now);
            }
        }
    }

    fn table_input(&mut self, input: TableInput) -> Vec<Effect> {
        match input {
            TableInput::Action(TableAction::RowActivated(uuid)) => {
                vec![Effect::Run(Command::SetProject(uuid))]
            }
            TableInput::Action(TableAction::OpenMenu) => {
                vec![Effect::warn("Projects have no bulk actions.")]
            }
            TableInput::Handled | TableInput::Ignored => Vec::new(),
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let table_area = match &self.new_project {
            Some(input) => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(3), Constraint::Min(3)])
                    .split(area);
                input.render(frame, chunks[0], "New project", true);
                chunks[1]
            }
            None => area,
        };
        self.table_view.render(
            frame,
            table_area,
            "Projects",
            &self.table,
            &self.records,
            &self.selection,
            &self.focus,
            self.new_project.is_none(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::format_unix_date;
    use crate::table::Record;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn projects() -> Vec<Project> {
        vec![
            Project {
                uuid: "p1".into(),
                name: "Alpha".into(),
                creation_date: 1_700_000_000,
            },
            Project {
                uuid: "p2".into(),
                name: "Beta".into(),
                creation_date: 0,
            },
        ]
    }

    #[test]
    fn test_empty_name_is_rejected_without_request() {
        let mut view = ProjectsView::new(10);
        let now = Instant::now();
        view.handle_key(key(KeyCode::Char('n')), now);
        assert!(view.is_capturing());
        view.handle_key(key(KeyCode::Char(' ')), now);

        let effects = view.handle_key(key(KeyCode::Enter), now);
        assert_eq!(effects, vec![Effect::warn(INVALID_NAME)]);
        assert!(view.is_capturing());
    }

    #[test]
    fn test_create_project_emits_command() {
        let mut view = ProjectsView::new(10);
        let now = Instant::now();
        view.handle_key(key(KeyCode::Char('n')), now);
        view.handle_paste("Case 7", now);
        let effects = view.handle_key(key(KeyCode::Enter), now);
        assert_eq!(
            effects,
            vec![Effect::Run(Command::CreateProject("Case 7".into()))]
        );
        assert!(!view.is_capturing());
    }

    #[test]
    fn test_activation_sets_project() {
        let mut view = ProjectsView::new(10);
        view.replace(projects());
        let effects = view.handle_key(key(KeyCode::Enter), Instant::now());
        assert_eq!(effects, vec![Effect::Run(Command::SetProject("p1".into()))]);
    }

    #[test]
    fn test_import_watches_cursor_project() {
        let mut view = ProjectsView::new(10);
        view.replace(projects());
        let now = Instant::now();
        view.handle_key(key(KeyCode::Down), now);
        let effects = view.handle_key(key(KeyCode::Char('i')), now);
        assert_eq!(
            effects[0],
            Effect::Run(Command::WatchImport("p2".into()))
        );
        assert_eq!(view.name_of("p2"), Some("Beta"));
    }

    #[test]
    fn test_import_without_projects_warns() {
        let mut view = ProjectsView::new(10);
        let effects = view.handle_key(key(KeyCode::Char('i')), Instant::now());
        assert_eq!(effects, vec![Effect::warn("No project selected.")]);
    }

    #[test]
    fn test_date_column_is_formatted() {
        let project = &projects()[0];
        assert_eq!(project.cell("creation_date"), format_unix_date(1_700_000_000));
        assert!(project.cell("creation_date").contains("2023"));
    }
}
