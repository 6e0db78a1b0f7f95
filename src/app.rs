//! Main application state and event loop.
//!
//! This module implements The Elm Architecture (TEA) pattern for predictable
//! state management in the TUI application. Screens return [`Effect`]s; the
//! app applies them and queues [`Command`]s that the main loop hands to the
//! dispatcher. Responses come back through [`App::handle_api_message`].

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::{debug, error, info, trace, warn};

use crate::api::{ApiError, AuthRedirect, FailureKind, GuardOutcome, RemoteFailure};
use crate::config::{Profile, Settings};
use crate::error::AppError;
use crate::events::{is_quit_chord, tab_shortcut, Event};
use crate::logging;
use crate::tasks::{ApiMessage, Command, ListKind};
use crate::ui::components::Notification;
use crate::ui::theme::THEME;
use crate::ui::views::{
    failure_effects, BookmarksView, ExportView, FilesystemView, HelpAction, HelpView, ImportView,
    MessagesView, NetworkView, ProjectsView, ReportView, SearchView, SignInView,
};
use crate::ui::{
    render_context_help, Effect, ErrorDialog, LoadingIndicator, NotificationManager, Screen,
};

const APP_TITLE: &str = "casefile";

pub const NO_PROJECT: &str = "Open a project first.";

/// Screens that talk to the backend's active project.
fn needs_project(screen: Screen) -> bool {
    matches!(
        screen,
        Screen::Filesystem
            | Screen::Search
            | Screen::Bookmarks
            | Screen::Network
            | Screen::Export
            | Screen::Report
    )
}

/// The main application struct that holds all state.
///
/// This implements the Model part of The Elm Architecture (TEA).
pub struct App {
    screen: Screen,
    /// Screen to return to once the user has signed in.
    resume: Screen,
    /// Screen to open once the backend confirms a project switch.
    after_activation: Screen,
    show_help: bool,
    should_quit: bool,
    profile_name: String,
    user: Option<String>,
    active_project: Option<String>,

    sign_in: SignInView,
    projects: ProjectsView,
    filesystem: FilesystemView,
    search: SearchView,
    bookmarks: BookmarksView,
    network: NetworkView,
    export: ExportView,
    report: ReportView,
    import: ImportView,
    help: HelpView,

    notifications: NotificationManager,
    error_dialog: ErrorDialog,
    loading: LoadingIndicator,

    /// Commands waiting for the dispatcher.
    outbox: Vec<Command>,
    /// URLs waiting to be opened in the browser.
    urls: Vec<String>,
    /// Tab title areas from the last render, for mouse clicks.
    tab_areas: Vec<(Screen, Rect)>,
}

impl App {
    /// Create the application for `profile` and queue the session check.
    pub fn new(profile: &Profile, settings: &Settings) -> Self {
        debug!(profile = %profile.name, "Creating new application instance");
        let policy = settings.reconcile;
        let page_size = settings.page_size;
        let log_dir = logging::log_directory().map(|dir| dir.display().to_string());

        let mut app = Self {
            screen: Screen::Projects,
            resume: Screen::Projects,
            after_activation: Screen::Filesystem,
            show_help: false,
            should_quit: false,
            profile_name: profile.name.clone(),
            user: None,
            active_project: None,
            sign_in: SignInView::new(&profile.identity_url),
            projects: ProjectsView::new(page_size),
            filesystem: FilesystemView::new(policy, page_size),
            search: SearchView::new(policy, page_size),
            bookmarks: BookmarksView::new(policy, page_size),
            network: NetworkView::new(page_size),
            export: ExportView::new(),
            report: ReportView::new(),
            import: ImportView::new(),
            help: HelpView::new(log_dir),
            notifications: NotificationManager::new(),
            error_dialog: ErrorDialog::new(),
            loading: LoadingIndicator::new(),
            outbox: Vec::new(),
            urls: Vec::new(),
            tab_areas: Vec::new(),
        };
        app.queue(Command::CheckSession);
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Show an error: critical ones in the modal dialog, others as a toast.
    pub fn handle_error(&mut self, error: &AppError) {
        if error.is_recoverable() {
            warn!(error = %error, "Recoverable error");
        } else {
            error!(error = %error, "Application error");
        }
        if error.is_critical() {
            self.error_dialog.show(error);
        } else {
            self.notifications.error(error.user_message());
        }
    }

    /// Commands queued since the last call.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    /// URLs the user asked to open since the last call.
    pub fn take_urls(&mut self) -> Vec<String> {
        std::mem::take(&mut self.urls)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Update the application state based on an event.
    ///
    /// This implements the Update part of The Elm Architecture (TEA).
    pub fn update(&mut self, event: Event) {
        match event {
            Event::Quit => {
                info!("Quit event received");
                self.should_quit = true;
            }
            Event::Key(key) => {
                trace!(key = ?key.code, modifiers = ?key.modifiers, "Key event");
                self.handle_key_event(key);
            }
            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
            Event::Paste(text) => self.handle_paste(&text),
            Event::Resize(width, height) => {
                trace!(width, height, "Terminal resize event");
            }
            Event::Tick => self.handle_tick(Instant::now()),
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        // The error dialog blocks all other input.
        if self.error_dialog.is_visible() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                self.error_dialog.dismiss();
            }
            return;
        }

        if is_quit_chord(&key) {
            self.should_quit = true;
            return;
        }

        if self.show_help {
            if let Some(HelpAction::Close) = self.help.handle_input(key) {
                self.show_help = false;
            }
            return;
        }

        if !self.is_capturing() && self.handle_global_key(key) {
            return;
        }

        let effects = self.screen_key(key, Instant::now());
        self.apply(effects);
    }

    /// Keys that work on every screen unless it is capturing text.
    fn handle_global_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers == KeyModifiers::NONE {
            match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return true;
                }
                KeyCode::Char('?') => {
                    self.help.reset_scroll();
                    self.show_help = true;
                    return true;
                }
                _ => {}
            }
        }
        // The sign-in screen has no tab bar.
        if self.screen == Screen::SignIn {
            return false;
        }
        match key.code {
            KeyCode::Tab => {
                self.cycle_tab(1);
                true
            }
            KeyCode::BackTab => {
                self.cycle_tab(Screen::TABS.len() - 1);
                true
            }
            _ => match tab_shortcut(&key).and_then(|i| Screen::TABS.get(i)) {
                Some(&screen) => {
                    self.navigate(screen);
                    true
                }
                None => false,
            },
        }
    }

    fn cycle_tab(&mut self, step: usize) {
        let current = self.screen.tab_index().unwrap_or(0);
        let next = Screen::TABS[(current + step) % Screen::TABS.len()];
        self.navigate(next);
    }

    fn is_capturing(&self) -> bool {
        match self.screen {
            Screen::SignIn => self.sign_in.is_capturing(),
            Screen::Projects => self.projects.is_capturing(),
            Screen::Filesystem => self.filesystem.is_capturing(),
            Screen::Search => self.search.is_capturing(),
            Screen::Bookmarks => self.bookmarks.is_capturing(),
            Screen::Network => self.network.is_capturing(),
            Screen::Export => self.export.is_capturing(),
            Screen::Report | Screen::Import => false,
        }
    }

    fn screen_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        match self.screen {
            Screen::SignIn => self.sign_in.handle_key(key),
            Screen::Projects => self.projects.handle_key(key, now),
            Screen::Filesystem => self.filesystem.handle_key(key, now),
            Screen::Search => self.search.handle_key(key, now),
            Screen::Bookmarks => self.bookmarks.handle_key(key, now),
            Screen::Network => self.network.handle_key(key, now),
            Screen::Export => self.export.handle_key(key),
            Screen::Report => self.report.handle_key(key),
            Screen::Import => Vec::new(),
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if self.error_dialog.is_visible() || self.show_help {
            return;
        }
        if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
            let position = Position::new(mouse.column, mouse.row);
            let clicked = self
                .tab_areas
                .iter()
                .find(|(_, area)| area.contains(position))
                .map(|(screen, _)| *screen);
            if let Some(screen) = clicked {
                self.navigate(screen);
                return;
            }
        }
        let effects = match self.screen {
            Screen::Projects => self.projects.handle_mouse(mouse),
            Screen::Filesystem => self.filesystem.handle_mouse(mouse),
            Screen::Search => self.search.handle_mouse(mouse),
            Screen::Bookmarks => self.bookmarks.handle_mouse(mouse),
            Screen::Network => self.network.handle_mouse(mouse),
            _ => Vec::new(),
        };
        self.apply(effects);
    }

    fn handle_paste(&mut self, text: &str) {
        if self.error_dialog.is_visible() || self.show_help {
            return;
        }
        let now = Instant::now();
        match self.screen {
            Screen::SignIn => self.sign_in.handle_paste(text),
            Screen::Projects => self.projects.handle_paste(text, now),
            Screen::Filesystem => self.filesystem.handle_paste(text, now),
            Screen::Search => self.search.handle_paste(text, now),
            Screen::Bookmarks => self.bookmarks.handle_paste(text, now),
            Screen::Network => self.network.handle_paste(text, now),
            Screen::Export => self.export.handle_paste(text),
            Screen::Report | Screen::Import => {}
        }
    }

    /// Advance timers: table filters, the search debounce, toasts, spinner.
    fn handle_tick(&mut self, now: Instant) {
        self.loading.tick();
        self.notifications.tick(now);
        self.projects.tick(now);
        self.filesystem.tick(now);
        self.bookmarks.tick(now);
        self.network.tick(now);
        let effects = self.search.tick(now);
        self.apply(effects);
    }

    // ------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Run(command) => self.queue(command),
                Effect::Notify(level, message) => {
                    self.notifications
                        .push(Notification::new(message, level, Instant::now()));
                }
                Effect::Navigate(screen) => self.navigate(screen),
                Effect::Open(url) => {
                    debug!(%url, "Opening URL");
                    self.urls.push(url);
                }
                Effect::Redirect(redirect) => self.redirect(redirect),
            }
        }
    }

    fn queue(&mut self, command: Command) {
        match &command {
            // The import screen shows its own progress.
            Command::WatchImport(project) => {
                let label = self.projects.name_of(project).unwrap_or(project.as_str()).to_string();
                self.import.start(project, &label);
            }
            other => self.loading.start(other.label()),
        }
        debug!(command = command.label(), "Queued command");
        self.outbox.push(command);
    }

    fn navigate(&mut self, screen: Screen) {
        if needs_project(screen) && self.active_project.is_none() {
            self.notifications.warning(NO_PROJECT);
            return;
        }
        if self.screen == screen {
            return;
        }
        debug!(from = ?self.screen, to = ?screen, "Switching screen");
        self.screen = screen;
        match screen {
            Screen::Filesystem if !self.filesystem.is_loaded() => self.queue(Command::FetchTree),
            Screen::Bookmarks => {
                let effects = self.bookmarks.reload();
                self.apply(effects);
            }
            Screen::Network if !self.network.is_loaded() => self.queue(Command::FetchNetwork),
            _ => {}
        }
    }

    fn redirect(&mut self, redirect: AuthRedirect) {
        info!(?redirect, "Session needs sign-in");
        self.sign_in.set_redirect(redirect);
        if self.screen != Screen::SignIn {
            self.resume = self.screen;
            self.screen = Screen::SignIn;
        }
    }

    fn messages_of(&mut self, list: ListKind) -> &mut MessagesView {
        match list {
            ListKind::Filesystem => self.filesystem.messages_mut(),
            ListKind::Search => self.search.messages_mut(),
            ListKind::Bookmarks => self.bookmarks.messages_mut(),
        }
    }

    /// Forget everything that belongs to the previously active project.
    fn reset_project_views(&mut self) {
        self.filesystem.reset();
        self.search.reset();
        self.bookmarks.messages_mut().replace(Vec::new());
        self.network.reset();
        self.export = ExportView::new();
        self.report = ReportView::new();
    }

    // ------------------------------------------------------------------
    // Remote results
    // ------------------------------------------------------------------

    /// Route a background task result to its screen.
    pub fn handle_api_message(&mut self, message: ApiMessage) {
        if let Some(label) = response_label(&message) {
            self.loading.stop(label);
        }
        let effects = match message {
            ApiMessage::SessionChecked(result) => self.session_checked(result),
            ApiMessage::ProjectsFetched(result) => match result {
                Ok(projects) => {
                    debug!(count = projects.len(), "Projects loaded");
                    self.projects.replace(projects);
                    Vec::new()
                }
                Err(failure) => failure_effects(&failure),
            },
            ApiMessage::ProjectCreated(result) => match result {
                Ok(project) => {
                    info!(project = %project.name, "Project created");
                    let message = format!("Created project {}.", project.name);
                    self.projects.created(project);
                    vec![Effect::success(message)]
                }
                Err(failure) => failure_effects(&failure),
            },
            ApiMessage::ProjectActivated { uuid, result } => {
                let target = std::mem::replace(&mut self.after_activation, Screen::Filesystem);
                match result {
                    Ok(()) => {
                        info!(project = %uuid, "Project activated");
                        self.reset_project_views();
                        self.active_project = Some(uuid);
                        vec![Effect::Navigate(target)]
                    }
                    Err(failure) => failure_effects(&failure),
                }
            }
            ApiMessage::TreeFetched(result) => self.filesystem.set_tree(result),
            ApiMessage::MessagesFetched {
                list,
                generation,
                result,
            } => match list {
                ListKind::Filesystem => self.filesystem.apply_results(generation, result),
                ListKind::Search => self.search.apply_results(generation, result),
                ListKind::Bookmarks => self.bookmarks.apply_results(generation, result),
            },
            ApiMessage::BulkCompleted {
                list,
                ticket,
                result,
            } => self.messages_of(list).complete(ticket, result),
            ApiMessage::NetworkFetched(result) => self.network.set_graph(result),
            ApiMessage::ExportFinished(result) => self.export.finished(result),
            ApiMessage::ReportFinished(result) => self.report.finished(result),
            ApiMessage::ImportProgress { project, result } => {
                let effects = self.import.progress(&project, result);
                // A finished import lands on the network of its project.
                if effects
                    .iter()
                    .any(|e| matches!(e, Effect::Run(Command::SetProject(_))))
                {
                    self.after_activation = Screen::Network;
                }
                effects
            }
            ApiMessage::ImportStreamClosed { project } => self.import.closed(&project),
        };
        self.apply(effects);
    }

    fn session_checked(&mut self, result: Result<GuardOutcome, RemoteFailure>) -> Vec<Effect> {
        match result {
            Ok(GuardOutcome::SignedIn(session)) => {
                let name = session.display_name();
                info!(user = %name, "Signed in");
                self.user = Some(name);
                if self.screen == Screen::SignIn {
                    self.screen = self.resume;
                }
                vec![Effect::Run(Command::FetchProjects)]
            }
            Ok(GuardOutcome::Redirect(redirect)) => vec![Effect::Redirect(redirect)],
            Err(failure) => failure_effects(&failure),
        }
    }

    /// A command could not be started; fail it the way its task would have.
    pub fn handle_dispatch_error(&mut self, command: Command, error: ApiError) {
        warn!(command = command.label(), error = %error, "Could not start request");
        let failure = if error.is_auth() {
            RemoteFailure::from(error)
        } else {
            let error = AppError::from(error);
            if error.is_critical() {
                self.handle_error(&error);
            }
            RemoteFailure {
                kind: FailureKind::Generic,
                message: error.user_message(),
            }
        };
        for message in command.into_failures(failure) {
            self.handle_api_message(message);
        }
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    /// Render the application UI.
    ///
    /// This implements the View part of The Elm Architecture (TEA).
    pub fn view(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Min(1),    // Content
                Constraint::Length(1), // Footer
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.render_content(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);

        self.notifications.render(frame, area);
        if self.show_help {
            self.help.render(frame, chunks[1]);
        }
        self.error_dialog.render(frame, area);
    }

    fn render_header(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(THEME.border_style(false));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut spans = vec![Span::styled(format!(" {} ", APP_TITLE), THEME.header_style())];
        let mut x = inner.x + APP_TITLE.len() as u16 + 2;
        self.tab_areas.clear();
        if self.screen != Screen::SignIn {
            for (i, screen) in Screen::TABS.iter().enumerate() {
                let label = format!(" {} {} ", i + 1, screen.title());
                let width = label.chars().count() as u16;
                self.tab_areas
                    .push((*screen, Rect::new(x, inner.y, width, 1).intersection(inner)));
                spans.push(Span::styled(label, THEME.tab_style(*screen == self.screen)));
                x += width;
            }
            if self.screen == Screen::Import {
                spans.push(Span::styled(" Import ", THEME.tab_style(true)));
            }
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), inner);

        let who = match &self.user {
            Some(user) => format!("{} @ {} ", user, self.profile_name),
            None => format!("{} ", self.profile_name),
        };
        frame.render_widget(
            Paragraph::new(Span::styled(who, THEME.muted_style())).alignment(Alignment::Right),
            inner,
        );
    }

    fn render_content(&mut self, frame: &mut Frame, area: Rect) {
        match self.screen {
            Screen::SignIn => self.sign_in.render(frame, area),
            Screen::Projects => self.projects.render(frame, area),
            Screen::Filesystem => self.filesystem.render(frame, area),
            Screen::Search => self.search.render(frame, area),
            Screen::Bookmarks => self.bookmarks.render(frame, area),
            Screen::Network => self.network.render(frame, area),
            Screen::Export => self.export.render(frame, area),
            Screen::Report => self.report.render(frame, area),
            Screen::Import => self.import.render(frame, area),
        }
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let hints = if self.show_help {
            "[j/k] scroll  [Esc/q/?] close help"
        } else {
            self.hints()
        };
        if self.loading.is_active() {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(1), Constraint::Length(28)])
                .split(area);
            render_context_help(frame, chunks[0], hints);
            self.loading.render(frame, chunks[1]);
        } else {
            render_context_help(frame, area, hints);
        }
    }

    fn hints(&self) -> &'static str {
        match self.screen {
            Screen::SignIn => self.sign_in.hints(),
            Screen::Projects => self.projects.hints(),
            Screen::Filesystem => self.filesystem.hints(),
            Screen::Search => self.search.hints(),
            Screen::Bookmarks => self.bookmarks.hints(),
            Screen::Network => self.network.hints(),
            Screen::Export => self.export.hints(),
            Screen::Report => self.report.hints(),
            Screen::Import => self.import.hints(),
        }
    }
}

/// Loading-indicator label of the command a response answers.
fn response_label(message: &ApiMessage) -> Option<&'static str> {
    let command = match message {
        ApiMessage::SessionChecked(_) => Command::CheckSession,
        ApiMessage::ProjectsFetched(_) => Command::FetchProjects,
        ApiMessage::ProjectCreated(_) => Command::CreateProject(String::new()),
        ApiMessage::ProjectActivated { .. } => Command::SetProject(String::new()),
        ApiMessage::TreeFetched(_) => Command::FetchTree,
        ApiMessage::MessagesFetched {
            list: ListKind::Bookmarks,
            generation,
            ..
        } => Command::FetchBookmarks {
            generation: *generation,
        },
        ApiMessage::MessagesFetched { .. } => return Some("Searching..."),
        ApiMessage::BulkCompleted { .. } => return Some("Saving changes..."),
        ApiMessage::NetworkFetched(_) => Command::FetchNetwork,
        ApiMessage::ExportFinished(_) => Command::Export(String::new()),
        ApiMessage::ReportFinished(_) => Command::Report,
        ApiMessage::ImportProgress { .. } | ApiMessage::ImportStreamClosed { .. } => return None,
    };
    Some(command.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Identity, Message, Project, Session};
    use crate::api::ImportEvent;
    use crate::ui::Level;

    fn profile() -> Profile {
        Profile::new(
            "lab".into(),
            "http://localhost:8080".into(),
            "http://localhost:4433".into(),
        )
    }

    fn app() -> App {
        let mut app = App::new(&profile(), &Settings::default());
        app.drain_commands();
        app
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn session() -> Session {
        Session {
            id: "s1".into(),
            active: true,
            authenticator_assurance_level: Some("aal1".into()),
            identity: Identity {
                id: "i1".into(),
                traits: serde_json::json!({ "email": "analyst@example.com" }),
            },
        }
    }

    fn project(uuid: &str, name: &str) -> Project {
        Project {
            uuid: uuid.into(),
            name: name.into(),
            creation_date: 1_700_000_000,
        }
    }

    fn message(id: &str) -> Message {
        Message {
            uuid: id.into(),
            ..Message::default()
        }
    }

    fn open_project(app: &mut App, uuid: &str) {
        app.handle_api_message(ApiMessage::ProjectActivated {
            uuid: uuid.into(),
            result: Ok(()),
        });
    }

    fn has_notification(app: &App, level: Level, text: &str) -> bool {
        app.notifications
            .iter()
            .any(|n| n.level == level && n.message == text)
    }

    #[test]
    fn test_new_queues_session_check() {
        let mut app = App::new(&profile(), &Settings::default());
        assert_eq!(app.drain_commands(), vec![Command::CheckSession]);
        assert!(app.loading.is_active());
        assert_eq!(app.screen, Screen::Projects);
        assert!(app.drain_commands().is_empty());
    }

    #[test]
    fn test_quit_on_q_key() {
        let mut app = app();
        app.update(key(KeyCode::Char('q')));
        assert!(app.should_quit());
    }

    #[test]
    fn test_quit_on_ctrl_c() {
        let mut app = app();
        app.update(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit());
    }

    #[test]
    fn test_quit_event() {
        let mut app = app();
        app.update(Event::Quit);
        assert!(app.should_quit());
    }

    #[test]
    fn test_help_on_question_mark_and_escape_closes() {
        let mut app = app();
        app.update(key(KeyCode::Char('?')));
        assert!(app.show_help);

        // Keys go to the help overlay, not the screen.
        app.update(key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(!app.should_quit());

        app.update(key(KeyCode::Char('?')));
        app.update(key(KeyCode::Esc));
        assert!(!app.show_help);
    }

    #[test]
    fn test_error_dialog_blocks_input() {
        let mut app = app();
        app.handle_error(&AppError::Api(ApiError::Forbidden));
        assert!(app.error_dialog.is_visible());

        app.update(key(KeyCode::Char('q')));
        assert!(!app.should_quit());
        assert!(app.error_dialog.is_visible());

        app.update(key(KeyCode::Esc));
        assert!(!app.error_dialog.is_visible());
    }

    #[test]
    fn test_error_dialog_dismiss_with_enter() {
        let mut app = app();
        app.handle_error(&AppError::Api(ApiError::Forbidden));
        app.update(key(KeyCode::Enter));
        assert!(!app.error_dialog.is_visible());
    }

    #[test]
    fn test_recoverable_error_is_a_toast() {
        let mut app = app();
        app.handle_error(&AppError::Api(ApiError::RateLimited));
        assert!(!app.error_dialog.is_visible());
        assert_eq!(app.notifications.len(), 1);
    }

    #[test]
    fn test_redirect_then_sign_in_resumes() {
        let mut app = app();
        app.handle_api_message(ApiMessage::SessionChecked(Ok(GuardOutcome::Redirect(
            AuthRedirect::SecondFactor,
        ))));
        assert_eq!(app.screen, Screen::SignIn);
        assert!(!app.loading.is_active());

        // Tab shortcuts are off while signing in.
        app.update(key(KeyCode::Char('2')));
        assert_eq!(app.screen, Screen::SignIn);

        app.handle_api_message(ApiMessage::SessionChecked(Ok(GuardOutcome::SignedIn(
            session(),
        ))));
        assert_eq!(app.screen, Screen::Projects);
        assert_eq!(app.user.as_deref(), Some("analyst@example.com"));
        assert_eq!(app.drain_commands(), vec![Command::FetchProjects]);
    }

    #[test]
    fn test_project_screens_need_an_active_project() {
        let mut app = app();
        app.update(key(KeyCode::Char('2')));
        assert_eq!(app.screen, Screen::Projects);
        assert!(has_notification(&app, Level::Warning, NO_PROJECT));
        assert!(app.drain_commands().is_empty());
    }

    #[test]
    fn test_project_activation_opens_filesystem() {
        let mut app = app();
        open_project(&mut app, "p1");
        assert_eq!(app.active_project.as_deref(), Some("p1"));
        assert_eq!(app.screen, Screen::Filesystem);
        assert_eq!(app.drain_commands(), vec![Command::FetchTree]);
    }

    #[test]
    fn test_tab_cycles_and_loads_lazily() {
        let mut app = app();
        open_project(&mut app, "p1");
        app.drain_commands();

        app.update(key(KeyCode::Tab));
        assert_eq!(app.screen, Screen::Search);
        app.update(key(KeyCode::Esc)); // leave the query box
        app.update(key(KeyCode::Tab));
        assert_eq!(app.screen, Screen::Bookmarks);
        assert!(matches!(
            app.drain_commands().as_slice(),
            [Command::FetchBookmarks { .. }]
        ));

        app.update(key(KeyCode::Char('5')));
        assert_eq!(app.screen, Screen::Network);
        assert_eq!(app.drain_commands(), vec![Command::FetchNetwork]);

        app.update(Event::Key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)));
        assert_eq!(app.screen, Screen::Bookmarks);
    }

    #[test]
    fn test_search_typing_does_not_switch_tabs() {
        let mut app = app();
        open_project(&mut app, "p1");
        app.update(key(KeyCode::Char('3')));
        assert_eq!(app.screen, Screen::Search);

        app.update(key(KeyCode::Char('1')));
        app.update(key(KeyCode::Char('q')));
        assert_eq!(app.screen, Screen::Search);
        assert!(!app.should_quit());
        assert_eq!(app.search.query(), "1q");
    }

    #[test]
    fn test_bookmark_results_are_routed_by_generation() {
        let mut app = app();
        open_project(&mut app, "p1");
        app.drain_commands();
        app.update(key(KeyCode::Char('4')));
        let generation = match app.drain_commands().as_slice() {
            [Command::FetchBookmarks { generation }] => *generation,
            other => panic!("Unexpected commands {:?}", other),
        };

        app.handle_api_message(ApiMessage::MessagesFetched {
            list: ListKind::Bookmarks,
            generation: generation - 1,
            result: Ok(vec![message("stale")]),
        });
        assert!(app.bookmarks.messages_mut().records().is_empty());

        app.handle_api_message(ApiMessage::MessagesFetched {
            list: ListKind::Bookmarks,
            generation,
            result: Ok(vec![message("m1"), message("m2")]),
        });
        assert_eq!(app.bookmarks.messages_mut().records().len(), 2);
    }

    #[test]
    fn test_expired_session_during_fetch_redirects() {
        let mut app = app();
        app.handle_api_message(ApiMessage::ProjectsFetched(Err(RemoteFailure::from(
            ApiError::Unauthorized,
        ))));
        assert_eq!(app.screen, Screen::SignIn);
        assert!(app.notifications.is_empty());
    }

    #[test]
    fn test_dispatch_error_without_session_redirects() {
        let mut app = app();
        app.handle_dispatch_error(Command::FetchProjects, ApiError::Unauthorized);
        assert_eq!(app.screen, Screen::SignIn);
    }

    #[test]
    fn test_critical_dispatch_error_shows_dialog() {
        let mut app = app();
        app.handle_dispatch_error(
            Command::SignIn("token".into()),
            ApiError::Keyring("locked".into()),
        );
        assert!(app.error_dialog.is_visible());
    }

    #[test]
    fn test_project_created_is_listed() {
        let mut app = app();
        app.handle_api_message(ApiMessage::ProjectsFetched(Ok(vec![project("p1", "Alpha")])));
        app.handle_api_message(ApiMessage::ProjectCreated(Ok(project("p2", "Beta"))));
        assert_eq!(app.projects.records().len(), 2);
        assert!(has_notification(&app, Level::Success, "Created project Beta."));
    }

    #[test]
    fn test_import_completion_lands_on_network() {
        let mut app = app();
        app.handle_api_message(ApiMessage::ProjectsFetched(Ok(vec![project("p1", "Alpha")])));
        app.apply(vec![
            Effect::Run(Command::WatchImport("p1".into())),
            Effect::Navigate(Screen::Import),
        ]);
        assert_eq!(app.screen, Screen::Import);
        assert_eq!(app.drain_commands(), vec![Command::WatchImport("p1".into())]);

        app.handle_api_message(ApiMessage::ImportProgress {
            project: "p1".into(),
            result: Ok(ImportEvent::Complete),
        });
        assert_eq!(app.drain_commands(), vec![Command::SetProject("p1".into())]);

        open_project(&mut app, "p1");
        assert_eq!(app.screen, Screen::Network);
        assert_eq!(app.drain_commands(), vec![Command::FetchNetwork]);
    }

    #[test]
    fn test_open_effects_are_collected() {
        let mut app = app();
        app.apply(vec![Effect::Open("http://localhost:8080/file/a.zip".into())]);
        assert_eq!(app.take_urls(), vec!["http://localhost:8080/file/a.zip".to_string()]);
        assert!(app.take_urls().is_empty());
    }

    #[test]
    fn test_notifications_survive_a_tick() {
        let mut app = app();
        app.apply(vec![Effect::warn("Careful")]);
        app.update(Event::Tick);
        assert_eq!(app.notifications.len(), 1);
    }
}
