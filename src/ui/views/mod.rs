//! Application views (screens).
//!
//! Views never talk to the network. Input handlers return [`Effect`]s and
//! the app turns them into queued commands, toasts and navigation.

mod bookmarks;
mod detail;
mod export;
mod filesystem;
mod help;
mod import;
mod messages;
mod network;
mod projects;
mod report;
mod search;
mod sign_in;

pub use bookmarks::BookmarksView;
pub use detail::{DetailPanel, DetailTab};
pub use export::ExportView;
pub use filesystem::FilesystemView;
pub use help::{HelpAction, HelpView};
pub use import::ImportView;
pub use messages::MessagesView;
pub use network::NetworkView;
pub use projects::ProjectsView;
pub use report::ReportView;
pub use search::SearchView;
pub use sign_in::SignInView;

use crate::api::{AuthRedirect, RemoteFailure};
use crate::tasks::Command;
use crate::ui::components::Level;

/// Screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    SignIn,
    Projects,
    Filesystem,
    Search,
    Bookmarks,
    Network,
    Export,
    Report,
    Import,
}

impl Screen {
    /// Screens reachable from the tab bar, in order.
    pub const TABS: [Screen; 7] = [
        Screen::Projects,
        Screen::Filesystem,
        Screen::Search,
        Screen::Bookmarks,
        Screen::Network,
        Screen::Export,
        Screen::Report,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::SignIn => "Sign in",
            Screen::Projects => "Projects",
            Screen::Filesystem => "Filesystem",
            Screen::Search => "Search",
            Screen::Bookmarks => "Bookmarks",
            Screen::Network => "Network",
            Screen::Export => "Export",
            Screen::Report => "Report",
            Screen::Import => "Import",
        }
    }

    /// Position in the tab bar, if the screen has a tab.
    pub fn tab_index(&self) -> Option<usize> {
        Self::TABS.iter().position(|s| s == self)
    }
}

/// Something a view asks the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Queue remote work.
    Run(Command),
    /// Show a toast.
    Notify(Level, String),
    /// Switch screens.
    Navigate(Screen),
    /// Open a URL in the system browser.
    Open(String),
    /// Send the user through the identity provider.
    Redirect(AuthRedirect),
}

impl Effect {
    pub fn warn(message: impl Into<String>) -> Self {
        Effect::Notify(Level::Warning, message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Effect::Notify(Level::Error, message.into())
    }

    pub fn success(message: impl Into<String>) -> Self {
        Effect::Notify(Level::Success, message.into())
    }
}

/// Effects for a failed remote call: the sign-in flow for authentication
/// failures, an error toast otherwise.
pub fn failure_effects(failure: &RemoteFailure) -> Vec<Effect> {
    match failure.redirect() {
        Some(redirect) => vec![Effect::Redirect(redirect)],
        None => vec![Effect::error(failure.user_message())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, FailureKind};

    #[test]
    fn test_tab_indices() {
        assert_eq!(Screen::Projects.tab_index(), Some(0));
        assert_eq!(Screen::Report.tab_index(), Some(6));
        assert_eq!(Screen::Import.tab_index(), None);
        assert_eq!(Screen::SignIn.tab_index(), None);
    }

    #[test]
    fn test_failure_effects() {
        let auth = RemoteFailure::from(ApiError::SecondFactorRequired);
        assert_eq!(
            failure_effects(&auth),
            vec![Effect::Redirect(AuthRedirect::SecondFactor)]
        );

        let rejected = RemoteFailure {
            kind: FailureKind::Rejected,
            message: "Project name taken".into(),
        };
        assert_eq!(
            failure_effects(&rejected),
            vec![Effect::error("Project name taken")]
        );
    }
}
