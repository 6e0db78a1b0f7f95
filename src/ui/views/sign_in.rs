//! Sign-in screen shown when the session is missing or needs a second factor.
//!
//! Login happens in the browser at the identity provider. The user pastes the
//! resulting session token here; it goes to the OS keyring and is re-checked.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::Effect;
use crate::api::{login_url, AuthRedirect};
use crate::tasks::Command;
use crate::ui::components::TextInput;
use crate::ui::theme::THEME;

pub const NO_TOKEN: &str = "Please paste a session token.";

pub struct SignInView {
    identity_url: String,
    redirect: AuthRedirect,
    token: TextInput,
    editing: bool,
}

impl SignInView {
    pub fn new(identity_url: &str) -> Self {
        Self {
            identity_url: identity_url.to_string(),
            redirect: AuthRedirect::Login,
            token: TextInput::masked().with_placeholder("ory_kratos_session value"),
            editing: false,
        }
    }

    pub fn set_redirect(&mut self, redirect: AuthRedirect) {
        self.redirect = redirect;
        self.token.clear();
    }

    pub fn login_url(&self) -> String {
        login_url(&self.identity_url, self.redirect)
    }

    pub fn is_capturing(&self) -> bool {
        self.editing
    }

    pub fn hints(&self) -> &'static str {
        if self.editing {
            "[Enter] sign in  [Esc] stop editing"
        } else {
            "[o] open login page  [t] enter token  [Enter] sign in"
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if self.editing {
            return match key.code {
                KeyCode::Esc => {
                    self.editing = false;
                    Vec::new()
                }
                KeyCode::Enter => self.submit(),
                _ => {
                    self.token.handle_input(key);
                    Vec::new()
                }
            };
        }

        if key.modifiers != KeyModifiers::NONE {
            return Vec::new();
        }
        match key.code {
            KeyCode::Char('o') => vec![Effect::Open(self.login_url())],
            KeyCode::Char('t') | KeyCode::Char('i') => {
                self.editing = true;
                Vec::new()
            }
            KeyCode::Enter => self.submit(),
            _ => Vec::new(),
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.editing = true;
        self.token.insert_str(text.trim());
    }

    fn submit(&mut self) -> Vec<Effect> {
        let token = self.token.value().trim().to_string();
        if token.is_empty() {
            self.editing = true;
            return vec![Effect::warn(NO_TOKEN)];
        }
        self.token.clear();
        self.editing = false;
        vec![Effect::Run(Command::SignIn(token))]
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Sign in ")
            .borders(Borders::ALL)
            .border_style(THEME.border_style(!self.editing));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Length(3), Constraint::Min(0)])
            .split(inner);

        let reason = match self.redirect {
            AuthRedirect::Login => "Your session is missing or has expired.",
            AuthRedirect::SecondFactor => "This session needs a second factor.",
        };
        let lines = vec![
            Line::from(reason),
            Line::from(""),
            Line::from(vec![
                Span::styled("Log in at: ", THEME.header_style()),
                Span::raw(self.login_url()),
            ]),
            Line::from(Span::styled(
                "Then paste the session cookie value below.",
                THEME.muted_style(),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[0]);
        self.token
            .render(frame, chunks[1], "Session token", self.editing);
    }
}
