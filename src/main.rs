//! casefile - a terminal client for an e-mail evidence investigation backend
//!
//! Browse projects, the evidence tree, search results, bookmarks and the
//! contact network, tag and bookmark messages, and export attachments.

mod actions;
mod api;
mod app;
mod config;
mod error;
mod events;
mod logging;
mod sanitize;
mod table;
mod tasks;
mod ui;

use std::io::{self, BufRead, Stdout, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info, warn};

use crate::api::auth::{delete_token, store_token};
use crate::api::{IdentityClient, SessionToken};
use crate::app::App;
use crate::config::{Config, Profile};
use crate::error::AppError;
use crate::events::EventHandler;
use crate::tasks::{create_task_channel, Dispatcher};

/// Profile name used when both URLs come from the command line.
const ADHOC_PROFILE: &str = "default";

#[derive(Debug, Parser)]
#[command(name = "casefile", version, about = "Terminal client for e-mail evidence investigations")]
struct Cli {
    /// Profile from config.toml to use.
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Backend base URL, overriding the profile.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Identity provider base URL, overriding the profile.
    #[arg(long, global = true)]
    identity_url: Option<String>,

    /// Log level (error, warn, info, debug, trace); wins over RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Store a session token for a profile in the OS keyring.
    ///
    /// With --api-url and --identity-url the profile is saved as well.
    Login,
    /// Remove the stored session token of a profile.
    Logout,
}

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref()).context("failed to initialise logging")?;

    let result = run(cli);
    if let Err(e) = &result {
        error!(error = %e, "casefile exited with an error");
    }
    logging::shutdown();
    result
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let profile = resolve_profile(
        &config,
        cli.profile.as_deref(),
        cli.api_url.as_deref(),
        cli.identity_url.as_deref(),
    )?;
    info!(profile = %profile.name, api_url = %profile.api_url, "Using profile");

    match cli.command {
        Some(CliCommand::Login) => login(config, &profile),
        Some(CliCommand::Logout) => {
            delete_token(&profile.name)?;
            println!("Removed the session token of profile '{}'.", profile.name);
            Ok(())
        }
        None => run_tui(&config, &profile),
    }
}

/// Pick the profile and apply command-line URL overrides.
fn resolve_profile(
    config: &Config,
    requested: Option<&str>,
    api_url: Option<&str>,
    identity_url: Option<&str>,
) -> Result<Profile> {
    let mut profile = match (config.resolve_profile(requested), api_url, identity_url) {
        (Ok(profile), _, _) => profile.clone(),
        // Both URLs given: no configured profile needed.
        (Err(_), Some(api), Some(identity)) => Profile::new(
            requested.unwrap_or(ADHOC_PROFILE).to_string(),
            api.to_string(),
            identity.to_string(),
        ),
        (Err(e), _, _) => return Err(e.into()),
    };
    if let Some(api) = api_url {
        profile.api_url = api.to_string();
    }
    if let Some(identity) = identity_url {
        profile.identity_url = identity.to_string();
    }
    profile.validate()?;
    Ok(profile)
}

/// Store a pasted token. Profiles given only on the command line are saved
/// to config.toml so later runs find them.
fn login(mut config: Config, profile: &Profile) -> Result<()> {
    println!(
        "Log in at {} and paste the session cookie value.",
        api::login_url(&profile.identity_url, api::AuthRedirect::Login)
    );
    print!("Session token: ");
    io::stdout().flush()?;

    let mut token = String::new();
    io::stdin().lock().read_line(&mut token)?;
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("no session token entered");
    }
    store_token(&profile.name, token)?;
    info!(profile = %profile.name, "Stored session token from the command line");
    println!("Stored the session token of profile '{}'.", profile.name);

    if config.profile(&profile.name) != Some(profile) {
        config.upsert_profile(profile.clone());
        config.save()?;
        println!(
            "Saved profile '{}' to {}.",
            profile.name,
            Config::config_path()?.display()
        );
    }
    Ok(())
}

fn run_tui(config: &Config, profile: &Profile) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    // Background tasks are spawned from the UI thread.
    let _guard = runtime.enter();

    let session = match SessionToken::from_keyring(&profile.name) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(error = %e, "No stored session token");
            None
        }
    };
    let identity = IdentityClient::new(&profile.identity_url)?;
    let (mut rx, spawner) = create_task_channel();
    let mut dispatcher =
        Dispatcher::new(spawner, identity, &profile.name, &profile.api_url, session)?;

    let mut app = App::new(profile, &config.settings);
    let events = EventHandler::with_tick_rate(config.settings.tick_rate_ms);

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, &events, &mut dispatcher, &mut rx);
    restore_terminal(&mut terminal)?;
    result
}

fn event_loop(
    terminal: &mut Tui,
    app: &mut App,
    events: &EventHandler,
    dispatcher: &mut Dispatcher,
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<tasks::ApiMessage>,
) -> Result<()> {
    while !app.should_quit() {
        terminal.draw(|frame| app.view(frame))?;

        app.update(events.next()?);

        while let Ok(message) = rx.try_recv() {
            app.handle_api_message(message);
        }

        // Results can queue follow-up work, so drain until quiet.
        loop {
            let commands = app.drain_commands();
            if commands.is_empty() {
                break;
            }
            for command in commands {
                let retry = command.clone();
                if let Err(e) = dispatcher.dispatch(command) {
                    app.handle_dispatch_error(retry, e);
                }
            }
        }

        for url in app.take_urls() {
            if let Err(e) = open::that(&url) {
                warn!(%url, error = %e, "Could not open URL");
            }
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().map_err(|e| AppError::terminal(e.to_string()))?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )
    .map_err(|e| AppError::terminal(e.to_string()))?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_toml(
            r#"
[[profiles]]
name = "lab"
api_url = "https://api.example.org"
identity_url = "https://id.example.org"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["casefile", "login", "--profile", "lab"]);
        assert!(matches!(cli.command, Some(CliCommand::Login)));
        assert_eq!(cli.profile.as_deref(), Some("lab"));

        let cli = Cli::parse_from(["casefile", "--log-level", "debug"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_url_overrides_apply_to_profile() {
        let profile =
            resolve_profile(&config(), None, Some("http://localhost:8080"), None).unwrap();
        assert_eq!(profile.name, "lab");
        assert_eq!(profile.api_url, "http://localhost:8080");
        assert_eq!(profile.identity_url, "https://id.example.org");
    }

    #[test]
    fn test_urls_alone_make_a_profile() {
        let profile = resolve_profile(
            &Config::default(),
            None,
            Some("http://localhost:8080"),
            Some("http://localhost:4433"),
        )
        .unwrap();
        assert_eq!(profile.name, ADHOC_PROFILE);
    }

    #[test]
    fn test_unknown_profile_without_urls_fails() {
        assert!(resolve_profile(&config(), Some("prod"), None, None).is_err());
        assert!(resolve_profile(&Config::default(), None, Some("http://x"), None).is_err());
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        assert!(resolve_profile(&config(), None, Some("ftp://nope"), None).is_err());
    }
}
