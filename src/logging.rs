//! Logging configuration using the tracing ecosystem.
//!
//! This module configures structured logging with:
//! - File-based output (to keep the terminal UI intact)
//! - Daily log rotation
//! - Environment-based log level configuration

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log filter if neither `--log-level` nor `RUST_LOG` is set.
const DEFAULT_LOG_FILTER: &str = "casefile=info,warn";

/// Initialize the logging system.
///
/// Logs go to a daily rotating file in the platform's local data directory
/// (`~/.local/share/casefile/logs/` on Linux). The filter comes from
/// `level` when given (e.g. `--log-level debug` becomes `casefile=debug,warn`),
/// otherwise from `RUST_LOG`, otherwise [`DEFAULT_LOG_FILTER`].
///
/// # Errors
///
/// Returns an error if the log directory cannot be determined or created,
/// or the tracing subscriber cannot be set.
pub fn init(level: Option<&str>) -> anyhow::Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "casefile.log");

    let filter = match level {
        Some(level) => EnvFilter::try_new(filter_for_level(level))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "casefile starting up");
    tracing::debug!(log_dir = %log_dir.display(), "Log directory");

    Ok(())
}

/// Filter directive for a bare level name.
fn filter_for_level(level: &str) -> String {
    format!("casefile={},warn", level.trim().to_ascii_lowercase())
}

/// Get the log directory path.
fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("casefile").join("logs"))
}

/// Get the path where logs are stored, for the help screen.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}

/// Log application shutdown.
pub fn shutdown() {
    tracing::info!("casefile shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_has_expected_structure() {
        let dir = get_log_directory().unwrap();
        assert!(dir.ends_with("casefile/logs"));
        assert_eq!(log_directory(), Some(dir));
    }

    #[test]
    fn test_filter_for_level() {
        assert_eq!(filter_for_level("DEBUG"), "casefile=debug,warn");
        assert!(EnvFilter::try_new(filter_for_level("trace")).is_ok());
    }
}
