//! Centralized error types for casefile.
//!
//! This module provides a unified error hierarchy for the application with
//! user-friendly error messages. All error types use `thiserror`.

use thiserror::Error;

use crate::actions::BulkError;
use crate::api::error::ApiError;
use crate::config::ConfigError;

/// The main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Backend or identity provider errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// A refused bulk action.
    #[error("{0}")]
    Bulk(#[from] BulkError),

    /// IO errors (file system, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal-related errors.
    #[error("Terminal error: {0}")]
    Terminal(String),
}

impl AppError {
    /// Create a terminal error.
    pub fn terminal(msg: impl Into<String>) -> Self {
        AppError::Terminal(msg.into())
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::CreateDirError(_) => {
                    "Could not create configuration directory. Check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file exists and is readable.".to_string()
                }
                ConfigError::WriteError(_) => {
                    "Could not save configuration. Please check file permissions.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
                ConfigError::ProfileNotFound(name) => format!("Profile '{}' not found.", name),
            },
            AppError::Api(e) => match e {
                ApiError::Unauthorized => "Your session has expired. Please sign in.".to_string(),
                ApiError::SecondFactorRequired => {
                    "Please complete the second factor to continue.".to_string()
                }
                ApiError::Forbidden => {
                    "Access denied. You don't have permission to access this resource.".to_string()
                }
                ApiError::NotFound(resource) => format!("'{}' was not found.", resource),
                ApiError::RateLimited => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::Rejected { message, .. } => message.clone(),
                ApiError::ServerError(_) => "Backend error. Please try again later.".to_string(),
                ApiError::Network(_) => {
                    "Connection failed. Please check your network connection.".to_string()
                }
                ApiError::InvalidUrl(url) => format!("Invalid URL in configuration: {}", url),
                ApiError::Keyring(_) => {
                    "Could not access secure storage. Please sign in again.".to_string()
                }
                ApiError::InvalidResponse(_) => {
                    "Unexpected response from the backend. Please try again.".to_string()
                }
            },
            AppError::Bulk(e) => e.to_string(),
            AppError::Io(_) => {
                "A file operation failed. Please check file permissions.".to_string()
            }
            AppError::Terminal(msg) => format!("Terminal error: {}", msg),
        }
    }

    /// Check if this error is critical and requires user acknowledgment.
    ///
    /// Critical errors are shown in a modal dialog, everything else as a
    /// notification.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Api(ApiError::Forbidden)
                | AppError::Api(ApiError::Keyring(_))
                | AppError::Api(ApiError::InvalidUrl(_))
                | AppError::Terminal(_)
        )
    }

    /// Check if this error is recoverable.
    ///
    /// Recoverable errors can be retried or the user can continue working.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Api(ApiError::RateLimited)
                | AppError::Api(ApiError::ServerError(_))
                | AppError::Api(ApiError::Network(_))
                | AppError::Api(ApiError::NotFound(_))
                | AppError::Api(ApiError::Rejected { .. })
                | AppError::Bulk(_)
        )
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::NoConfigDir)
            | AppError::Config(ConfigError::ReadError(_)) => {
                Some("Pass --api-url and --identity-url, or create config.toml.")
            }
            AppError::Api(ApiError::Unauthorized) | AppError::Api(ApiError::Keyring(_)) => {
                Some("Run 'casefile login' or paste a session token on the sign-in screen.")
            }
            AppError::Api(ApiError::RateLimited) => {
                Some("Wait a few seconds and press 'r' to refresh.")
            }
            AppError::Api(ApiError::Network(_)) => {
                Some("Check your network connection and the backend URL.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::NoConfigDir.into();
        assert!(matches!(app_err, AppError::Config(ConfigError::NoConfigDir)));
    }

    #[test]
    fn test_app_error_from_api_error() {
        let app_err: AppError = ApiError::Unauthorized.into();
        assert!(matches!(app_err, AppError::Api(ApiError::Unauthorized)));
    }

    #[test]
    fn test_user_message_rejected_is_verbatim() {
        let err = AppError::Api(ApiError::Rejected {
            status: 400,
            message: "No project selected.".to_string(),
        });
        assert_eq!(err.user_message(), "No project selected.");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_user_message_not_found() {
        let err = AppError::Api(ApiError::NotFound("/bookmark/m1".to_string()));
        let msg = err.user_message();
        assert!(msg.contains("/bookmark/m1"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_user_message_bulk() {
        let err: AppError = BulkError::EmptySelection.into();
        assert_eq!(err.user_message(), "No messages selected.");
        assert!(!err.is_critical());
    }

    #[test]
    fn test_user_message_config_validation() {
        let err = AppError::Config(ConfigError::ValidationError(
            "duplicate profile name 'lab'".to_string(),
        ));
        assert!(err.user_message().contains("duplicate profile"));
        assert!(err.is_critical());
    }

    #[test]
    fn test_is_not_critical_rate_limited() {
        let err = AppError::Api(ApiError::RateLimited);
        assert!(!err.is_critical());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_is_not_recoverable_unauthorized() {
        let err = AppError::Api(ApiError::Unauthorized);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_suggested_action_unauthorized() {
        let err = AppError::Api(ApiError::Unauthorized);
        assert!(err.suggested_action().unwrap().contains("casefile login"));
    }

    #[test]
    fn test_terminal_error() {
        let err = AppError::terminal("test error");
        assert!(matches!(err, AppError::Terminal(_)));
        assert_eq!(err.user_message(), "Terminal error: test error");
    }
}
