//! API error types for the backend gateway and the identity provider.

use thiserror::Error;

/// Errors that can occur when talking to the backend or identity provider.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session - the user has to sign in.
    #[error("Not signed in: the session is missing or expired")]
    Unauthorized,

    /// The session exists but has not completed its second factor.
    #[error("Second factor required to continue this session")]
    SecondFactorRequired,

    /// Permission denied - user lacks access to the resource.
    #[error("Permission denied: you don't have access to this resource")]
    Forbidden,

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited: please wait before retrying")]
    RateLimited,

    /// Backend error without a usable message.
    #[error("Server error: {0}")]
    ServerError(String),

    /// The backend refused the request and said why.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Network or HTTP error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Keyring error when storing/retrieving session tokens.
    #[error("Keyring error: {0}")]
    Keyring(String),

    /// Response body did not have the expected shape.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(context.to_string()),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, context)),
            _ => ApiError::ServerError(format!("Unexpected HTTP {}: {}", status, context)),
        }
    }

    /// Whether the user must be sent through the sign-in flow.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::SecondFactorRequired)
    }
}

/// Where an authentication failure has to send the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRedirect {
    /// Plain login.
    Login,
    /// Login at the second-factor assurance level.
    SecondFactor,
}

/// How a failed remote call is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Route to the sign-in screen instead of showing an error.
    Auth(AuthRedirect),
    /// The server supplied a message; show it verbatim.
    Rejected,
    /// No usable payload; show a generic failure.
    Generic,
}

/// A failed remote call reduced to what the UI needs.
///
/// Background tasks send this instead of `ApiError`, which is not `Clone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl RemoteFailure {
    /// Text for a notification.
    pub fn user_message(&self) -> String {
        match self.kind {
            FailureKind::Rejected => self.message.clone(),
            FailureKind::Generic => format!("Request failed: {}", self.message),
            FailureKind::Auth(AuthRedirect::Login) => "Please sign in again.".to_string(),
            FailureKind::Auth(AuthRedirect::SecondFactor) => {
                "Please complete the second factor.".to_string()
            }
        }
    }

    /// The redirect this failure calls for, if any.
    pub fn redirect(&self) -> Option<AuthRedirect> {
        match self.kind {
            FailureKind::Auth(redirect) => Some(redirect),
            _ => None,
        }
    }
}

impl From<ApiError> for RemoteFailure {
    fn from(error: ApiError) -> Self {
        let kind = match &error {
            ApiError::Unauthorized => FailureKind::Auth(AuthRedirect::Login),
            ApiError::SecondFactorRequired => FailureKind::Auth(AuthRedirect::SecondFactor),
            ApiError::Rejected { .. } => FailureKind::Rejected,
            _ => FailureKind::Generic,
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_error_from_status_401() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "test");
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(err.is_auth());
    }

    #[test]
    fn test_error_from_status_403() {
        let err = ApiError::from_status(StatusCode::FORBIDDEN, "test");
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[test]
    fn test_error_from_status_404() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "/bookmark/m1");
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "/bookmark/m1"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_error_from_status_429() {
        let err = ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, "test");
        assert!(matches!(err, ApiError::RateLimited));
    }

    #[test]
    fn test_error_from_status_500() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "test");
        assert!(matches!(err, ApiError::ServerError(_)));
    }

    #[test]
    fn test_rejected_is_shown_verbatim() {
        let failure = RemoteFailure::from(ApiError::Rejected {
            status: 400,
            message: "Project not selected.".into(),
        });
        assert_eq!(failure.kind, FailureKind::Rejected);
        assert_eq!(failure.user_message(), "Project not selected.");
        assert_eq!(failure.redirect(), None);
    }

    #[test]
    fn test_generic_failure_message() {
        let failure = RemoteFailure::from(ApiError::InvalidResponse("bad json".into()));
        assert_eq!(failure.kind, FailureKind::Generic);
        assert_eq!(
            failure.user_message(),
            "Request failed: Invalid API response: bad json"
        );
    }

    #[test]
    fn test_auth_failures_redirect() {
        let login = RemoteFailure::from(ApiError::Unauthorized);
        assert_eq!(login.redirect(), Some(AuthRedirect::Login));
        let aal2 = RemoteFailure::from(ApiError::SecondFactorRequired);
        assert_eq!(aal2.redirect(), Some(AuthRedirect::SecondFactor));
    }
}
