//! Session guard against the identity provider.
//!
//! The identity provider answers `GET /sessions/whoami` with the active
//! session, 401 when there is none, and 403/422 when the session still needs
//! its second factor.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::auth::SessionToken;
use super::error::{ApiError, AuthRedirect, Result};
use super::types::Session;

const WHOAMI_TIMEOUT_SECS: u64 = 15;

/// Result of a session check.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// The session is valid.
    SignedIn(Session),
    /// The user has to go through the identity provider first.
    Redirect(AuthRedirect),
}

/// Error envelope returned by the identity provider.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
    #[serde(default)]
    redirect_browser_to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Client for the identity provider's session endpoints.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    identity_url: String,
}

impl IdentityClient {
    /// Create a client for an identity provider base URL.
    pub fn new(identity_url: &str) -> Result<Self> {
        if !identity_url.starts_with("http://") && !identity_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(identity_url.to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(WHOAMI_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::Network)?;
        Ok(Self {
            client,
            identity_url: identity_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the current session.
    ///
    /// # Errors
    ///
    /// `Unauthorized` on 401, `SecondFactorRequired` on 403/422 or when the
    /// provider reports `session_aal2_required`, other errors otherwise.
    #[instrument(skip(self, token))]
    pub async fn whoami(&self, token: &SessionToken) -> Result<Session> {
        let url = format!("{}/sessions/whoami", self.identity_url);
        let response = self
            .client
            .get(&url)
            .header(header::COOKIE, token.header_value())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let session: Session = response
                .json()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse session: {}", e)))?;
            info!(identity = %session.identity.id, "Session is active");
            return Ok(session);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, "whoami rejected the session");
        Err(classify_whoami_failure(status, &body, &url))
    }

    /// Check the session and turn auth failures into redirects.
    ///
    /// A missing token is a login redirect.
    #[instrument(skip(self, token))]
    pub async fn check(&self, token: Option<&SessionToken>) -> Result<GuardOutcome> {
        let Some(token) = token else {
            return Ok(GuardOutcome::Redirect(AuthRedirect::Login));
        };
        match self.whoami(token).await {
            Ok(session) => Ok(GuardOutcome::SignedIn(session)),
            Err(ApiError::Unauthorized) => Ok(GuardOutcome::Redirect(AuthRedirect::Login)),
            Err(ApiError::SecondFactorRequired) => {
                Ok(GuardOutcome::Redirect(AuthRedirect::SecondFactor))
            }
            Err(e) => {
                warn!("Session check failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Login page URL for a redirect target.
pub fn login_url(identity_url: &str, redirect: AuthRedirect) -> String {
    let base = format!(
        "{}/self-service/login/browser",
        identity_url.trim_end_matches('/')
    );
    match redirect {
        AuthRedirect::Login => base,
        AuthRedirect::SecondFactor => format!("{}?aal=aal2", base),
    }
}

/// Map an identity-provider error id to the redirect it asks for.
pub fn redirect_for_error_id(id: &str) -> Option<AuthRedirect> {
    match id {
        "session_aal2_required" => Some(AuthRedirect::SecondFactor),
        "session_refresh_required" | "session_inactive" | "no_active_session" => {
            Some(AuthRedirect::Login)
        }
        _ => None,
    }
}

fn classify_whoami_failure(status: StatusCode, body: &str, url: &str) -> ApiError {
    let envelope: Option<ErrorEnvelope> = serde_json::from_str(body).ok();
    let error_id = envelope
        .as_ref()
        .and_then(|e| e.error.as_ref())
        .and_then(|e| e.id.as_deref());

    if let Some(redirect) = error_id.and_then(redirect_for_error_id) {
        return match redirect {
            AuthRedirect::Login => ApiError::Unauthorized,
            AuthRedirect::SecondFactor => ApiError::SecondFactorRequired,
        };
    }

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::SecondFactorRequired
        }
        _ => {
            let reason = envelope
                .and_then(|e| {
                    e.error
                        .and_then(|b| b.reason)
                        .or(e.redirect_browser_to)
                })
                .filter(|r| !r.is_empty());
            match reason {
                Some(message) => ApiError::Rejected {
                    status: status.as_u16(),
                    message,
                },
                None => ApiError::from_status(status, url),
            }
        }
    }
}
