//! Session credentials.
//!
//! The identity provider issues a session token after login. The client
//! keeps it in the OS keyring and presents it as a cookie on every request,
//! both to the identity provider and to the backend.

use super::error::{ApiError, Result};

/// The keyring service name for session tokens.
const KEYRING_SERVICE: &str = "casefile";

/// Name of the session cookie issued by the identity provider.
pub const SESSION_COOKIE: &str = "ory_kratos_session";

/// Session credentials for HTTP requests.
#[derive(Clone)]
pub struct SessionToken {
    /// Complete `Cookie` header value.
    cookie_header: String,
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken").finish_non_exhaustive()
    }
}

impl SessionToken {
    /// Wrap a raw session token.
    pub fn new(token: &str) -> Self {
        Self {
            cookie_header: build_cookie_header(token.trim()),
        }
    }

    /// Load the session token stored for a profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be retrieved from the keyring.
    pub fn from_keyring(profile_name: &str) -> Result<Self> {
        let token = get_token(profile_name)?;
        Ok(Self::new(&token))
    }

    /// The `Cookie` header value.
    pub fn header_value(&self) -> &str {
        &self.cookie_header
    }
}

/// Build the `Cookie` header value carrying the session token.
fn build_cookie_header(token: &str) -> String {
    format!("{}={}", SESSION_COOKIE, token)
}

/// Store a session token in the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be stored in the keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to create keyring entry: {}", e)))?;

    entry
        .set_password(token.trim())
        .map_err(|e| ApiError::Keyring(format!("failed to store token: {}", e)))?;

    Ok(())
}

/// Retrieve a session token from the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be retrieved from the keyring.
pub fn get_token(profile_name: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .get_password()
        .map_err(|e| ApiError::Keyring(format!("failed to retrieve token: {}", e)))
}

/// Delete a session token from the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be deleted from the keyring.
pub fn delete_token(profile_name: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .delete_password()
        .map_err(|e| ApiError::Keyring(format!("failed to delete token: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header() {
        let header = build_cookie_header("abc123");
        assert_eq!(header, "ory_kratos_session=abc123");
    }

    #[test]
    fn test_token_is_trimmed() {
        let token = SessionToken::new("  abc123\n");
        assert_eq!(token.header_value(), "ory_kratos_session=abc123");
    }

    #[test]
    fn test_session_token_does_not_expose_secret() {
        let token = SessionToken::new("secret_session");
        let debug_output = format!("{:?}", token);
        assert!(!debug_output.contains("secret_session"));
    }
}
