//! Connection profile configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// A connection profile.
///
/// Profiles store where the investigation backend and its identity provider
/// live. Session tokens are stored separately in the OS keychain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// The name of this profile.
    ///
    /// Must be non-empty and unique across all profiles.
    pub name: String,

    /// Base URL of the investigation backend API.
    pub api_url: String,

    /// Base URL of the identity provider.
    pub identity_url: String,
}

impl Profile {
    /// Create a new profile.
    pub fn new(name: String, api_url: String, identity_url: String) -> Self {
        Self {
            name,
            api_url,
            identity_url,
        }
    }

    /// Validate this profile.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` naming the profile if the
    /// name is empty or contains whitespace, or a URL is not http(s).
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "profile name cannot be empty".to_string(),
            ));
        }

        if self.name.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "profile name '{}' cannot contain whitespace",
                self.name
            )));
        }

        validate_url(&self.name, "api_url", &self.api_url)?;
        validate_url(&self.name, "identity_url", &self.identity_url)?;
        Ok(())
    }
}

fn validate_url(profile: &str, field: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "profile '{}': {} cannot be empty",
            profile, field
        )));
    }

    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(ConfigError::ValidationError(format!(
            "profile '{}': {} must start with http:// or https://",
            profile, field
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lab() -> Profile {
        Profile::new(
            "lab".to_string(),
            "https://api.example.org".to_string(),
            "https://id.example.org".to_string(),
        )
    }

    #[test]
    fn test_valid_profile() {
        assert!(lab().validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let profile = Profile {
            name: String::new(),
            ..lab()
        };
        let result = profile.validate();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("name cannot be empty"));
    }

    #[test]
    fn test_whitespace_name_rejected() {
        let profile = Profile {
            name: "field office".to_string(),
            ..lab()
        };
        assert!(profile
            .validate()
            .unwrap_err()
            .to_string()
            .contains("cannot contain whitespace"));
    }

    #[test]
    fn test_empty_api_url_rejected() {
        let profile = Profile {
            api_url: String::new(),
            ..lab()
        };
        let message = profile.validate().unwrap_err().to_string();
        assert!(message.contains("profile 'lab'"));
        assert!(message.contains("api_url cannot be empty"));
    }

    #[test]
    fn test_invalid_identity_url_scheme_rejected() {
        let profile = Profile {
            identity_url: "id.example.org".to_string(),
            ..lab()
        };
        assert!(profile
            .validate()
            .unwrap_err()
            .to_string()
            .contains("identity_url must start with http"));
    }

    #[test]
    fn test_http_localhost_accepted() {
        let profile = Profile {
            api_url: "http://localhost:8080".to_string(),
            identity_url: "http://127.0.0.1:4433".to_string(),
            ..lab()
        };
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_profile_serialization() {
        let toml_str = toml::to_string(&lab()).unwrap();
        let parsed: Profile = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, lab());
    }
}
