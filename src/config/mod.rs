//! Configuration management for casefile.
//!
//! This module handles loading, saving, and managing user configuration
//! including profiles and application settings. Session tokens never touch
//! the configuration file; they live in the OS keyring.

mod profile;
mod settings;

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub use profile::Profile;
pub use settings::Settings;

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "CASEFILE_CONFIG_DIR";

/// File name of the configuration file.
const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur while handling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    #[error("failed to create configuration directory: {0}")]
    CreateDirError(std::io::Error),

    #[error("failed to read configuration file: {0}")]
    ReadError(std::io::Error),

    #[error("failed to write configuration file: {0}")]
    WriteError(std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("{0}")]
    ValidationError(String),

    #[error("profile '{0}' not found")]
    ProfileNotFound(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Config {
    /// Directory holding the configuration file.
    ///
    /// `CASEFILE_CONFIG_DIR` wins over the platform configuration directory.
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        dirs::config_dir()
            .map(|dir| dir.join("casefile"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Path of the configuration file.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load the configuration, or defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// fails validation.
    #[instrument]
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            info!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(ConfigError::ReadError)?;
        let config = Self::from_toml(&content)?;
        debug!(profiles = config.profiles.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration, creating the directory if needed.
    #[instrument(skip(self))]
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).map_err(ConfigError::CreateDirError)?;

        let content = toml::to_string_pretty(self)?;
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, content).map_err(ConfigError::WriteError)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Validate settings and every profile.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        for (i, profile) in self.profiles.iter().enumerate() {
            profile.validate()?;
            if self.profiles[..i].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }
        if let Some(default) = &self.settings.default_profile {
            if !self.profiles.is_empty() && self.profile(default).is_none() {
                warn!(profile = %default, "Default profile is not configured");
            }
        }
        Ok(())
    }

    /// Profile by name.
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Resolve the profile to use: the requested one, the default one, or
    /// the only one.
    ///
    /// # Errors
    ///
    /// `ProfileNotFound` when a requested name is unknown, `ValidationError`
    /// when no profile can be chosen.
    pub fn resolve_profile(&self, requested: Option<&str>) -> Result<&Profile> {
        if let Some(name) = requested {
            return self
                .profile(name)
                .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()));
        }
        if let Some(default) = &self.settings.default_profile {
            if let Some(profile) = self.profile(default) {
                return Ok(profile);
            }
        }
        match self.profiles.as_slice() {
            [only] => Ok(only),
            [] => Err(ConfigError::ValidationError(
                "no profiles configured; pass --api-url and --identity-url or add one to config.toml"
                    .to_string(),
            )),
            _ => Err(ConfigError::ValidationError(
                "several profiles configured; choose one with --profile or set settings.default_profile"
                    .to_string(),
            )),
        }
    }

    /// Insert or replace a profile by name.
    pub fn upsert_profile(&mut self, profile: Profile) {
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ReconcilePolicy;
    use serial_test::serial;
    use tempfile::TempDir;

    fn profile(name: &str) -> Profile {
        Profile::new(
            name.to_string(),
            "https://api.example.org".to_string(),
            "https://id.example.org".to_string(),
        )
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
            [settings]
            default_profile = "lab"
            page_size = 20
            reconcile = "revert"
            tick_rate_ms = 50

            [[profiles]]
            name = "lab"
            api_url = "https://api.lab.example.org"
            identity_url = "https://id.lab.example.org"
        "#;
        let config = Config::from_toml(content).unwrap();
        assert_eq!(config.settings.page_size, 20);
        assert_eq!(config.settings.reconcile, ReconcilePolicy::Revert);
        assert_eq!(config.resolve_profile(None).unwrap().name, "lab");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.settings.reconcile, ReconcilePolicy::Keep);
    }

    #[test]
    fn test_duplicate_profiles_rejected() {
        let config = Config {
            settings: Settings::default(),
            profiles: vec![profile("lab"), profile("lab")],
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate profile name 'lab'"));
    }

    #[test]
    fn test_resolve_profile() {
        let mut config = Config::default();
        assert!(config.resolve_profile(None).is_err());

        config.upsert_profile(profile("lab"));
        assert_eq!(config.resolve_profile(None).unwrap().name, "lab");

        config.upsert_profile(profile("field"));
        assert!(config.resolve_profile(None).is_err());
        assert_eq!(config.resolve_profile(Some("field")).unwrap().name, "field");
        assert!(matches!(
            config.resolve_profile(Some("missing")),
            Err(ConfigError::ProfileNotFound(_))
        ));

        config.settings.default_profile = Some("field".to_string());
        assert_eq!(config.resolve_profile(None).unwrap().name, "field");
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let mut config = Config::default();
        config.upsert_profile(profile("lab"));
        let mut updated = profile("lab");
        updated.api_url = "https://other.example.org".to_string();
        config.upsert_profile(updated);
        assert_eq!(config.profiles.len(), 1);
        assert_eq!(config.profiles[0].api_url, "https://other.example.org");
    }

    #[test]
    #[serial]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        std::env::set_var(CONFIG_DIR_ENV, dir.path());

        let mut config = Config::default();
        config.upsert_profile(profile("lab"));
        config.settings.page_size = 50;
        config.save().unwrap();

        let loaded = Config::load().unwrap();
        std::env::remove_var(CONFIG_DIR_ENV);

        assert_eq!(loaded, config);
        assert!(dir.path().join("config.toml").exists());
    }

    #[test]
    #[serial]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        std::env::set_var(CONFIG_DIR_ENV, dir.path().join("nested"));

        let loaded = Config::load().unwrap();
        std::env::remove_var(CONFIG_DIR_ENV);

        assert_eq!(loaded, Config::default());
    }

    #[test]
    #[serial]
    fn test_load_invalid_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "profiles = 3").unwrap();
        std::env::set_var(CONFIG_DIR_ENV, dir.path());

        let result = Config::load();
        std::env::remove_var(CONFIG_DIR_ENV);

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
