//! Application settings configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::actions::ReconcilePolicy;
use crate::table::{DEFAULT_PAGE_SIZE, PAGE_SIZES};

/// Fastest allowed UI tick.
const MIN_TICK_RATE_MS: u64 = 10;

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// The name of the default profile to use.
    pub default_profile: Option<String>,
    /// Initial page size of every table.
    pub page_size: usize,
    /// What happens to optimistic bulk changes when their request fails.
    pub reconcile: ReconcilePolicy,
    /// UI tick interval in milliseconds; drives debounces and spinners.
    pub tick_rate_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: None,
            page_size: DEFAULT_PAGE_SIZE,
            reconcile: ReconcilePolicy::Keep,
            tick_rate_ms: 100,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if !PAGE_SIZES.contains(&self.page_size) {
            return Err(ConfigError::ValidationError(format!(
                "settings.page_size must be one of {:?}, got {}",
                PAGE_SIZES, self.page_size
            )));
        }
        if self.tick_rate_ms < MIN_TICK_RATE_MS {
            return Err(ConfigError::ValidationError(format!(
                "settings.tick_rate_ms must be at least {}",
                MIN_TICK_RATE_MS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_page_size_must_be_offered() {
        let settings = Settings {
            page_size: 15,
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: Settings = toml::from_str("reconcile = \"revert\"").unwrap();
        assert_eq!(settings.reconcile, ReconcilePolicy::Revert);
        assert_eq!(settings.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(settings.tick_rate_ms, 100);
    }
}
