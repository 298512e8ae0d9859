//! Application configuration
//!
//! This module re-exports shared types from fray-types and provides
//! persistence for AppConfig. The config is loaded once at startup and
//! written back at shutdown; window geometry rides along with it.

use tracing::warn;

use fray_types::AppConfig;

use super::error::ConfigError;

const APP_NAME: &str = "fray";
const CONFIG_NAME: &str = "config";

/// Extension trait for AppConfig persistence.
pub trait AppConfigExt: Sized {
    fn load() -> Self;
    fn store(self) -> Result<(), ConfigError>;
}

impl AppConfigExt for AppConfig {
    /// Load the stored configuration, falling back to defaults when no
    /// usable config file exists.
    fn load() -> Self {
        confy::load(APP_NAME, CONFIG_NAME).unwrap_or_else(|error| {
            warn!(error = %error, "could not load configuration, using defaults");
            Self::default()
        })
    }

    fn store(self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }
}
