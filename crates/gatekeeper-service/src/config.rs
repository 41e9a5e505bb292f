//! Gatekeeper service configuration.
//!
//! Process-level configuration is loaded from environment variables. The
//! identity list and logging options live in the settings file named by
//! `GK_SETTINGS_PATH` (see [`crate::settings`]).

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default settings file section.
pub const DEFAULT_ENVIRONMENT: &str = "Development";

/// Gatekeeper service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Path to the JSON settings file.
    pub settings_path: PathBuf,

    /// Settings file section to use (default: "Development").
    pub environment: String,

    /// Seconds to keep draining connections after a shutdown signal.
    pub drain_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid drain seconds configuration: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// See [`Config::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    ///
    /// # Errors
    ///
    /// - `MissingEnvVar` if `GK_SETTINGS_PATH` is absent
    /// - `InvalidDrainSeconds` if `GK_DRAIN_SECONDS` is not an unsigned integer
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let settings_path = vars
            .get("GK_SETTINGS_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("GK_SETTINGS_PATH".to_string()))?;

        let environment = vars
            .get("GK_ENVIRONMENT")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let drain_seconds = match vars.get("GK_DRAIN_SECONDS") {
            Some(value) => value.parse::<u64>().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "GK_DRAIN_SECONDS must be a valid unsigned integer, got '{value}': {e}"
                ))
            })?,
            None => 0,
        };

        Ok(Config {
            bind_address,
            settings_path,
            environment,
            drain_seconds,
        })
    }
}
