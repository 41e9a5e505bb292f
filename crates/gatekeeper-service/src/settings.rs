//! Settings file loading.
//!
//! The settings file is a JSON object keyed by environment name, so one file
//! can carry development, staging and production identities side by side:
//!
//! ```json
//! {
//!   "Development": {
//!     "authenticationIdentities": [
//!       {
//!         "token": "...",
//!         "username": "jlebowski",
//!         "roles": ["User"],
//!         "claims": { "nickname": ["The Dude"], "ability": ["Abide"] }
//!       }
//!     ],
//!     "logging": {
//!       "logRequestParameters": false,
//!       "ignoreUrls": ["/health"],
//!       "truncateUrls": ["/api/v1/admin"]
//!     }
//!   }
//! }
//! ```

use auth_core::{AuthError, Identity, IdentityRegistry};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header and query keys whose values are never logged.
const SENSITIVE_PARAMETERS: &[&str] = &["password", "authorization", "cookie"];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Settings file has no section for environment '{0}'")]
    MissingEnvironment(String),
}

/// One environment's section of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub authentication_identities: Vec<Identity>,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub error_handling: ErrorHandlingSettings,
}

impl AppSettings {
    /// Reads `path` and returns the `environment` section.
    ///
    /// # Errors
    ///
    /// - `Io` if the file cannot be read
    /// - `Parse` if the JSON is malformed
    /// - `MissingEnvironment` if the section does not exist
    pub fn from_file(path: &Path, environment: &str) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(
            target: "gk.settings",
            path = %path.display(),
            environment = %environment,
            "Loading settings"
        );

        Self::from_json_str(&json, environment)
    }

    /// Parses a settings document and returns the `environment` section.
    ///
    /// # Errors
    ///
    /// - `Parse` if the JSON is malformed
    /// - `MissingEnvironment` if the section does not exist
    pub fn from_json_str(json: &str, environment: &str) -> Result<Self, SettingsError> {
        let mut sections: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;

        let section = sections
            .remove(environment)
            .ok_or_else(|| SettingsError::MissingEnvironment(environment.to_string()))?;

        Ok(serde_json::from_value(section)?)
    }

    /// Builds an identity registry from the configured identities.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateToken` or `EmptyToken` for invalid identity lists.
    pub fn build_registry(&self) -> Result<IdentityRegistry, AuthError> {
        IdentityRegistry::from_identities(self.authentication_identities.iter().cloned())
    }
}

/// Request logging options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    /// Log header and query parameters (sensitive keys excluded).
    #[serde(default)]
    pub log_request_parameters: bool,

    /// Path prefixes that are not logged at all.
    #[serde(default)]
    pub ignore_urls: Vec<String>,

    /// Path prefixes that replace the full path in metric labels.
    #[serde(default)]
    pub truncate_urls: Vec<String>,
}

/// Unhandled error options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHandlingSettings {
    /// Put the panic message into 500 bodies. Development only.
    #[serde(default)]
    pub include_details: bool,
}

/// Adds a leading `/` if missing.
fn canonical_url(url: &str) -> String {
    if url.starts_with('/') {
        url.to_string()
    } else {
        format!("/{url}")
    }
}

fn starts_with_ignore_case(path: &str, prefix: &str) -> bool {
    path.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

impl LoggingSettings {
    /// True if `path` starts (case-insensitively) with any ignore URL.
    #[must_use]
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore_urls
            .iter()
            .any(|url| starts_with_ignore_case(path, &canonical_url(url)))
    }

    /// The first truncate URL `path` starts with, if any.
    #[must_use]
    pub fn truncated_path(&self, path: &str) -> Option<String> {
        self.truncate_urls
            .iter()
            .map(|url| canonical_url(url))
            .find(|url| starts_with_ignore_case(path, url))
    }

    /// True if a header or query key must not be logged.
    #[must_use]
    pub fn is_sensitive(key: &str) -> bool {
        SENSITIVE_PARAMETERS
            .iter()
            .any(|sensitive| sensitive.eq_ignore_ascii_case(key))
    }
}
