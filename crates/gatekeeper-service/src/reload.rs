//! Identity hot reload.
//!
//! Re-reads the settings file and publishes a new identity snapshot. A
//! failed reload (unreadable file, bad JSON, duplicate token) leaves the
//! current snapshot in place. Logging settings are not reloaded.

use crate::config::Config;
use crate::observability::metrics::{record_identity_reload, set_registered_identities};
use crate::settings::{AppSettings, SettingsError};
use auth_core::{AuthError, RegistryHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Invalid identity list: {0}")]
    Registry(#[from] AuthError),
}

/// Reloads identities from `config.settings_path` into `registry`.
///
/// Returns the number of identities in the new snapshot.
///
/// # Errors
///
/// Returns `ReloadError` if the settings cannot be loaded or the identity
/// list is invalid; `registry` is unchanged in that case.
pub fn reload_identities(registry: &RegistryHandle, config: &Config) -> Result<usize, ReloadError> {
    let settings = AppSettings::from_file(&config.settings_path, &config.environment)?;
    let snapshot = settings.build_registry()?;
    let count = snapshot.len();

    registry.replace(snapshot);
    set_registered_identities(count);

    Ok(count)
}

/// Reloads identities every time the process receives SIGHUP.
#[cfg(unix)]
pub fn spawn_reload_on_sighup(
    registry: RegistryHandle,
    config: Config,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            match reload_identities(&registry, &config) {
                Ok(count) => {
                    tracing::info!(
                        target: "gk.reload",
                        identities = count,
                        "Identities reloaded"
                    );
                    record_identity_reload("success");
                }
                Err(e) => {
                    tracing::error!(
                        target: "gk.reload",
                        error = %e,
                        "Identity reload failed, keeping current snapshot"
                    );
                    record_identity_reload("error");
                }
            }
        }
    }))
}
