//! Gatekeeper
//!
//! Authenticates `Authorization: Gatekeeper <token>` requests against a
//! configured identity list and gates routes with claims-based policies.

use auth_core::{PolicyEvaluator, RegistryHandle};
use gatekeeper_service::config::Config;
use gatekeeper_service::observability::metrics::set_registered_identities;
use gatekeeper_service::routes::{self, init_metrics_recorder, AppState};
use gatekeeper_service::settings::AppSettings;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Gatekeeper");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        settings_path = %config.settings_path.display(),
        environment = %config.environment,
        "Configuration loaded successfully"
    );

    let settings = AppSettings::from_file(&config.settings_path, &config.environment)
        .map_err(|e| {
            error!("Failed to load settings: {}", e);
            e
        })?;

    // Duplicate or empty tokens are fatal at startup.
    let identities = settings.build_registry().map_err(|e| {
        error!("Invalid identity list: {}", e);
        e
    })?;
    info!(identities = identities.len(), "Identity registry built");

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;
    set_registered_identities(identities.len());

    let registry = RegistryHandle::new(identities);
    let bind_address = config.bind_address.clone();
    let drain_seconds = config.drain_seconds;

    let state = Arc::new(AppState {
        config: config.clone(),
        registry: registry.clone(),
        evaluator: Arc::new(PolicyEvaluator::with_builtin_policies()),
        logging: settings.logging,
        error_handling: settings.error_handling,
    });

    let app = routes::build_routes(state, metrics_handle).map_err(|e| {
        error!("Failed to build routes: {}", e);
        e
    })?;

    #[cfg(unix)]
    let reload_task = gatekeeper_service::reload::spawn_reload_on_sighup(registry, config)?;

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Gatekeeper listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(drain_seconds))
    .await?;

    #[cfg(unix)]
    reload_task.abort();

    info!("Gatekeeper shutdown complete");

    Ok(())
}

/// Installs the global subscriber; `GK_JSON_LOGS=true` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gatekeeper_service=debug,gatekeeper=debug,tower_http=debug".into());

    let json = std::env::var("GK_JSON_LOGS").is_ok_and(|v| v.eq_ignore_ascii_case("true"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and drain period is complete.
async fn shutdown_signal(drain_seconds: u64) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    if drain_seconds > 0 {
        warn!("Draining connections for {} seconds...", drain_seconds);
        tokio::time::sleep(Duration::from_secs(drain_seconds)).await;
        info!("Drain period complete");
    }
}
