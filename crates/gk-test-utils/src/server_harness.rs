//! Test server harness for E2E testing
//!
//! Provides `TestGatekeeperServer` for spawning real Gatekeeper server
//! instances in tests.

use auth_core::{Identity, IdentityRegistry, PolicyEvaluator, RegistryHandle};
use gatekeeper_service::config::Config;
use gatekeeper_service::routes::{self, init_metrics_recorder, AppState};
use gatekeeper_service::settings::{ErrorHandlingSettings, LoggingSettings};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// The process-wide recorder is installed once; later servers share it.
fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the Gatekeeper server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_flow_e2e() -> Result<(), anyhow::Error> {
///     let server = TestGatekeeperServer::spawn(vec![admin_identity()]).await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestGatekeeperServer {
    addr: SocketAddr,
    config: Config,
    registry: RegistryHandle,
    _handle: JoinHandle<()>,
}

impl TestGatekeeperServer {
    /// Spawn a server with the given identities and default logging options.
    pub async fn spawn(identities: Vec<Identity>) -> Result<Self, anyhow::Error> {
        Self::spawn_with_logging(identities, LoggingSettings::default()).await
    }

    /// Spawn a server with the given identities and logging options.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Register the built-in policies
    /// - Start the HTTP server in the background
    pub async fn spawn_with_logging(
        identities: Vec<Identity>,
        logging: LoggingSettings,
    ) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            (
                "GK_SETTINGS_PATH".to_string(),
                "test-appSettings.json".to_string(),
            ),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let registry = RegistryHandle::new(
            IdentityRegistry::from_identities(identities)
                .map_err(|e| anyhow::anyhow!("Failed to build registry: {}", e))?,
        );

        let state = Arc::new(AppState {
            config: config.clone(),
            registry: registry.clone(),
            evaluator: Arc::new(PolicyEvaluator::with_builtin_policies()),
            logging,
            error_handling: ErrorHandlingSettings::default(),
        });

        // Build routes using gatekeeper-service's real route builder
        let app = routes::build_routes(state, test_metrics_handle())
            .map_err(|e| anyhow::anyhow!("Failed to build routes: {}", e))?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            // Use into_make_service_with_connect_info to support SocketAddr extraction
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            registry,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle to the live identity snapshot, for reload tests.
    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }
}

impl Drop for TestGatekeeperServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
