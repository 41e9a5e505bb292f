//! HTTP routes for the Gatekeeper service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::{
    authenticate, catch_panic_layer, correlation_id_middleware, http_metrics_middleware,
    request_logging_middleware, require_policy, AuthState, CorrelationId, PolicyState,
};
use crate::settings::{ErrorHandlingSettings, LoggingSettings};
use auth_core::policy::{ADMIN, EVERYONE, THE_BIG_LEBOWSKI};
use auth_core::{AuthError, PolicyEvaluator, RegistryHandle};
use axum::{body::Body, http::Request, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Live identity snapshot, swapped on reload.
    pub registry: RegistryHandle,

    /// Policies registered at startup.
    pub evaluator: Arc<PolicyEvaluator>,

    /// Request logging options.
    pub logging: LoggingSettings,

    /// Unhandled error options.
    pub error_handling: ErrorHandlingSettings,
}

/// Request span carrying the correlation ID, so every event emitted while
/// serving the request can be grouped by it.
fn request_span(req: &Request<Body>) -> tracing::Span {
    let correlation_id = req
        .extensions()
        .get::<CorrelationId>()
        .map(ToString::to_string)
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri().path(),
        version = ?req.version(),
        correlation_id = %correlation_id,
    )
}

fn policy_layer_state(state: &AppState, policy: &str) -> Result<Arc<PolicyState>, AuthError> {
    Ok(Arc::new(PolicyState::new(state.evaluator.clone(), policy)?))
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness check with identity count - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/api/v1/me` - Current caller - policy `Everyone`
/// - `/api/v1/admin/identities` - Registered usernames - policy `Admin`
/// - `/api/v1/lebowski` - policy `The Big Lebowski`
///
/// # Errors
///
/// Returns `UnknownPolicy` if a route references a policy the evaluator
/// does not have, so a misconfigured evaluator fails at startup.
pub fn build_routes(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
) -> Result<Router, AuthError> {
    let auth_state = Arc::new(AuthState {
        registry: state.registry.clone(),
    });
    let logging_settings = Arc::new(state.logging.clone());

    // Public routes (no policy gate)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let everyone_routes: Router = Router::new()
        .route("/api/v1/me", get(handlers::get_me))
        .route_layer(middleware::from_fn_with_state(
            policy_layer_state(&state, EVERYONE)?,
            require_policy,
        ));

    let admin_routes = Router::new()
        .route("/api/v1/admin/identities", get(handlers::list_identities))
        .route_layer(middleware::from_fn_with_state(
            policy_layer_state(&state, ADMIN)?,
            require_policy,
        ))
        .with_state(state.clone());

    let lebowski_routes: Router = Router::new()
        .route("/api/v1/lebowski", get(handlers::the_dude_abides))
        .route_layer(middleware::from_fn_with_state(
            policy_layer_state(&state, THE_BIG_LEBOWSKI)?,
            require_policy,
        ));

    // Layer order (bottom-to-top execution):
    // 1. correlation_id_middleware - Assign correlation ID (outermost)
    // 2. TraceLayer - Request span with the correlation ID
    // 3. catch_panic_layer - Panics below become 500 responses
    // 4. authenticate - Principal or AuthFailure into extensions
    // 5. request_logging_middleware - Request log line, page hits
    // 6. http_metrics_middleware - Record ALL responses
    // 7. TimeoutLayer - Timeout the request (innermost)
    Ok(public_routes
        .merge(metrics_routes)
        .merge(everyone_routes)
        .merge(admin_routes)
        .merge(lebowski_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn_with_state(
            logging_settings,
            request_logging_middleware,
        ))
        .layer(middleware::from_fn_with_state(auth_state, authenticate))
        .layer(catch_panic_layer(state.error_handling.include_details))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(middleware::from_fn(correlation_id_middleware)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use auth_core::claims::{ABILITY, NICKNAME};
    use auth_core::{Identity, IdentityRegistry};
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn test_state(evaluator: PolicyEvaluator) -> Arc<AppState> {
        let registry = IdentityRegistry::from_identities([
            Identity::new("dude-token", "jlebowski")
                .with_role("User")
                .with_claim(NICKNAME, "The Dude")
                .with_claim(ABILITY, "Make White Russian")
                .with_claim(ABILITY, "Abide"),
            Identity::new("maude-token", "maude").with_role("Admin"),
        ])
        .unwrap();

        Arc::new(AppState {
            config: Config {
                bind_address: "127.0.0.1:0".to_string(),
                settings_path: PathBuf::from("appSettings.json"),
                environment: "Development".to_string(),
                drain_seconds: 0,
            },
            registry: RegistryHandle::new(registry),
            evaluator: Arc::new(evaluator),
            logging: LoggingSettings::default(),
            error_handling: ErrorHandlingSettings::default(),
        })
    }

    fn test_router() -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        build_routes(test_state(PolicyEvaluator::with_builtin_policies()), handle).unwrap()
    }

    async fn get(uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Gatekeeper {token}"));
        }
        let response = test_router()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-correlation-id"));

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (
            status,
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null),
        )
    }

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_missing_policy_fails_build() {
        let mut evaluator = PolicyEvaluator::new();
        evaluator.register(EVERYONE, auth_core::policy::verify_everyone);
        let handle = PrometheusBuilder::new().build_recorder().handle();

        let result = build_routes(test_state(evaluator), handle);

        assert!(matches!(result, Err(AuthError::UnknownPolicy(_))));
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (status, json) = get("/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["identities"], 2);
    }

    #[tokio::test]
    async fn test_me_anonymous() {
        let (status, json) = get("/api/v1/me", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["username"], "Anonymous");
        assert_eq!(json["authenticated"], false);
    }

    #[tokio::test]
    async fn test_me_authenticated() {
        let (status, json) = get("/api/v1/me", Some("dude-token")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["username"], "jlebowski");
        assert_eq!(json["roles"][0], "User");
        assert!(json["correlation_id"].is_string());
    }

    #[tokio::test]
    async fn test_admin_route() {
        let (anonymous, _) = get("/api/v1/admin/identities", None).await;
        let (user, _) = get("/api/v1/admin/identities", Some("dude-token")).await;
        let (admin, json) = get("/api/v1/admin/identities", Some("maude-token")).await;

        assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
        assert_eq!(user, StatusCode::FORBIDDEN);
        assert_eq!(admin, StatusCode::OK);
        assert_eq!(json["usernames"], serde_json::json!(["jlebowski", "maude"]));
    }

    #[tokio::test]
    async fn test_lebowski_route() {
        let (dude, json) = get("/api/v1/lebowski", Some("dude-token")).await;
        let (maude, _) = get("/api/v1/lebowski", Some("maude-token")).await;

        assert_eq!(dude, StatusCode::OK);
        assert_eq!(json["message"], "The Dude abides.");
        assert_eq!(maude, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_route_returns_404() {
        let (status, _) = get("/api/v1/nonexistent", Some("dude-token")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
