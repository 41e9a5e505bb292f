//! Authentication middleware.
//!
//! Runs on every route. It never rejects a request itself: on success the
//! resolved [`ClaimsPrincipal`] is stored in request extensions, on failure
//! the [`AuthFailure`] is stored instead so that a later policy gate can
//! answer with the right 401 reason. Public routes simply ignore both.

use crate::observability::metrics::record_auth_attempt;
use auth_core::verifier::AUTHORIZATION_HEADER;
use auth_core::{AuthResult, ClaimsPrincipal, CredentialVerifier, RegistryHandle};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Live identity snapshot.
    pub registry: RegistryHandle,
}

#[instrument(skip_all, name = "gk.middleware.auth")]
pub async fn authenticate(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let verifier = CredentialVerifier::new(state.registry.current());

    // A non-ASCII header value can never carry a registered token.
    let result = verifier.authenticate(
        req.headers()
            .get(AUTHORIZATION_HEADER)
            .map(|v| v.to_str().unwrap_or_default()),
    );

    match result {
        AuthResult::Success(principal) => {
            tracing::debug!(
                target: "gk.middleware.auth",
                username = %principal.username(),
                "Authenticated request"
            );
            record_auth_attempt("success");
            req.extensions_mut().insert(principal);
        }
        AuthResult::Failure(failure) => {
            tracing::debug!(
                target: "gk.middleware.auth",
                reason = %failure,
                "Authentication failed"
            );
            record_auth_attempt(failure.as_label());
            req.extensions_mut().insert(failure);
        }
    }

    next.run(req).await
}

/// Extension trait for extracting the principal from a request.
pub trait PrincipalExt {
    /// The authenticated principal, or `None` when authentication failed or
    /// the middleware was not applied.
    fn principal(&self) -> Option<&ClaimsPrincipal>;
}

impl<B> PrincipalExt for axum::extract::Request<B> {
    fn principal(&self) -> Option<&ClaimsPrincipal> {
        self.extensions().get::<ClaimsPrincipal>()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use auth_core::{AuthFailure, Identity, IdentityRegistry};
    use axum::{body::Body, http::Request as HttpRequest, middleware, routing::get, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn describe(req: Request) -> String {
        match (req.principal(), req.extensions().get::<AuthFailure>()) {
            (Some(principal), _) => format!("user:{}", principal.username()),
            (None, Some(failure)) => format!("failure:{failure}"),
            (None, None) => "none".to_string(),
        }
    }

    fn test_app(registry: RegistryHandle) -> Router {
        let state = Arc::new(AuthState { registry });
        Router::new()
            .route("/", get(describe))
            .layer(middleware::from_fn_with_state(state, authenticate))
    }

    fn registry() -> RegistryHandle {
        let identities = IdentityRegistry::from_identities([
            Identity::new("dude-token", "jlebowski").with_role("User")
        ])
        .unwrap();
        RegistryHandle::new(identities)
    }

    async fn send(app: Router, header: Option<&str>) -> String {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("authorization", value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_inserts_principal() {
        let body = send(test_app(registry()), Some("Gatekeeper dude-token")).await;
        assert_eq!(body, "user:jlebowski");
    }

    #[tokio::test]
    async fn test_missing_header_inserts_failure() {
        let body = send(test_app(registry()), None).await;
        assert_eq!(body, "failure:header not found");
    }

    #[tokio::test]
    async fn test_wrong_scheme_inserts_failure() {
        let body = send(test_app(registry()), Some("Bearer dude-token")).await;
        assert_eq!(body, "failure:invalid header");
    }

    #[tokio::test]
    async fn test_token_is_case_sensitive() {
        let body = send(test_app(registry()), Some("Gatekeeper DUDE-TOKEN")).await;
        assert_eq!(body, "failure:invalid header");
    }

    #[tokio::test]
    async fn test_replaced_snapshot_is_used_for_next_request() {
        let handle = registry();
        let app = test_app(handle.clone());

        handle.replace(
            IdentityRegistry::from_identities([Identity::new("walter-token", "wsobchak")])
                .unwrap(),
        );

        let old = send(app.clone(), Some("Gatekeeper dude-token")).await;
        let new = send(app, Some("Gatekeeper walter-token")).await;

        assert_eq!(old, "failure:invalid header");
        assert_eq!(new, "user:wsobchak");
    }
}
