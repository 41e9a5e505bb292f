//! Service error type and its HTTP mapping.
//!
//! Every error becomes `{"error":{"code","message","correlation_id"}}`.
//! 401 responses carry the `WWW-Authenticate` challenge; 403 and 5xx
//! messages are generic.

use crate::middleware::correlation::current_correlation_id;
use auth_core::verifier::AUTHENTICATION_SCHEME;
use auth_core::AuthError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatekeeperError {
    /// No principal, or the credential was rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated principal does not satisfy the route policy.
    #[error("Forbidden: policy '{0}' not satisfied")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unhandled failure. `details` is only set when the operator opted in
    /// to exposing them.
    #[error("Internal server error")]
    Internal { details: Option<String> },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl GatekeeperError {
    /// HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatekeeperError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatekeeperError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatekeeperError::Configuration(_) | GatekeeperError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<AuthError> for GatekeeperError {
    fn from(err: AuthError) -> Self {
        GatekeeperError::Configuration(err.to_string())
    }
}

impl IntoResponse for GatekeeperError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message, details) = match self {
            GatekeeperError::Unauthorized(reason) => ("UNAUTHORIZED", reason, None),
            GatekeeperError::Forbidden(_) => (
                "FORBIDDEN",
                "Access denied by authorization policy".to_string(),
                None,
            ),
            GatekeeperError::Configuration(detail) => {
                tracing::error!(target: "gk.errors", error = %detail, "Configuration error");
                (
                    "CONFIGURATION_ERROR",
                    "The service is misconfigured".to_string(),
                    None,
                )
            }
            GatekeeperError::Internal { details } => (
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                details,
            ),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                correlation_id: current_correlation_id().map(|id| id.to_string()),
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            let challenge = format!("{AUTHENTICATION_SCHEME} realm=\"gatekeeper\"");
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }

        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unauthorized_response() {
        let response =
            GatekeeperError::Unauthorized("header not found".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Gatekeeper realm=\"gatekeeper\""
        );

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
        assert_eq!(json["error"]["message"], "header not found");
    }

    #[tokio::test]
    async fn test_forbidden_response_hides_policy_name() {
        let response = GatekeeperError::Forbidden("Admin".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert!(!json["error"]["message"].as_str().unwrap().contains("Admin"));
    }

    #[tokio::test]
    async fn test_configuration_response_is_generic() {
        let err: GatekeeperError = AuthError::UnknownPolicy("Missing".to_string()).into();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "CONFIGURATION_ERROR");
        assert!(!json["error"]["message"].as_str().unwrap().contains("Missing"));
    }

    #[tokio::test]
    async fn test_internal_response_details_are_opt_in() {
        let hidden = body_json(GatekeeperError::Internal { details: None }.into_response()).await;
        assert_eq!(hidden["error"]["code"], "INTERNAL_ERROR");
        assert!(hidden["error"].get("details").is_none());

        let shown = body_json(
            GatekeeperError::Internal {
                details: Some("index out of bounds".to_string()),
            }
            .into_response(),
        )
        .await;
        assert_eq!(shown["error"]["details"], "index out of bounds");
    }

    #[tokio::test]
    async fn test_correlation_id_only_inside_request() {
        let json = body_json(GatekeeperError::Forbidden("Admin".to_string()).into_response()).await;

        assert!(json["error"].get("correlation_id").is_none());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatekeeperError::Internal { details: None }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatekeeperError::Forbidden(String::new()).status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
