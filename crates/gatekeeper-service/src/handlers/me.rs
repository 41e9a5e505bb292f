//! Current caller handler.
//!
//! Returns whoever the authentication middleware resolved, or the anonymous
//! principal. Routed behind the `Everyone` policy, so it never rejects.

use crate::middleware::{CorrelationId, ANONYMOUS_USERNAME};
use auth_core::{ClaimMap, ClaimsPrincipal};
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Response for `/api/v1/me`.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// Username, or "Anonymous".
    pub username: String,

    pub authenticated: bool,

    /// Roles in sorted order.
    pub roles: Vec<String>,

    /// Claim types mapped to their values.
    pub claims: ClaimMap,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl MeResponse {
    fn from_principal(principal: &ClaimsPrincipal, correlation_id: Option<CorrelationId>) -> Self {
        let username = if principal.is_authenticated() {
            principal.username().to_string()
        } else {
            ANONYMOUS_USERNAME.to_string()
        };

        Self {
            username,
            authenticated: principal.is_authenticated(),
            roles: principal.roles().iter().cloned().collect(),
            claims: principal.claims().clone(),
            correlation_id: correlation_id.map(|id| id.to_string()),
        }
    }
}

/// Handler for GET /api/v1/me
///
/// ## Response
///
/// ```json
/// {
///   "username": "jlebowski",
///   "authenticated": true,
///   "roles": ["User"],
///   "claims": { "nickname": ["The Dude"] },
///   "correlation_id": "6f1c2b0e-8d4a-4f57-9a43-2f0f3a1e9b11"
/// }
/// ```
#[instrument(skip_all, name = "gk.handlers.me")]
pub async fn get_me(
    principal: Option<Extension<ClaimsPrincipal>>,
    correlation_id: Option<Extension<CorrelationId>>,
) -> Json<MeResponse> {
    let principal = principal.map_or_else(ClaimsPrincipal::anonymous, |Extension(p)| p);

    Json(MeResponse::from_principal(
        &principal,
        correlation_id.map(|Extension(id)| id),
    ))
}
