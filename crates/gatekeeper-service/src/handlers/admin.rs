//! Admin handlers, routed behind the `Admin` policy.

use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Response for `/api/v1/admin/identities`.
#[derive(Debug, Serialize)]
pub struct IdentitiesResponse {
    /// Usernames in registration order. Tokens are never returned.
    pub usernames: Vec<String>,
}

/// Handler for GET /api/v1/admin/identities
#[instrument(skip_all, name = "gk.handlers.admin.identities")]
pub async fn list_identities(State(state): State<Arc<AppState>>) -> Json<IdentitiesResponse> {
    let snapshot = state.registry.current();

    Json(IdentitiesResponse {
        usernames: snapshot.usernames().into_iter().map(String::from).collect(),
    })
}
