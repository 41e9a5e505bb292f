//! Liveness handler.

use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,

    /// Identities in the active snapshot.
    pub identities: usize,
}

/// Handler for GET /health
///
/// Public. Reports the size of the current identity snapshot so operators
/// can confirm a reload took effect.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        identities: state.registry.current().len(),
    })
}
