//! Handler gated by the composite `The Big Lebowski` policy.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LebowskiResponse {
    pub message: &'static str,
}

/// Handler for GET /api/v1/lebowski
pub async fn the_dude_abides() -> Json<LebowskiResponse> {
    Json(LebowskiResponse {
        message: "The Dude abides.",
    })
}
