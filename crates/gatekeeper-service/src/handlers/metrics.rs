//! Prometheus metrics endpoint handler.
//!
//! # Security
//!
//! This endpoint is unauthenticated to allow Prometheus to scrape metrics.
//! No tokens or claim values are exposed in metrics.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// ```text
/// # TYPE gk_auth_attempts_total counter
/// gk_auth_attempts_total{outcome="success"} 42
/// ```
#[tracing::instrument(skip_all, name = "gk.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
