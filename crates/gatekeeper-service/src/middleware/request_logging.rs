//! Request logging middleware.
//!
//! Logs one event per request with the path, method, content type, caller,
//! remote address and correlation ID, and records a page hit. The page-hit
//! label is the matching `truncateUrls` prefix or the route table entry, so
//! arbitrary request paths never become metric series; the full path and
//! the remote address are logged only. Paths matching `ignoreUrls` pass
//! through untouched. With `logRequestParameters` enabled, header and query
//! parameters are logged as well, minus sensitive keys.
//!
//! Must run inside the authentication and correlation layers so that both
//! the principal and the correlation ID are in request extensions.

use crate::middleware::auth::PrincipalExt;
use crate::middleware::correlation::CorrelationId;
use crate::observability::metrics::record_page_hit;
use crate::settings::LoggingSettings;
use axum::{
    extract::{ConnectInfo, Query, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Username logged for requests without a principal.
pub const ANONYMOUS_USERNAME: &str = "Anonymous";

pub async fn request_logging_middleware(
    State(settings): State<Arc<LoggingSettings>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if settings.is_ignored(&path) {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().to_string();
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let username = req
        .principal()
        .map_or(ANONYMOUS_USERNAME, |p| p.username())
        .to_string();
    let correlation_id = req
        .extensions()
        .get::<CorrelationId>()
        .map(ToString::to_string)
        .unwrap_or_default();
    // Absent when the server was not started with connect info (router tests).
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    tracing::info!(
        target: "gk.middleware.logging",
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
        content_type = %content_type,
        username = %username,
        remote_addr = %remote_addr,
        "Request"
    );

    if settings.log_request_parameters {
        log_request_parameters(&req, &correlation_id);
    }

    let response = next.run(req).await;

    let duration = start.elapsed();
    record_page_hit(&path, settings.truncated_path(&path), duration);

    tracing::debug!(
        target: "gk.middleware.logging",
        correlation_id = %correlation_id,
        status = response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Response"
    );

    response
}

fn log_request_parameters(req: &Request, correlation_id: &str) {
    for (name, value) in req.headers() {
        if LoggingSettings::is_sensitive(name.as_str()) {
            continue;
        }
        tracing::debug!(
            target: "gk.middleware.logging",
            correlation_id = %correlation_id,
            header = %name,
            value = %value.to_str().unwrap_or("<non-ascii>"),
            "Request header"
        );
    }

    let Ok(Query(pairs)) = Query::<Vec<(String, String)>>::try_from_uri(req.uri()) else {
        return;
    };
    for (name, value) in pairs {
        if LoggingSettings::is_sensitive(&name) {
            continue;
        }
        tracing::debug!(
            target: "gk.middleware.logging",
            correlation_id = %correlation_id,
            parameter = %name,
            value = %value,
            "Query parameter"
        );
    }
}
