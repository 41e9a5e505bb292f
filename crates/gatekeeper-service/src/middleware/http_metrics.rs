//! HTTP request metrics middleware.
//!
//! Runs inside the authentication layer, so every response (handler output,
//! framework 404/405, policy 401/403) is counted together with how the
//! caller presented itself.

use crate::observability::metrics::record_http_request;
use auth_core::{AuthFailure, ClaimsPrincipal};
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Caller label for a request.
///
/// `authenticated` when a principal is present, otherwise the stored
/// [`AuthFailure`] label. Requests that never passed through the
/// authentication layer count as `header_missing`.
fn caller_label(req: &Request) -> &'static str {
    if req.extensions().get::<ClaimsPrincipal>().is_some() {
        return "authenticated";
    }
    req.extensions()
        .get::<AuthFailure>()
        .copied()
        .unwrap_or(AuthFailure::HeaderMissing)
        .as_label()
}

pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let caller = caller_label(&request);

    let response = next.run(request).await;

    record_http_request(
        method.as_str(),
        &path,
        response.status().as_u16(),
        caller,
        start.elapsed(),
    );

    response
}
