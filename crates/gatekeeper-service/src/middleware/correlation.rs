//! Correlation ID middleware.
//!
//! Every request carries an `x-correlation-id` header by the time it reaches
//! the inner layers. A caller-supplied value is reused when it parses as a
//! UUID; anything else is replaced with a fresh v4 UUID. The ID is also
//! stored in request extensions, echoed on the response, and readable
//! through [`current_correlation_id`] for code that has no request at hand
//! (the panic responder, error bodies).

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::fmt;
use uuid::Uuid;

/// Correlation header name.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Per-request correlation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

tokio::task_local! {
    static CURRENT_CORRELATION_ID: CorrelationId;
}

/// Correlation ID of the request being served on this task, if any.
#[must_use]
pub fn current_correlation_id() -> Option<CorrelationId> {
    CURRENT_CORRELATION_ID.try_with(|id| *id).ok()
}

impl CorrelationId {
    /// Reads a valid correlation ID from `value`, if any.
    fn parse(value: Option<&HeaderValue>) -> Option<Self> {
        value
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(CorrelationId)
    }
}

pub async fn correlation_id_middleware(mut req: Request, next: Next) -> Response {
    let correlation_id = match CorrelationId::parse(req.headers().get(CORRELATION_ID_HEADER)) {
        Some(id) => id,
        None => {
            let id = CorrelationId(Uuid::new_v4());
            if req.headers().contains_key(CORRELATION_ID_HEADER) {
                tracing::debug!(
                    target: "gk.middleware.correlation",
                    correlation_id = %id,
                    "Replacing invalid correlation ID"
                );
            }
            id
        }
    };

    let header_value = HeaderValue::from_str(&correlation_id.to_string()).ok();
    if let Some(value) = header_value.clone() {
        req.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    req.extensions_mut().insert(correlation_id);

    let mut response = CURRENT_CORRELATION_ID
        .scope(correlation_id, next.run(req))
        .await;

    if let Some(value) = header_value {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}
