//! Middleware for the Gatekeeper service.
//!
//! # Components
//!
//! - `correlation` - Correlation ID assignment and propagation
//! - `catch_panic` - 500 response for panics in inner layers and handlers
//! - `auth` - Credential resolution into a `ClaimsPrincipal`
//! - `policy` - Per-route policy gate (401/403)
//! - `request_logging` - Request log line and page-hit metrics
//! - `http_metrics` - HTTP request metrics labelled by caller

pub mod auth;
pub mod catch_panic;
pub mod correlation;
pub mod http_metrics;
pub mod policy;
pub mod request_logging;

pub use auth::{authenticate, AuthState, PrincipalExt};
pub use catch_panic::{catch_panic_layer, PanicResponder};
pub use correlation::{
    correlation_id_middleware, current_correlation_id, CorrelationId, CORRELATION_ID_HEADER,
};
pub use http_metrics::http_metrics_middleware;
pub use policy::{require_policy, PolicyState};
pub use request_logging::{request_logging_middleware, ANONYMOUS_USERNAME};
