//! Observability for the Gatekeeper service.
//!
//! Provides Prometheus metric definitions and recording helpers.

pub mod metrics;
