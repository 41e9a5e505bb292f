//! Gatekeeper Service Library
//!
//! Hosts the `auth-core` authentication pipeline inside an axum HTTP service:
//!
//! - Authentication middleware resolving `Authorization: Gatekeeper <token>`
//!   into a `ClaimsPrincipal`
//! - Per-route policy gates (401 for anonymous callers, 403 for
//!   authenticated callers that fail the policy)
//! - Correlation IDs and request logging
//! - Settings file loading and identity hot reload
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/*.rs -> handlers/*.rs
//!                       |
//!                       v
//!                  auth_core (verifier, policies)
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Correlation, logging, authentication, policy, metrics
//! - `observability` - Prometheus metrics
//! - `reload` - Identity hot reload
//! - `routes` - Axum router setup
//! - `settings` - Environment-keyed JSON settings file

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod reload;
pub mod routes;
pub mod settings;
