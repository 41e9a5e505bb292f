//! Credential-to-identity resolution and claims-based authorization.
//!
//! This crate is the HTTP-agnostic core of Gatekeeper. A host (see the
//! `gatekeeper-service` crate) hands it the raw `Authorization` header value
//! and gets back either a verified [`ClaimsPrincipal`] or a typed failure,
//! then asks the [`PolicyEvaluator`] whether that principal may proceed.
//!
//! ```text
//! header -> CredentialVerifier -> IdentityRegistry -> ClaimsPrincipal -> PolicyEvaluator
//! ```
//!
//! Everything here is synchronous and CPU-only. Registries and evaluators are
//! built during startup and then shared behind `Arc` without locking.

#![warn(clippy::pedantic)]

/// Case-insensitive multi-valued claim map
pub mod claims;

/// Error types for configuration and programmer errors
pub mod error;

/// Configured identities and the token-keyed registry
pub mod identity;

/// Named authorization policies
pub mod policy;

/// The verified per-request principal
pub mod principal;

/// Secret types that prevent accidental logging of tokens
pub mod secret;

/// Atomically swappable registry snapshots
pub mod snapshot;

/// Header parsing and token verification
pub mod verifier;

pub use claims::ClaimMap;
pub use error::AuthError;
pub use identity::{Identity, IdentityRegistry};
pub use policy::{Policy, PolicyEvaluator};
pub use principal::ClaimsPrincipal;
pub use snapshot::RegistryHandle;
pub use verifier::{AuthFailure, AuthResult, CredentialVerifier};
