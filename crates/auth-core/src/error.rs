//! Error types for the authentication core.
//!
//! Expected outcomes of authenticating a request (missing header, unknown
//! token) are NOT errors; they are [`crate::AuthFailure`] values inside an
//! [`crate::AuthResult`]. The variants here are configuration or programming
//! mistakes that should stop the component from being used.

use thiserror::Error;

/// Configuration and programmer errors raised by the core.
///
/// Messages never include token material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Another identity in the registry already uses this token.
    #[error("Duplicate token for identity '{username}'")]
    DuplicateToken {
        /// Username of the identity that was rejected
        username: String,
    },

    /// Identity was configured with an empty token.
    #[error("Empty token for identity '{username}'")]
    EmptyToken {
        /// Username of the identity that was rejected
        username: String,
    },

    /// Policy name was never registered with the evaluator.
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),
}

/// Result type alias using `AuthError`
pub type Result<T> = std::result::Result<T, AuthError>;
