//! Configured identities and the token-keyed registry.
//!
//! # Security
//!
//! - Tokens are held as [`SecretString`] and redacted in `Debug` output
//! - The lookup index is keyed by the SHA-256 digest of the token, so the
//!   raw token never becomes a hash map key
//! - The matched candidate is confirmed with a constant-time comparison
//! - Empty tokens are rejected at registration

use crate::claims::ClaimMap;
use crate::error::AuthError;
use crate::secret::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use subtle::ConstantTimeEq;

/// A configured principal template, keyed by its secret token.
///
/// Deserializes from
/// `{"token": "...", "username": "...", "roles": [...], "claims": {"type": [...]}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    /// Secret bearer token (unique within a registry).
    pub token: SecretString,

    pub username: String,

    /// Roles in configuration order.
    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub claims: ClaimMap,
}

impl Identity {
    /// Creates an identity with no roles and no claims.
    #[must_use]
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            username: username.into(),
            roles: Vec::new(),
            claims: ClaimMap::new(),
        }
    }

    /// Appends a role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Adds a claim value.
    #[must_use]
    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(claim_type, value);
        self
    }
}

type TokenDigest = [u8; 32];

fn digest(token: &str) -> TokenDigest {
    Sha256::digest(token.as_bytes()).into()
}

/// In-memory collection of identities keyed by token.
///
/// Built with `&mut` during startup; share it behind `Arc` (or a
/// [`crate::RegistryHandle`]) once built so it can no longer change.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    identities: Vec<Identity>,
    index: HashMap<TokenDigest, usize>,
}

impl IdentityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from identities in order.
    ///
    /// # Errors
    ///
    /// Returns the first registration error (`DuplicateToken` or
    /// `EmptyToken`); no registry is produced in that case.
    pub fn from_identities<I>(identities: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = Identity>,
    {
        let mut registry = Self::new();
        for identity in identities {
            registry.register(identity)?;
        }
        Ok(registry)
    }

    /// Adds an identity.
    ///
    /// # Errors
    ///
    /// - `DuplicateToken` if another identity already uses the same token
    /// - `EmptyToken` if the token is empty
    ///
    /// The registry is unchanged when an error is returned.
    pub fn register(&mut self, identity: Identity) -> Result<(), AuthError> {
        if identity.token.expose_secret().is_empty() {
            return Err(AuthError::EmptyToken {
                username: identity.username,
            });
        }

        let key = digest(identity.token.expose_secret());
        if self.index.contains_key(&key) {
            return Err(AuthError::DuplicateToken {
                username: identity.username,
            });
        }

        self.index.insert(key, self.identities.len());
        self.identities.push(identity);
        Ok(())
    }

    /// Exact-match lookup by token. No prefix or partial matching; case-sensitive.
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<&Identity> {
        let position = *self.index.get(&digest(token))?;
        let identity = self.identities.get(position)?;

        let matches: bool = identity
            .token
            .expose_secret()
            .as_bytes()
            .ct_eq(token.as_bytes())
            .into();

        matches.then_some(identity)
    }

    /// Iterates identities in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.iter()
    }

    /// Usernames in registration order.
    #[must_use]
    pub fn usernames(&self) -> Vec<&str> {
        self.identities
            .iter()
            .map(|identity| identity.username.as_str())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
