//! The verified, per-request representation of "who is calling".

use crate::claims::ClaimMap;
use crate::identity::Identity;
use std::collections::BTreeSet;

/// Result of a successful authentication, or the anonymous stand-in for a
/// caller that did not authenticate.
///
/// A principal is built once and never mutated; there are no setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsPrincipal {
    username: String,
    roles: BTreeSet<String>,
    claims: ClaimMap,
    authenticated: bool,
}

impl ClaimsPrincipal {
    /// Creates an authenticated principal.
    #[must_use]
    pub fn new<R, S>(username: impl Into<String>, roles: R, claims: ClaimMap) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            claims,
            authenticated: true,
        }
    }

    /// Creates the principal used for callers that presented no valid
    /// credential: empty name, no roles, no claims.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            username: String::new(),
            roles: BTreeSet::new(),
            claims: ClaimMap::new(),
            authenticated: false,
        }
    }

    /// Builds a principal from a matched identity, copying its username,
    /// roles and every claim value.
    #[must_use]
    pub fn from_identity(identity: &Identity) -> Self {
        let mut claims = ClaimMap::new();
        for (claim_type, values) in identity.claims.iter() {
            claims.extend_values(claim_type, values.iter().cloned());
        }

        Self::new(identity.username.clone(), identity.roles.iter().cloned(), claims)
    }

    /// The authenticated username (empty for the anonymous principal).
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    #[must_use]
    pub fn claims(&self) -> &ClaimMap {
        &self.claims
    }

    /// False only for [`ClaimsPrincipal::anonymous`].
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Role membership check. Role names are case-sensitive.
    #[must_use]
    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Returns true if `claim_type` (case-insensitive) carries `value`.
    #[must_use]
    pub fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        self.claims.contains(claim_type, value)
    }
}
