//! Named authorization policies.
//!
//! A policy is a pure predicate over a [`ClaimsPrincipal`]. Policies are
//! registered once at startup; [`PolicyEvaluator::evaluate`] is then a
//! lock-free lookup plus a function call.
//!
//! # Built-in Policies
//!
//! - [`ADMIN`] - principal holds the `Admin` role
//! - [`EVERYONE`] - always allowed, including anonymous callers
//! - [`THE_BIG_LEBOWSKI`] - nickname `The Dude` and abilities
//!   `Make White Russian` + `Abide`
//!
//! # Example
//!
//! ```rust
//! use auth_core::{ClaimMap, ClaimsPrincipal, PolicyEvaluator};
//!
//! let mut evaluator = PolicyEvaluator::with_builtin_policies();
//! evaluator.register("Bowler", |p: &ClaimsPrincipal| p.is_in_role("League"));
//!
//! let donny = ClaimsPrincipal::new("donny", ["League"], ClaimMap::new());
//! assert_eq!(evaluator.evaluate("Bowler", &donny), Ok(true));
//! assert_eq!(evaluator.evaluate("Admin", &donny), Ok(false));
//! ```

use crate::claims::{ABILITY, NICKNAME};
use crate::error::AuthError;
use crate::principal::ClaimsPrincipal;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Policy requiring the `Admin` role.
pub const ADMIN: &str = "Admin";

/// Policy that admits every caller.
pub const EVERYONE: &str = "Everyone";

/// Composite claims policy.
pub const THE_BIG_LEBOWSKI: &str = "The Big Lebowski";

/// Role checked by the [`ADMIN`] policy.
pub const ADMIN_ROLE: &str = "Admin";

/// A named predicate over a principal. Must be pure: no I/O, no mutation.
///
/// Implemented for every `Fn(&ClaimsPrincipal) -> bool + Send + Sync`.
pub trait Policy: Send + Sync {
    fn evaluate(&self, principal: &ClaimsPrincipal) -> bool;
}

impl<F> Policy for F
where
    F: Fn(&ClaimsPrincipal) -> bool + Send + Sync,
{
    fn evaluate(&self, principal: &ClaimsPrincipal) -> bool {
        self(principal)
    }
}

/// True iff the principal holds the `Admin` role.
#[must_use]
pub fn verify_admin(principal: &ClaimsPrincipal) -> bool {
    principal.is_in_role(ADMIN_ROLE)
}

/// Always true.
#[must_use]
pub fn verify_everyone(_principal: &ClaimsPrincipal) -> bool {
    true
}

/// True iff the nickname claim contains `The Dude` and the ability claim
/// contains both `Make White Russian` and `Abide`.
#[must_use]
pub fn verify_the_big_lebowski(principal: &ClaimsPrincipal) -> bool {
    let claims = principal.claims();
    claims.contains(NICKNAME, "The Dude")
        && claims.contains_all(ABILITY, &["Make White Russian", "Abide"])
}

/// Registry of named policies.
///
/// Registering a name twice replaces the earlier policy.
#[derive(Clone, Default)]
pub struct PolicyEvaluator {
    policies: HashMap<String, Arc<dyn Policy>>,
}

impl PolicyEvaluator {
    /// Creates an evaluator with no policies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an evaluator with `Admin`, `Everyone` and `The Big Lebowski`.
    #[must_use]
    pub fn with_builtin_policies() -> Self {
        let mut evaluator = Self::new();
        evaluator.register(ADMIN, verify_admin);
        evaluator.register(THE_BIG_LEBOWSKI, verify_the_big_lebowski);
        evaluator.register(EVERYONE, verify_everyone);
        evaluator
    }

    /// Registers `policy` under `name`; last registration wins.
    pub fn register<P>(&mut self, name: impl Into<String>, policy: P)
    where
        P: Policy + 'static,
    {
        let name = name.into();
        if self.policies.contains_key(&name) {
            tracing::warn!(target: "gk.policy", policy = %name, "Replacing existing policy");
        }
        self.policies.insert(name, Arc::new(policy));
    }

    /// Evaluates the named policy against `principal`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPolicy` if `name` was never registered.
    pub fn evaluate(&self, name: &str, principal: &ClaimsPrincipal) -> Result<bool, AuthError> {
        let policy = self
            .policies
            .get(name)
            .ok_or_else(|| AuthError::UnknownPolicy(name.to_string()))?;

        Ok(policy.evaluate(principal))
    }

    /// Startup check that a policy a route depends on exists.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPolicy` if `name` was never registered.
    pub fn ensure_registered(&self, name: &str) -> Result<(), AuthError> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(AuthError::UnknownPolicy(name.to_string()))
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    /// Registered policy names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for PolicyEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyEvaluator")
            .field("policies", &self.names())
            .finish()
    }
}
