//! Per-route policy gate.
//!
//! Evaluates one named policy against the principal left in extensions by
//! [`super::auth::authenticate`]. Requests without a principal are evaluated
//! as the anonymous principal, so `Everyone` routes stay public.
//!
//! # Response
//!
//! - Continues to the handler if the policy allows the principal
//! - 401 Unauthorized if the principal is anonymous and denied
//! - 403 Forbidden if the principal is authenticated and denied

use crate::errors::GatekeeperError;
use crate::observability::metrics::record_policy_decision;
use auth_core::{AuthError, AuthFailure, ClaimsPrincipal, PolicyEvaluator};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// State for one policy gate.
#[derive(Clone)]
pub struct PolicyState {
    pub evaluator: Arc<PolicyEvaluator>,
    pub policy: String,
}

impl PolicyState {
    /// Builds a gate for `policy`, failing if the evaluator does not know it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPolicy` if `policy` was never registered.
    pub fn new(evaluator: Arc<PolicyEvaluator>, policy: &str) -> Result<Self, AuthError> {
        evaluator.ensure_registered(policy)?;
        Ok(Self {
            evaluator,
            policy: policy.to_string(),
        })
    }
}

#[instrument(skip_all, name = "gk.middleware.policy")]
pub async fn require_policy(
    State(state): State<Arc<PolicyState>>,
    req: Request,
    next: Next,
) -> Result<Response, GatekeeperError> {
    let (allowed, authenticated) = {
        let anonymous;
        let principal = match req.extensions().get::<ClaimsPrincipal>() {
            Some(principal) => principal,
            None => {
                anonymous = ClaimsPrincipal::anonymous();
                &anonymous
            }
        };
        (
            state.evaluator.evaluate(&state.policy, principal)?,
            principal.is_authenticated(),
        )
    };

    if allowed {
        record_policy_decision(&state.policy, "allow");
        return Ok(next.run(req).await);
    }

    if authenticated {
        tracing::debug!(target: "gk.middleware.policy", "Policy denied authenticated principal");
        record_policy_decision(&state.policy, "forbidden");
        return Err(GatekeeperError::Forbidden(state.policy.clone()));
    }

    let failure = req
        .extensions()
        .get::<AuthFailure>()
        .copied()
        .unwrap_or(AuthFailure::HeaderMissing);

    tracing::debug!(
        target: "gk.middleware.policy",
        reason = %failure,
        "Policy denied anonymous request"
    );
    record_policy_decision(&state.policy, "unauthorized");
    Err(GatekeeperError::Unauthorized(failure.reason().to_string()))
}
