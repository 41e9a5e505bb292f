//! Credential verification.
//!
//! Turns the raw value of the `Authorization` header into an [`AuthResult`].
//!
//! # Header Format
//!
//! ```text
//! Authorization: Gatekeeper <token>
//! ```
//!
//! Missing headers and unknown tokens are expected on unauthenticated traffic
//! and are returned as [`AuthResult::Failure`], never as errors. The verifier
//! does not log; the host decides what to record.

use crate::identity::IdentityRegistry;
use crate::principal::ClaimsPrincipal;
use std::sync::Arc;
use thiserror::Error;

/// Name of the HTTP header carrying the credential.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Authentication scheme name, used in `WWW-Authenticate` challenges.
pub const AUTHENTICATION_SCHEME: &str = "Gatekeeper";

/// Fixed prefix preceding the raw token in the header value.
pub const TOKEN_PREFIX: &str = "Gatekeeper ";

/// Why authentication did not produce a principal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No credential header was sent.
    #[error("header not found")]
    HeaderMissing,

    /// Header did not carry the expected prefix or a registered token.
    #[error("invalid header")]
    InvalidCredential,
}

impl AuthFailure {
    /// Human-readable reason, suitable for a 401 response body.
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            AuthFailure::HeaderMissing => "header not found",
            AuthFailure::InvalidCredential => "invalid header",
        }
    }

    /// Bounded label for metrics.
    #[must_use]
    pub fn as_label(self) -> &'static str {
        match self {
            AuthFailure::HeaderMissing => "header_missing",
            AuthFailure::InvalidCredential => "invalid_credential",
        }
    }
}

/// Outcome of [`CredentialVerifier::authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Success(ClaimsPrincipal),
    Failure(AuthFailure),
}

impl AuthResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, AuthResult::Success(_))
    }

    /// The principal, if authentication succeeded.
    #[must_use]
    pub fn principal(&self) -> Option<&ClaimsPrincipal> {
        match self {
            AuthResult::Success(principal) => Some(principal),
            AuthResult::Failure(_) => None,
        }
    }

    /// Converts into a `Result` for callers that want `?`.
    ///
    /// # Errors
    ///
    /// Returns the `AuthFailure` when authentication failed.
    pub fn into_result(self) -> Result<ClaimsPrincipal, AuthFailure> {
        match self {
            AuthResult::Success(principal) => Ok(principal),
            AuthResult::Failure(failure) => Err(failure),
        }
    }
}

/// Resolves credentials against one registry snapshot.
///
/// Cheap to construct: it only holds an `Arc` to the registry.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    registry: Arc<IdentityRegistry>,
}

impl CredentialVerifier {
    #[must_use]
    pub fn new(registry: Arc<IdentityRegistry>) -> Self {
        Self { registry }
    }

    /// Authenticates a raw header value (`None` when the header is absent).
    #[must_use]
    pub fn authenticate(&self, header_value: Option<&str>) -> AuthResult {
        let Some(header_value) = header_value else {
            return AuthResult::Failure(AuthFailure::HeaderMissing);
        };

        let Some(token) = header_value.strip_prefix(TOKEN_PREFIX) else {
            return AuthResult::Failure(AuthFailure::InvalidCredential);
        };

        match self.registry.lookup(token) {
            Some(identity) => AuthResult::Success(ClaimsPrincipal::from_identity(identity)),
            None => AuthResult::Failure(AuthFailure::InvalidCredential),
        }
    }

    /// The registry snapshot this verifier resolves against.
    #[must_use]
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::claims::{ABILITY, NICKNAME};
    use crate::identity::Identity;
    use crate::secret::ExposeSecret;

    fn identities() -> Vec<Identity> {
        vec![
            Identity::new("abide-7Qx", "jlebowski")
                .with_role("User")
                .with_claim(NICKNAME, "The Dude")
                .with_claim(ABILITY, "Make White Russian")
                .with_claim(ABILITY, "Abide"),
            Identity::new("nihilist-99", "uli").with_role("User"),
            Identity::new("admin-Maude", "maude")
                .with_role("Admin")
                .with_role("User"),
        ]
    }

    fn verifier() -> CredentialVerifier {
        let registry = IdentityRegistry::from_identities(identities()).unwrap();
        CredentialVerifier::new(Arc::new(registry))
    }

    fn header(token: &str) -> String {
        format!("{TOKEN_PREFIX}{token}")
    }

    #[test]
    fn test_every_registered_identity_authenticates() {
        let verifier = verifier();

        for identity in identities() {
            let result = verifier.authenticate(Some(header(identity.token.expose_secret()).as_str()));
            let principal = result.into_result().expect("registered token");

            assert_eq!(principal.username(), identity.username);
            let expected_roles: std::collections::BTreeSet<String> =
                identity.roles.iter().cloned().collect();
            assert_eq!(principal.roles(), &expected_roles);
            for (claim_type, value) in identity.claims.pairs() {
                assert!(principal.has_claim(claim_type, value));
            }
        }
    }

    #[test]
    fn test_missing_header() {
        let result = verifier().authenticate(None);

        assert_eq!(result, AuthResult::Failure(AuthFailure::HeaderMissing));
        if let AuthResult::Failure(failure) = result {
            assert_eq!(failure.reason(), "header not found");
        }
    }

    #[test]
    fn test_unknown_token() {
        let result = verifier().authenticate(Some(header("bowling-ball").as_str()));

        assert_eq!(result, AuthResult::Failure(AuthFailure::InvalidCredential));
        assert_eq!(AuthFailure::InvalidCredential.reason(), "invalid header");
    }

    #[test]
    fn test_wrong_prefix_is_invalid() {
        let verifier = verifier();

        for value in [
            "Bearer abide-7Qx",
            "gatekeeper abide-7Qx",
            "Gatekeeperabide-7Qx",
            "abide-7Qx",
            " Gatekeeper abide-7Qx",
            "",
        ] {
            assert_eq!(
                verifier.authenticate(Some(value)),
                AuthResult::Failure(AuthFailure::InvalidCredential),
                "value {value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_token_is_case_sensitive() {
        let result = verifier().authenticate(Some(header("ABIDE-7QX").as_str()));

        assert!(!result.is_success());
    }

    #[test]
    fn test_trailing_or_doubled_whitespace_is_invalid() {
        let verifier = verifier();

        assert!(!verifier.authenticate(Some(header("abide-7Qx ").as_str())).is_success());
        assert!(!verifier
            .authenticate(Some("Gatekeeper  abide-7Qx"))
            .is_success());
    }

    #[test]
    fn test_bare_prefix_is_invalid() {
        let result = verifier().authenticate(Some(TOKEN_PREFIX));

        assert_eq!(result, AuthResult::Failure(AuthFailure::InvalidCredential));
    }

    #[test]
    fn test_success_exposes_principal() {
        let result = verifier().authenticate(Some(header("admin-Maude").as_str()));

        let principal = result.principal().expect("principal");
        assert!(principal.is_authenticated());
        assert!(principal.is_in_role("Admin"));
    }

    #[test]
    fn test_authenticate_does_not_mutate_registry() {
        let verifier = verifier();
        let before = verifier.registry().usernames().join(",");

        let _ = verifier.authenticate(Some(header("abide-7Qx").as_str()));
        let _ = verifier.authenticate(Some(header("nope").as_str()));

        assert_eq!(verifier.registry().usernames().join(","), before);
    }

    #[test]
    fn test_failure_labels_are_bounded() {
        assert_eq!(AuthFailure::HeaderMissing.as_label(), "header_missing");
        assert_eq!(
            AuthFailure::InvalidCredential.as_label(),
            "invalid_credential"
        );
        assert_eq!(AuthFailure::HeaderMissing.to_string(), "header not found");
    }
}
