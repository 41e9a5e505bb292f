//! Fixed test tokens and canned identities
//!
//! Tokens are fixed strings so failures are reproducible.

use crate::identity_builders::TestIdentityBuilder;
use auth_core::claims::{ABILITY, NICKNAME};
use auth_core::verifier::TOKEN_PREFIX;
use auth_core::{Identity, IdentityRegistry};

// Tokens
pub const TEST_TOKEN_DUDE: &str = "test-token-the-dude";
pub const TEST_TOKEN_MAUDE: &str = "test-token-maude";
pub const TEST_TOKEN_WALTER: &str = "test-token-walter";

// Usernames
pub const TEST_USER_DUDE: &str = "jlebowski";
pub const TEST_USER_MAUDE: &str = "maude";
pub const TEST_USER_WALTER: &str = "wsobchak";

/// `Authorization` header value for `token`.
pub fn auth_header(token: &str) -> String {
    format!("{TOKEN_PREFIX}{token}")
}

/// Identity that satisfies `The Big Lebowski` but not `Admin`.
pub fn lebowski_identity() -> Identity {
    TestIdentityBuilder::new()
        .with_token(TEST_TOKEN_DUDE)
        .for_user(TEST_USER_DUDE)
        .with_role("User")
        .with_claim(NICKNAME, "The Dude")
        .with_claim(ABILITY, "Make White Russian")
        .with_claim(ABILITY, "Abide")
        .build()
}

/// Identity with the `Admin` role and no claims.
pub fn admin_identity() -> Identity {
    TestIdentityBuilder::new()
        .with_token(TEST_TOKEN_MAUDE)
        .for_user(TEST_USER_MAUDE)
        .with_role("Admin")
        .build()
}

/// Identity with a plain `User` role.
pub fn user_identity() -> Identity {
    TestIdentityBuilder::new()
        .with_token(TEST_TOKEN_WALTER)
        .for_user(TEST_USER_WALTER)
        .with_role("User")
        .build()
}

/// Registry with the three canned identities.
pub fn test_registry() -> IdentityRegistry {
    IdentityRegistry::from_identities([lebowski_identity(), admin_identity(), user_identity()])
        .expect("canned identities use distinct tokens")
}
