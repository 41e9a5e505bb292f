//! # GK Test Utilities
//!
//! Shared test utilities for the Gatekeeper service.
//!
//! This crate provides:
//! - Fixed test tokens and canned identities (`lebowski_identity`, `admin_identity`)
//! - Test data builders (`TestIdentityBuilder`, `settings_json`)
//! - Server test harness (`TestGatekeeperServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gk_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestGatekeeperServer::spawn(vec![lebowski_identity()]).await?;
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/api/v1/lebowski", server.url()))
//!         .header("authorization", auth_header(TEST_TOKEN_DUDE))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod identity_builders;
pub mod server_harness;

// Re-export commonly used items
pub use fixtures::*;
pub use identity_builders::*;
pub use server_harness::*;
