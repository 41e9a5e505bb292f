//! Secret types for protecting identity tokens from accidental logging.
//!
//! Re-exports [`secrecy`] types. Every configured identity token is held as a
//! [`SecretString`], so deriving `Debug` on anything that contains an
//! [`crate::Identity`] is safe: the token renders as `[REDACTED]`.
//!
//! ```rust
//! use auth_core::secret::{ExposeSecret, SecretString};
//!
//! let token = SecretString::from("rug-tied-the-room-together");
//! assert!(!format!("{token:?}").contains("rug"));
//! assert_eq!(token.expose_secret(), "rug-tied-the-room-together");
//! ```
//!
//! Call `expose_secret()` only where the raw bytes are actually needed
//! (digesting and comparing tokens in [`crate::IdentityRegistry`]).

pub use secrecy::{ExposeSecret, SecretString};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_deserialize_keeps_value_hidden() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct TokenEntry {
            username: String,
            token: SecretString,
        }

        let json = r#"{"username": "donny", "token": "out-of-your-element"}"#;
        let entry: TokenEntry = serde_json::from_str(json).expect("deserialize");

        assert_eq!(entry.token.expose_secret(), "out-of-your-element");

        let debug = format!("{entry:?}");
        assert!(debug.contains("donny"));
        assert!(!debug.contains("out-of-your-element"));
    }
}
