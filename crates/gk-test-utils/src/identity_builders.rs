//! Builder patterns for test identities and settings files

use auth_core::Identity;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::io::Write;
use tempfile::NamedTempFile;

/// Builder for test identities
///
/// # Example
/// ```rust,ignore
/// let identity = TestIdentityBuilder::new()
///     .with_token("secret")
///     .for_user("jlebowski")
///     .with_role("User")
///     .with_claim("nickname", "The Dude")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TestIdentityBuilder {
    token: String,
    username: String,
    roles: Vec<String>,
    claims: BTreeMap<String, Vec<String>>,
}

impl TestIdentityBuilder {
    /// Create a new identity builder with defaults
    pub fn new() -> Self {
        Self {
            token: "test-token".to_string(),
            username: "test-user".to_string(),
            roles: Vec::new(),
            claims: BTreeMap::new(),
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    pub fn for_user(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.push(role.to_string());
        self
    }

    /// Add one claim value; repeated calls for a type accumulate values
    pub fn with_claim(mut self, claim_type: &str, value: &str) -> Self {
        self.claims
            .entry(claim_type.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    /// Build the identity
    pub fn build(self) -> Identity {
        let mut identity = Identity::new(self.token, self.username);
        for role in self.roles {
            identity = identity.with_role(role);
        }
        for (claim_type, values) in self.claims {
            for value in values {
                identity = identity.with_claim(claim_type.clone(), value);
            }
        }
        identity
    }

    /// Build the identity as it appears in a settings file
    pub fn build_json(self) -> Value {
        json!({
            "token": self.token,
            "username": self.username,
            "roles": self.roles,
            "claims": self.claims,
        })
    }
}

impl Default for TestIdentityBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings document with a single environment section.
pub fn settings_json(environment: &str, identities: Vec<Value>, logging: Value) -> String {
    let mut section = Map::new();
    section.insert("authenticationIdentities".to_string(), Value::Array(identities));
    section.insert("logging".to_string(), logging);

    let mut root = Map::new();
    root.insert(environment.to_string(), Value::Object(section));

    Value::Object(root).to_string()
}

/// Writes `contents` to a temporary settings file, removed on drop.
pub fn settings_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create settings file");
    file.write_all(contents.as_bytes())
        .expect("failed to write settings file");
    file
}
