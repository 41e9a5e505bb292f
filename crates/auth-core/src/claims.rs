//! Case-insensitive, multi-valued claim map.
//!
//! A claim type may carry several values (`ability = {"Abide", "Bowl"}`), and
//! claim types are compared without regard to case, so `"Nickname"` and
//! `"nickname"` name the same entry. The first spelling seen for a type is the
//! one reported by [`ClaimMap::iter`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Claim type holding a principal's nickname(s).
pub const NICKNAME: &str = "nickname";

/// Claim type holding the things a principal is able to do.
pub const ABILITY: &str = "ability";

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClaimEntry {
    claim_type: String,
    values: BTreeSet<String>,
}

/// Mapping from claim type to a set of claim values.
///
/// Inserting a value never replaces earlier values for the same type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, BTreeSet<String>>",
    into = "BTreeMap<String, BTreeSet<String>>"
)]
pub struct ClaimMap {
    // Keyed by the case-folded claim type.
    entries: BTreeMap<String, ClaimEntry>,
}

fn fold(claim_type: &str) -> String {
    claim_type.to_lowercase()
}

impl ClaimMap {
    /// Creates an empty claim map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` to the set for `claim_type`.
    pub fn insert(&mut self, claim_type: impl Into<String>, value: impl Into<String>) {
        self.extend_values(claim_type, std::iter::once(value.into()));
    }

    /// Adds every value to the set for `claim_type`.
    ///
    /// An empty iterator still records the claim type.
    pub fn extend_values<I, V>(&mut self, claim_type: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let claim_type = claim_type.into();
        let entry = self
            .entries
            .entry(fold(&claim_type))
            .or_insert_with(|| ClaimEntry {
                claim_type,
                values: BTreeSet::new(),
            });
        entry.values.extend(values.into_iter().map(Into::into));
    }

    /// Returns the values recorded for `claim_type`, if any.
    #[must_use]
    pub fn get(&self, claim_type: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(&fold(claim_type)).map(|entry| &entry.values)
    }

    /// Returns true if `claim_type` carries `value`. Values are case-sensitive.
    #[must_use]
    pub fn contains(&self, claim_type: &str, value: &str) -> bool {
        self.get(claim_type)
            .is_some_and(|values| values.contains(value))
    }

    /// Returns true if `claim_type` carries every one of `values`.
    ///
    /// A claim type that is absent never matches, even for an empty `values`.
    #[must_use]
    pub fn contains_all(&self, claim_type: &str, values: &[&str]) -> bool {
        self.get(claim_type)
            .is_some_and(|present| values.iter().all(|value| present.contains(*value)))
    }

    /// Iterates claim types (first-seen spelling) with their values, ordered
    /// by folded claim type.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.entries
            .values()
            .map(|entry| (entry.claim_type.as_str(), &entry.values))
    }

    /// Iterates every individual (claim type, value) pair.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().flat_map(|(claim_type, values)| {
            values.iter().map(move |value| (claim_type, value.as_str()))
        })
    }

    /// Number of distinct claim types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no claim type has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Equality ignores the display spelling of claim types.
impl PartialEq for ClaimMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((key, entry), (other_key, other_entry))| {
                    key == other_key && entry.values == other_entry.values
                })
    }
}

impl Eq for ClaimMap {}

impl From<BTreeMap<String, BTreeSet<String>>> for ClaimMap {
    fn from(map: BTreeMap<String, BTreeSet<String>>) -> Self {
        let mut claims = ClaimMap::new();
        for (claim_type, values) in map {
            claims.extend_values(claim_type, values);
        }
        claims
    }
}

impl From<ClaimMap> for BTreeMap<String, BTreeSet<String>> {
    fn from(claims: ClaimMap) -> Self {
        claims
            .entries
            .into_values()
            .map(|entry| (entry.claim_type, entry.values))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for ClaimMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut claims = ClaimMap::new();
        for (claim_type, value) in iter {
            claims.insert(claim_type, value);
        }
        claims
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut claims = ClaimMap::new();
        claims.insert("Nickname", "The Dude");

        assert!(claims.contains("nickname", "The Dude"));
        assert!(claims.contains("NICKNAME", "The Dude"));
        assert_eq!(claims.get("nIcKnAmE").map(BTreeSet::len), Some(1));
    }

    #[test]
    fn test_values_are_case_sensitive() {
        let claims: ClaimMap = [(NICKNAME, "The Dude")].into_iter().collect();

        assert!(!claims.contains(NICKNAME, "the dude"));
    }

    #[test]
    fn test_multiple_values_are_preserved() {
        let mut claims = ClaimMap::new();
        claims.insert(ABILITY, "Abide");
        claims.insert("Ability", "Make White Russian");
        claims.insert(ABILITY, "Abide");

        let values = claims.get(ABILITY).expect("ability claim");
        assert_eq!(values.len(), 2);
        assert_eq!(claims.len(), 1);
        assert!(claims.contains_all(ABILITY, &["Abide", "Make White Russian"]));
    }

    #[test]
    fn test_first_spelling_is_kept() {
        let mut claims = ClaimMap::new();
        claims.insert("Nickname", "The Dude");
        claims.insert("nickname", "His Dudeness");

        let types: Vec<&str> = claims.iter().map(|(claim_type, _)| claim_type).collect();
        assert_eq!(types, vec!["Nickname"]);
    }

    #[test]
    fn test_contains_all_requires_claim_type() {
        let claims = ClaimMap::new();

        assert!(!claims.contains_all(ABILITY, &[]));
        assert!(!claims.contains_all(ABILITY, &["Abide"]));
    }

    #[test]
    fn test_pairs_flattens_values() {
        let mut claims = ClaimMap::new();
        claims.extend_values(ABILITY, ["Abide", "Bowl"]);
        claims.insert(NICKNAME, "The Dude");

        let pairs: Vec<(&str, &str)> = claims.pairs().collect();
        assert_eq!(
            pairs,
            vec![
                (ABILITY, "Abide"),
                (ABILITY, "Bowl"),
                (NICKNAME, "The Dude"),
            ]
        );
    }

    #[test]
    fn test_equality_ignores_key_spelling() {
        let lower: ClaimMap = [("nickname", "The Dude")].into_iter().collect();
        let upper: ClaimMap = [("NICKNAME", "The Dude")].into_iter().collect();

        assert_eq!(lower, upper);
    }

    #[test]
    fn test_deserialize_merges_keys_differing_in_case() {
        let json = r#"{"Ability": ["Abide"], "ability": ["Bowl"]}"#;
        let claims: ClaimMap = serde_json::from_str(json).unwrap();

        assert_eq!(claims.len(), 1);
        assert!(claims.contains_all(ABILITY, &["Abide", "Bowl"]));
    }

    #[test]
    fn test_empty_value_list_records_claim_type() {
        let json = r#"{"nickname": []}"#;
        let claims: ClaimMap = serde_json::from_str(json).unwrap();

        assert_eq!(claims.len(), 1);
        assert!(claims.get(NICKNAME).is_some_and(BTreeSet::is_empty));
    }
}
