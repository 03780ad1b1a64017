//! core::types
//!
//! Core domain types for gitstamp.
//!
//! # Types
//!
//! - [`PropertyMap`] - Sorted string-keyed map of extracted git metadata
//! - [`Fingerprint`] - Content hash of a property map for up-to-date checks
//!
//! # Ordering
//!
//! A [`PropertyMap`] iterates in key order. Insertion order carries no
//! meaning, and sorting keeps serialized output and fingerprints stable
//! across runs.
//!
//! # Examples
//!
//! ```
//! use gitstamp::core::types::{Fingerprint, PropertyMap};
//!
//! let mut props = PropertyMap::new();
//! props.insert("git.commit.id", "abc123");
//! props.insert("git.branch", "main");
//!
//! let keys: Vec<&str> = props.keys().collect();
//! assert_eq!(keys, vec!["git.branch", "git.commit.id"]);
//!
//! assert_eq!(Fingerprint::compute(&props), Fingerprint::compute(&props.clone()));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Suffix identifying the build timestamp property (e.g. `git.build.time`).
pub const BUILD_TIME: &str = "build.time";

/// Ordered mapping from namespaced property key to value.
///
/// Keys are unique. The map is produced fresh for each build by the
/// extractor and then owned by the result publisher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap(BTreeMap<String, String>);

impl PropertyMap {
    /// Create an empty property map.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert a property, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.0.retain(|k, v| keep(k, v));
    }
}

impl From<BTreeMap<String, String>> for PropertyMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for PropertyMap {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Content hash of a property map.
///
/// Used as the up-to-date key for the generation task: two runs that
/// publish equal maps (after stabilization) produce equal fingerprints.
///
/// # Example
///
/// ```
/// use gitstamp::core::types::{Fingerprint, PropertyMap};
///
/// let a: PropertyMap = [("git.commit.id", "abc"), ("git.build.time", "")]
///     .into_iter()
///     .collect();
/// let b: PropertyMap = [("git.build.time", ""), ("git.commit.id", "abc")]
///     .into_iter()
///     .collect();
///
/// assert_eq!(Fingerprint::compute(&a), Fingerprint::compute(&b));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from a property map.
    ///
    /// Entries are hashed in key order, so the result does not depend on
    /// how the map was built.
    pub fn compute(props: &PropertyMap) -> Self {
        Self::compute_with(props, std::iter::empty::<(&str, &str)>())
    }

    /// Compute a fingerprint from a property map plus extra labelled inputs.
    ///
    /// Extra inputs are hashed after the properties, in the order given.
    pub fn compute_with<'a>(
        props: &PropertyMap,
        extra: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut hasher = Sha256::new();
        for (key, value) in props.iter() {
            hasher.update(key.as_bytes());
            hasher.update(b"\0");
            hasher.update(value.as_bytes());
            hasher.update(b"\n");
        }
        for (label, value) in extra {
            hasher.update(b"\x01");
            hasher.update(label.as_bytes());
            hasher.update(b"\0");
            hasher.update(value.as_bytes());
            hasher.update(b"\n");
        }

        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
