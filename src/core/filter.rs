//! core::filter
//!
//! Include/exclude filtering of property keys.
//!
//! # Semantics
//!
//! Rules are regular expressions, not shell globs. A rule such as
//! `git.commit.user.*` is matched with regex search semantics, so `.`
//! matches any character and the rule matches anywhere in the key. Escape
//! literal dots (`git\.commit\.`) and anchor (`^...$`) when exact matching
//! is wanted. Existing configurations rely on this, so it is kept as is.
//!
//! Filtering runs in two steps:
//!
//! 1. If any include rule is configured, keep only keys matching at least
//!    one include rule. With no include rules every key is kept.
//! 2. Drop every key matching at least one exclude rule.
//!
//! Exclusion therefore always wins over inclusion. Filtering never fails:
//! an empty map or rules that reject every key produce an empty map.
//!
//! # Example
//!
//! ```
//! use gitstamp::core::filter::PropertyFilter;
//! use gitstamp::core::types::PropertyMap;
//!
//! let filter = PropertyFilter::new(&["git.commit.*"], &["git.commit.user.*"]).unwrap();
//!
//! let props: PropertyMap = [
//!     ("git.commit.id", "abc123"),
//!     ("git.commit.user.name", "Jane"),
//!     ("git.branch", "main"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let filtered = filter.apply(props);
//! assert_eq!(filtered.keys().collect::<Vec<_>>(), vec!["git.commit.id"]);
//! ```

use regex::Regex;
use thiserror::Error;

use super::types::PropertyMap;

/// A rule failed to compile.
#[derive(Debug, Error)]
#[error("invalid property rule '{rule}': {source}")]
pub struct RuleError {
    /// The rule as written in configuration.
    pub rule: String,
    /// Underlying regex error.
    #[source]
    pub source: regex::Error,
}

/// A compiled property-key rule.
#[derive(Debug, Clone)]
pub struct Rule {
    source: String,
    regex: Regex,
}

impl Rule {
    /// Compile a rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] if the rule is not a valid regular expression.
    pub fn new(rule: impl Into<String>) -> Result<Self, RuleError> {
        let source = rule.into();
        let regex = Regex::new(&source).map_err(|e| RuleError {
            rule: source.clone(),
            source: e,
        })?;
        Ok(Self { source, regex })
    }

    /// The rule as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the rule matches anywhere in `key`.
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Rule {}

/// Precompiled include-only and exclude rule sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyFilter {
    include_only: Vec<Rule>,
    exclude: Vec<Rule>,
}

impl PropertyFilter {
    /// Compile include-only and exclude rules.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleError`] encountered.
    pub fn new<S: AsRef<str>>(include_only: &[S], exclude: &[S]) -> Result<Self, RuleError> {
        Ok(Self {
            include_only: compile(include_only)?,
            exclude: compile(exclude)?,
        })
    }

    /// Include-only rules, in configuration order.
    pub fn include_only(&self) -> &[Rule] {
        &self.include_only
    }

    /// Exclude rules, in configuration order.
    pub fn exclude(&self) -> &[Rule] {
        &self.exclude
    }

    /// Whether a key survives both rule sets.
    pub fn keeps(&self, key: &str) -> bool {
        keeps(key, &self.include_only, &self.exclude)
    }

    /// Filter a property map.
    pub fn apply(&self, props: PropertyMap) -> PropertyMap {
        filter(props, &self.include_only, &self.exclude)
    }
}

fn compile<S: AsRef<str>>(rules: &[S]) -> Result<Vec<Rule>, RuleError> {
    rules.iter().map(|r| Rule::new(r.as_ref())).collect()
}

fn keeps(key: &str, include_only: &[Rule], exclude: &[Rule]) -> bool {
    let included = include_only.is_empty() || include_only.iter().any(|r| r.matches(key));
    included && !exclude.iter().any(|r| r.matches(key))
}

/// Filter `props` with the given include-only and exclude rules.
pub fn filter(mut props: PropertyMap, include_only: &[Rule], exclude: &[Rule]) -> PropertyMap {
    props.retain(|key, _| keeps(key, include_only, exclude));
    props
}
