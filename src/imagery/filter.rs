//! Network-free pre-filter for image references

use crate::io::configuration::{DEFAULT_DENY_PATTERNS, DEFAULT_DENY_URLS, MIN_REFERENCE_LENGTH};
use crate::io::error::{CurationError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Serializable deny rules, compiled into a [`ReferenceFilter`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Exact placeholder URLs to reject
    pub deny_urls: Vec<String>,
    /// Regular expressions matching placeholder services or signatures
    pub deny_patterns: Vec<String>,
    /// Minimum reference length in characters
    pub min_length: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            deny_urls: DEFAULT_DENY_URLS.iter().map(ToString::to_string).collect(),
            deny_patterns: DEFAULT_DENY_PATTERNS
                .iter()
                .map(ToString::to_string)
                .collect(),
            min_length: MIN_REFERENCE_LENGTH,
        }
    }
}

impl FilterConfig {
    /// Compile the deny patterns
    ///
    /// # Errors
    ///
    /// Returns [`CurationError::InvalidPattern`] for the first pattern that
    /// is not a valid regular expression
    pub fn compile(&self) -> Result<ReferenceFilter> {
        let deny_patterns = self
            .deny_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| CurationError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ReferenceFilter {
            deny_urls: self.deny_urls.iter().cloned().collect(),
            deny_patterns,
            min_length: self.min_length,
        })
    }
}

/// Decides whether a raw field value is worth probing
///
/// Purely syntactic: the same input always yields the same answer and no
/// request is ever made.
#[derive(Clone, Debug)]
pub struct ReferenceFilter {
    deny_urls: HashSet<String>,
    deny_patterns: Vec<Regex>,
    min_length: usize,
}

impl Default for ReferenceFilter {
    fn default() -> Self {
        Self {
            deny_urls: DEFAULT_DENY_URLS.iter().map(ToString::to_string).collect(),
            deny_patterns: DEFAULT_DENY_PATTERNS
                .iter()
                .filter_map(|pattern| Regex::new(pattern).ok())
                .collect(),
            min_length: MIN_REFERENCE_LENGTH,
        }
    }
}

static DEFAULT_FILTER: LazyLock<ReferenceFilter> = LazyLock::new(ReferenceFilter::default);

/// Check a raw field value against the default deny rules
pub fn is_valid_reference(value: &Value) -> bool {
    DEFAULT_FILTER.is_valid_reference(value)
}

impl ReferenceFilter {
    /// Accept only non-empty strings that pass [`ReferenceFilter::accepts`]
    pub fn is_valid_reference(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|reference| self.accepts(reference))
    }

    /// Check a reference string, ignoring surrounding whitespace
    pub fn accepts(&self, reference: &str) -> bool {
        let reference = reference.trim();

        if reference.chars().count() < self.min_length {
            return false;
        }
        if !has_loadable_form(reference) {
            return false;
        }
        if self.deny_urls.contains(reference) {
            return false;
        }

        !self
            .deny_patterns
            .iter()
            .any(|pattern| pattern.is_match(reference))
    }

    /// Number of compiled deny patterns
    pub fn pattern_count(&self) -> usize {
        self.deny_patterns.len()
    }
}

// Absolute http(s) URLs or site-relative paths
fn has_loadable_form(reference: &str) -> bool {
    let starts_with_ignore_case = |prefix: &str| {
        reference
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };

    starts_with_ignore_case("http://")
        || starts_with_ignore_case("https://")
        || reference.starts_with('/')
        || reference.starts_with("./")
}
