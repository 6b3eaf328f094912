//! Curation constants and runtime configuration defaults

use crate::curation::distribution::DistributionConfig;
use crate::imagery::candidates::FieldPriorityTable;
use crate::imagery::filter::FilterConfig;
use crate::imagery::resolver::ProbeConfig;
use crate::io::error::{CurationError, Result, invalid_parameter};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Feed distribution
/// Maximum number of same-category items allowed back to back
pub const DEFAULT_MAX_CONSECUTIVE: usize = 2;
/// Chance of leaving the current category before the hard limit is reached
pub const DEFAULT_SWITCH_PROBABILITY: f64 = 0.7;
/// Bucket for items without a usable category
pub const OTHER_CATEGORY: &str = "Other";

// Image probing
/// Time allowed for a single image load before it counts as failed
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;
/// Images narrower or shorter than this are treated as placeholders
pub const DEFAULT_MIN_DIMENSION: u32 = 50;
/// Number of candidates probed per item before giving up
pub const DEFAULT_MAX_CANDIDATES: usize = 5;
/// Bytes read from an HTTP response while looking for image dimensions
pub const MAX_PROBE_BYTES: usize = 4 * 1024 * 1024;
/// Length of the URL prefix shown in cache diagnostics
pub const STATS_URL_PREFIX_LEN: usize = 50;

// Candidate extraction
/// References shorter than this are never considered
pub const MIN_REFERENCE_LENGTH: usize = 10;
/// Priority gap between consecutive array-valued fields
pub const ARRAY_FIELD_PRIORITY_STRIDE: u32 = 100;

/// Single-valued image fields, highest priority first
pub const DEFAULT_SINGLE_FIELDS: &[&str] = &[
    "image",
    "image_url",
    "imageUrl",
    "main_image",
    "thumbnail",
    "photo",
];

/// Array-valued image fields, highest priority first
pub const DEFAULT_ARRAY_FIELDS: &[&str] = &["images", "gallery", "photos"];

/// Known placeholder images rejected by exact match
pub const DEFAULT_DENY_URLS: &[&str] = &[
    "https://via.placeholder.com/150",
    "https://via.placeholder.com/150x150",
    "https://via.placeholder.com/300",
    "https://placehold.co/150x150",
    "/images/placeholder.png",
    "/placeholder.svg",
];

/// Placeholder services and signatures rejected by pattern
///
/// Bare `data:` references already fail the scheme check, so the inlined SVG
/// signature is matched anywhere in the reference to catch it when wrapped
/// by an image proxy URL.
pub const DEFAULT_DENY_PATTERNS: &[&str] = &[
    r"(?i)^https?://(www\.)?via\.placeholder\.com/",
    r"(?i)^https?://(www\.)?placehold\.(it|co)/",
    r"(?i)^https?://(www\.)?placeholder\.com/",
    r"(?i)^https?://(www\.)?dummyimage\.com/",
    r"(?i)^https?://(www\.)?example\.(com|org|net)/.*\.(jpe?g|png|gif|webp|svg)$",
    r"data:image/svg\+xml;base64,PHN2Zy",
];

/// Complete configuration for the curation tool
///
/// Every section falls back to its defaults when omitted from the JSON file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    /// Feed ordering parameters
    pub distribution: DistributionConfig,
    /// Image probe parameters
    pub probe: ProbeConfig,
    /// Image field priority table
    pub fields: FieldPriorityTable,
    /// Reference pre-filter rules
    pub filter: FilterConfig,
}

impl CurationConfig {
    /// Read and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails validation
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CurationError::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| CurationError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges and that every deny pattern compiles
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter or pattern found
    pub fn validate(&self) -> Result<()> {
        if self.distribution.max_consecutive == 0 {
            return Err(invalid_parameter(
                "distribution.max_consecutive",
                &self.distribution.max_consecutive,
                &"must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.distribution.switch_probability) {
            return Err(invalid_parameter(
                "distribution.switch_probability",
                &self.distribution.switch_probability,
                &"must lie within [0, 1]",
            ));
        }
        if self.probe.timeout_ms == 0 {
            return Err(invalid_parameter(
                "probe.timeout_ms",
                &self.probe.timeout_ms,
                &"must be positive",
            ));
        }
        if self.probe.max_candidates == 0 {
            return Err(invalid_parameter(
                "probe.max_candidates",
                &self.probe.max_candidates,
                &"must be at least 1",
            ));
        }
        self.filter.compile().map(|_| ())
    }
}
