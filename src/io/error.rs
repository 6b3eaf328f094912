//! Error types for catalog loading, configuration and image loading

use std::fmt;
use std::path::PathBuf;

/// Main error type for all fallible curation operations
///
/// The distribution and resolution algorithms themselves never fail; these
/// errors only surface while loading catalogs, validating configuration or
/// running the command line tool.
#[derive(Debug)]
pub enum CurationError {
    /// Failed to read a catalog file
    CatalogLoad {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Catalog file was not valid JSON of the expected shape
    CatalogParse {
        /// Path of the file
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Failed to read a configuration file
    ConfigLoad {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Configuration file was not valid JSON of the expected shape
    ConfigParse {
        /// Path of the file
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Configuration or argument validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// A configured deny pattern is not a valid regular expression
    InvalidPattern {
        /// The offending pattern text
        pattern: String,
        /// Underlying regex compilation error
        source: regex::Error,
    },

    /// The async runtime could not be started
    Runtime {
        /// Underlying I/O error from the runtime builder
        source: std::io::Error,
    },

    /// Results could not be written to the output stream
    Output {
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for CurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CatalogLoad { path, source } => {
                write!(f, "Failed to read '{}': {source}", path.display())
            }
            Self::CatalogParse { path, source } => {
                write!(f, "Failed to parse '{}': {source}", path.display())
            }
            Self::ConfigLoad { path, source } => {
                write!(f, "Failed to read configuration '{}': {source}", path.display())
            }
            Self::ConfigParse { path, source } => {
                write!(
                    f,
                    "Failed to parse configuration '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::InvalidPattern { pattern, source } => {
                write!(f, "Invalid deny pattern '{pattern}': {source}")
            }
            Self::Runtime { source } => {
                write!(f, "Failed to start async runtime: {source}")
            }
            Self::Output { source } => {
                write!(f, "Failed to write output: {source}")
            }
        }
    }
}

impl std::error::Error for CurationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CatalogLoad { source, .. }
            | Self::ConfigLoad { source, .. }
            | Self::Runtime { source }
            | Self::Output { source } => Some(source),
            Self::CatalogParse { source, .. } | Self::ConfigParse { source, .. } => Some(source),
            Self::InvalidPattern { source, .. } => Some(source),
            Self::InvalidParameter { .. } => None,
        }
    }
}

/// Convenience type alias for curation results
pub type Result<T> = std::result::Result<T, CurationError>;

/// Wrap a failure to write command output, including serialization errors
pub fn output_error(err: impl Into<std::io::Error>) -> CurationError {
    CurationError::Output { source: err.into() }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> CurationError {
    CurationError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Failure reported by an image loader
///
/// The resolver folds every variant into a `false` validation result; the
/// distinction only matters for logging.
#[derive(Debug)]
pub enum LoadError {
    /// Reference could not be turned into a loadable location
    Unresolvable {
        /// The reference as it appeared in the catalog
        reference: String,
        /// Why it could not be resolved
        reason: String,
    },

    /// Network or file transport failed
    Transport {
        /// Location that was requested
        location: String,
        /// Description of the transport failure
        reason: String,
    },

    /// Server answered with a non-success status
    Status {
        /// Location that was requested
        location: String,
        /// HTTP status code received
        status: u16,
    },

    /// Response grew past the byte limit before its dimensions were known
    TooLarge {
        /// Location that was requested
        location: String,
        /// Bytes read before giving up
        limit: usize,
    },

    /// Payload was not a decodable image
    Decode {
        /// Location that was requested
        location: String,
        /// Underlying decoder error
        source: image::ImageError,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolvable { reference, reason } => {
                write!(f, "Cannot resolve '{reference}': {reason}")
            }
            Self::Transport { location, reason } => {
                write!(f, "Transport failure for '{location}': {reason}")
            }
            Self::Status { location, status } => {
                write!(f, "'{location}' answered with status {status}")
            }
            Self::TooLarge { location, limit } => {
                write!(f, "'{location}' exceeded {limit} bytes without an image header")
            }
            Self::Decode { location, source } => {
                write!(f, "'{location}' is not a decodable image: {source}")
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}
