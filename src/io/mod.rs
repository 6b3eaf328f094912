//! Input/output concerns around the curation algorithms

/// Catalog file loading
pub mod catalog;
/// Command line interface
pub mod cli;
/// Constants and the JSON configuration file
pub mod configuration;
/// Error types
pub mod error;
/// Tracing subscriber setup
pub mod logging;
/// Progress reporting for batch resolution
pub mod progress;
