//! Reading catalog exports from JSON files

use crate::catalog::item::CatalogItem;
use crate::io::error::{CurationError, Result, output_error};
use serde::Deserialize;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tracing::warn;

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Bare(Vec<Value>),
    Wrapped { items: Vec<Value> },
}

/// Parse a catalog given either as a JSON array or as `{"items": [...]}`
///
/// Entries that are not JSON objects are skipped with a warning.
///
/// # Errors
///
/// Returns the JSON error if the text matches neither layout
pub fn parse_catalog(text: &str) -> serde_json::Result<Vec<CatalogItem>> {
    let entries = match serde_json::from_str(text)? {
        CatalogDocument::Bare(entries) | CatalogDocument::Wrapped { items: entries } => entries,
    };

    let mut items = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        match CatalogItem::from_value(entry) {
            Some(item) => items.push(item),
            None => warn!(position, "skipping catalog entry that is not an object"),
        }
    }
    Ok(items)
}

/// Read and parse a catalog file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogItem>> {
    let text = std::fs::read_to_string(path).map_err(|source| CurationError::CatalogLoad {
        path: path.to_path_buf(),
        source,
    })?;

    parse_catalog(&text).map_err(|source| CurationError::CatalogParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write items as JSON lines, one complete item per line in slice order
///
/// # Errors
///
/// Returns [`CurationError::Output`] if serialization or writing fails
pub fn write_catalog_lines<W: Write>(items: &[CatalogItem], mut out: W) -> Result<()> {
    for item in items {
        serde_json::to_writer(&mut out, item).map_err(output_error)?;
        out.write_all(b"\n").map_err(output_error)?;
    }
    out.flush().map_err(output_error)
}
