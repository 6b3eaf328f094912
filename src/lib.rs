//! Content curation for a parts storefront
//!
//! Two independent pieces: a feed distributor that shuffles a catalog while
//! keeping any one category from dominating consecutive slots, and an image
//! candidate resolver that finds the first loadable image of an item while
//! memoizing results and coalescing concurrent probes of the same URL.

#![forbid(unsafe_code)]

/// Catalog records and category access
pub mod catalog;
/// Shuffling and category-limited feed ordering
pub mod curation;
/// Image candidate extraction, filtering and validation
pub mod imagery;
/// Configuration, errors, logging, progress and the command line
pub mod io;

pub use catalog::item::{CatalogItem, Categorized};
pub use curation::distribution::{
    DistributionConfig, FeedDistributor, distribute_with_category_limit,
};
pub use curation::shuffle::shuffle;
pub use imagery::candidates::{FieldPriorityTable, ImageCandidate, extract_candidates};
pub use imagery::resolver::ImageCandidateResolver;
pub use io::error::{CurationError, Result};
