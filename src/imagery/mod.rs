/// Candidate extraction and field priorities
pub mod candidates;
/// Reference pre-filter and deny rules
pub mod filter;
/// Image loading collaborators
pub mod loader;
/// Coalescing validation cache
pub mod resolver;
