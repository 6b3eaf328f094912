/// Category-limited feed ordering
pub mod distribution;
/// Uniform in-place permutation
pub mod shuffle;
