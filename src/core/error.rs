//! Core capability errors (validation, bounds).
//!
//! These are bounded and stable: core errors represent domain/refusal
//! states, not library implementation details.

use thiserror::Error;

/// Index outside the offer list bounds.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("offer index {index} out of bounds for list of {len}")]
pub struct IndexOutOfBounds {
    pub index: usize,
    pub len: usize,
}

/// Canonical error enum for core capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    IndexOutOfBounds(#[from] IndexOutOfBounds),

    #[error("bucket table cutoffs must be strictly ascending (cutoff {cutoff} at position {position})")]
    UnsortedBucketTable { cutoff: i32, position: usize },
}

impl CoreError {
    pub fn out_of_bounds(index: usize, len: usize) -> Self {
        IndexOutOfBounds { index, len }.into()
    }
}
