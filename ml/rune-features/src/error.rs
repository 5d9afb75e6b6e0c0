//! Error types for rune-features crate.
//!
//! Encoding itself is total and never fails; these errors come from the
//! dataset-level helpers.

use thiserror::Error;

/// Errors that can occur in rune-features operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeatureError {
    /// No values were supplied.
    #[error("no trace lengths to estimate from")]
    EmptyInput,

    /// Percentile outside `[0, 100]`.
    #[error("invalid percentile {0}: must be in [0, 100]")]
    InvalidPercentile(f64),
}

/// Result type for rune-features operations.
pub type Result<T> = std::result::Result<T, FeatureError>;
