//! Error types for rune-dataset crate.

use rune_features::FeatureError;
use rune_types::TypesError;
use thiserror::Error;

/// Errors that can occur in rune-dataset operations.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A trace file could not be read or parsed.
    #[error("trace error: {0}")]
    Trace(TypesError),

    /// Sample not found.
    #[error("sample not found: {0}")]
    SampleNotFound(String),

    /// Invalid split ratio.
    #[error("invalid split ratio: {0} (must be in [0, 1))")]
    InvalidSplitRatio(f32),

    /// No labels or no samples under the dataset root.
    #[error("dataset is empty: {0}")]
    EmptyDataset(String),

    /// Length statistics could not be computed.
    #[error("feature error: {0}")]
    Feature(FeatureError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),
}

impl DatasetError {
    /// Creates a sample not found error.
    #[must_use]
    pub fn sample_not_found(path: impl Into<String>) -> Self {
        Self::SampleNotFound(path.into())
    }

    /// Creates an invalid split ratio error.
    #[must_use]
    pub const fn invalid_split_ratio(ratio: f32) -> Self {
        Self::InvalidSplitRatio(ratio)
    }

    /// Creates an empty dataset error.
    #[must_use]
    pub fn empty_dataset(reason: impl Into<String>) -> Self {
        Self::EmptyDataset(reason.into())
    }

    /// Creates an IO error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization(reason.into())
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Returns `true` if the error comes from a malformed trace file.
    #[must_use]
    pub fn is_malformed_trace(&self) -> bool {
        matches!(self, Self::Trace(err) if err.is_malformed())
    }
}

impl From<TypesError> for DatasetError {
    fn from(err: TypesError) -> Self {
        Self::Trace(err)
    }
}

impl From<FeatureError> for DatasetError {
    fn from(err: FeatureError) -> Self {
        Self::Feature(err)
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for rune-dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
