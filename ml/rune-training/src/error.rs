//! Error types for rune-training crate.

use rune_dataset::DatasetError;
use rune_models::ModelError;
use thiserror::Error;

/// Errors that can occur during training.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Invalid training configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Loading, encoding or batching samples failed.
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Building, saving or loading the model failed.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// A split has too few samples to train or validate on.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Numerical instability detected.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    /// Tensor data could not be read back.
    #[error("tensor readback failed: {0}")]
    Readback(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TrainingError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates an insufficient data error.
    #[must_use]
    pub fn insufficient_data(reason: impl Into<String>) -> Self {
        Self::InsufficientData(reason.into())
    }

    /// Creates a numerical instability error.
    #[must_use]
    pub fn numerical_instability(reason: impl Into<String>) -> Self {
        Self::NumericalInstability(reason.into())
    }

    /// Creates a readback error.
    #[must_use]
    pub fn readback(reason: impl Into<String>) -> Self {
        Self::Readback(reason.into())
    }

    /// Creates an IO error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }
}

impl From<std::io::Error> for TrainingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TrainingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for training operations.
pub type Result<T> = std::result::Result<T, TrainingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_config() {
        let err = TrainingError::invalid_config("batch size must be > 0");
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("batch size"));
    }

    #[test]
    fn error_insufficient_data() {
        let err = TrainingError::insufficient_data("validation split is empty");
        assert!(err.to_string().contains("insufficient data"));
    }

    #[test]
    fn error_numerical_instability() {
        let err = TrainingError::numerical_instability("loss is NaN");
        assert!(err.to_string().contains("numerical instability"));
    }

    #[test]
    fn error_from_dataset_error() {
        let err: TrainingError = DatasetError::empty_dataset("no samples").into();
        assert!(matches!(err, TrainingError::Dataset(_)));
        assert!(err.to_string().contains("no samples"));
    }

    #[test]
    fn error_from_model_error() {
        let err: TrainingError = ModelError::invalid_config("d_model").into();
        assert!(matches!(err, TrainingError::Model(_)));
    }

    #[test]
    fn error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: TrainingError = io_err.into();
        assert!(matches!(err, TrainingError::Io(_)));
    }

    #[test]
    fn error_from_serde_error() {
        let serde_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: TrainingError = serde_err.into();
        assert!(matches!(err, TrainingError::Serialization(_)));
    }
}
