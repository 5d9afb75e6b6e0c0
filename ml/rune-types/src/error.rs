//! Error types for rune-types crate.

use thiserror::Error;

/// Errors that can occur in rune-types operations.
#[derive(Debug, Error)]
pub enum TypesError {
    /// A trace record could not be interpreted.
    ///
    /// Covers missing `strokes`, non-numeric coordinates, non-integer
    /// timestamps, non-finite values and incompatible schema versions.
    #[error("malformed trace {path}: {reason}")]
    MalformedTrace {
        /// Source of the trace (file path or `<memory>`).
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// A trace file could not be read.
    #[error("failed to read trace {path}: {reason}")]
    Io {
        /// Path to the trace file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Schema version mismatch.
    #[error("schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersionMismatch {
        /// Expected version.
        expected: String,
        /// Actual version.
        actual: String,
    },

    /// Invalid encoder configuration.
    #[error("invalid encoder configuration: {0}")]
    InvalidConfig(String),

    /// Invalid label set.
    #[error("invalid label set: {0}")]
    InvalidLabels(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TypesError {
    /// Creates a malformed trace error.
    #[must_use]
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTrace {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an IO error for a trace path.
    #[must_use]
    pub fn io(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a schema version mismatch error.
    #[must_use]
    pub fn schema_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::SchemaVersionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an invalid config error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates an invalid labels error.
    #[must_use]
    pub fn invalid_labels(reason: impl Into<String>) -> Self {
        Self::InvalidLabels(reason.into())
    }

    /// Returns `true` if this error describes unusable trace content.
    ///
    /// IO failures are not malformed traces: the file may be fine once
    /// it becomes readable.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedTrace { .. } | Self::SchemaVersionMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for TypesError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for rune-types operations.
pub type Result<T> = std::result::Result<T, TypesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_malformed() {
        let err = TypesError::malformed("a/b.json", "missing field `strokes`");
        assert!(err.to_string().contains("a/b.json"));
        assert!(err.to_string().contains("strokes"));
        assert!(err.is_malformed());
    }

    #[test]
    fn error_io_is_not_malformed() {
        let err = TypesError::io("a/b.json", "permission denied");
        assert!(err.to_string().contains("permission denied"));
        assert!(!err.is_malformed());
    }

    #[test]
    fn error_schema_mismatch() {
        let err = TypesError::schema_mismatch("1.x", "2.0");
        assert!(err.to_string().contains("1.x"));
        assert!(err.to_string().contains("2.0"));
        assert!(err.is_malformed());
    }

    #[test]
    fn error_invalid_config() {
        let err = TypesError::invalid_config("max_points must be > 0");
        assert!(err.to_string().contains("max_points"));
    }

    #[test]
    fn error_from_serde_error() {
        let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: TypesError = json_err.into();
        assert!(matches!(err, TypesError::Serialization(_)));
    }
}
