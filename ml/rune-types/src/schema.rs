//! Schema versioning for trace files and persisted artifacts.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypesError};

/// Schema version for trace files, checkpoints and export manifests.
///
/// Trace files written before versioning existed carry no version and are
/// read as [`SchemaVersion::CURRENT`].
///
/// # Example
///
/// ```
/// use rune_types::SchemaVersion;
///
/// let v = SchemaVersion::new(1, 3);
/// assert!(v.is_compatible(&SchemaVersion::CURRENT));
/// assert_eq!(v.to_string(), "1.3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl SchemaVersion {
    /// Current schema version.
    pub const CURRENT: Self = Self { major: 1, minor: 0 };

    /// Creates a new schema version.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Checks if this version is compatible with another.
    ///
    /// Compatible means same major version.
    #[must_use]
    pub const fn is_compatible(&self, other: &Self) -> bool {
        self.major == other.major
    }

    /// Fails unless this version can be read by the current code.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::SchemaVersionMismatch` on a major version change.
    pub fn ensure_supported(&self) -> Result<()> {
        if self.is_compatible(&Self::CURRENT) {
            Ok(())
        } else {
            Err(TypesError::schema_mismatch(
                format!("{}.x", Self::CURRENT.major),
                self.to_string(),
            ))
        }
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_is_default() {
        assert_eq!(SchemaVersion::default(), SchemaVersion::CURRENT);
    }

    #[test]
    fn compatibility_is_major_only() {
        let a = SchemaVersion::new(1, 0);
        assert!(a.is_compatible(&SchemaVersion::new(1, 7)));
        assert!(!a.is_compatible(&SchemaVersion::new(2, 0)));
    }

    #[test]
    fn ensure_supported() {
        assert!(SchemaVersion::new(1, 4).ensure_supported().is_ok());
        let err = SchemaVersion::new(2, 0).ensure_supported();
        assert!(matches!(
            err,
            Err(TypesError::SchemaVersionMismatch { .. })
        ));
    }

    #[test]
    fn display() {
        assert_eq!(SchemaVersion::new(3, 1).to_string(), "3.1");
    }
}
