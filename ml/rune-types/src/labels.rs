//! Label name to class index mapping.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypesError};

/// Ordered set of class labels.
///
/// The index of a label is its position in the list. Labels are sorted
/// lexicographically (byte order) on construction, so the same directory
/// names always produce the same indices regardless of enumeration order.
///
/// Serializes as a plain JSON array of names.
///
/// # Example
///
/// ```
/// use rune_types::LabelSet;
///
/// let labels = LabelSet::from_names(["Water", "Fire", "Earth"]).unwrap();
/// assert_eq!(labels.index_of("Earth"), Some(0));
/// assert_eq!(labels.name(2), Some("Water"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    /// Builds a label set from unordered names, sorting them.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::InvalidLabels` if a name is empty or duplicated.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort_unstable();
        Self::from_ordered(names)
    }

    /// Builds a label set from names already in index order.
    ///
    /// Used when reading persisted label lists, where the stored order is
    /// authoritative.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::InvalidLabels` if a name is empty or duplicated.
    pub fn from_ordered(names: Vec<String>) -> Result<Self> {
        if names.iter().any(String::is_empty) {
            return Err(TypesError::invalid_labels("label names cannot be empty"));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(TypesError::invalid_labels(format!(
                    "duplicate label: {name}"
                )));
            }
        }
        Ok(Self { names })
    }

    /// Returns the number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if there are no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the index of a label name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Returns the label name for an index.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Returns the names in index order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterates over `(index, name)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().map(String::as_str).enumerate()
    }
}

impl TryFrom<Vec<String>> for LabelSet {
    type Error = TypesError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::from_ordered(names)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(labels: LabelSet) -> Self {
        labels.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_indices_are_dense() {
        let labels = LabelSet::from_names(["b", "c", "a"]).unwrap();
        assert_eq!(labels.names(), &["a", "b", "c"]);
        for (i, name) in labels.iter() {
            assert_eq!(labels.index_of(name), Some(i));
        }
        assert_eq!(labels.name(3), None);
    }

    #[test]
    fn sort_is_byte_order() {
        // Uppercase sorts before lowercase, as with a plain string sort.
        let labels = LabelSet::from_names(["air", "Zap", "Unknown"]).unwrap();
        assert_eq!(labels.names(), &["Unknown", "Zap", "air"]);
    }

    #[test]
    fn enumeration_order_does_not_matter() {
        let a = LabelSet::from_names(["x", "y", "z"]).unwrap();
        let b = LabelSet::from_names(["z", "x", "y"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn from_ordered_keeps_order() {
        let labels = LabelSet::from_ordered(vec!["z".into(), "a".into()]).unwrap();
        assert_eq!(labels.index_of("z"), Some(0));
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        assert!(LabelSet::from_names(["a", "a"]).is_err());
        assert!(LabelSet::from_names(["a", ""]).is_err());
    }

    #[test]
    fn serializes_as_list() {
        let labels = LabelSet::from_names(["Fire", "Earth"]).unwrap();
        let json = serde_json::to_string(&labels).unwrap();
        assert_eq!(json, r#"["Earth","Fire"]"#);

        let parsed: LabelSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, labels);
    }

    #[test]
    fn deserialize_rejects_duplicates() {
        let parsed = serde_json::from_str::<LabelSet>(r#"["a","a"]"#);
        assert!(parsed.is_err());
    }
}
