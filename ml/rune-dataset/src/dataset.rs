//! Lazily encoded samples.

use rune_features::{EncodedSequence, encode};
use rune_types::{EncoderConfig, load_trace};

use crate::error::{DatasetError, Result};
use crate::index::SampleEntry;

/// One encoded training example.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSample {
    /// Encoded trace.
    pub sequence: EncodedSequence,

    /// Dense label index.
    pub label: usize,

    /// File name of the source trace, for error reports.
    pub file_name: String,
}

/// A view over sample entries that loads and encodes on every access.
///
/// Nothing is cached between calls, so edits to trace files are picked up
/// on the next epoch.
#[derive(Debug, Clone)]
pub struct RuneDataset {
    entries: Vec<SampleEntry>,
    encoder: EncoderConfig,
}

impl RuneDataset {
    /// Creates a dataset over `entries` encoded with `encoder`.
    #[must_use]
    pub const fn new(entries: Vec<SampleEntry>, encoder: EncoderConfig) -> Self {
        Self { entries, encoder }
    }

    /// Returns the encoder configuration.
    #[must_use]
    pub const fn encoder(&self) -> &EncoderConfig {
        &self.encoder
    }

    /// Returns the underlying entries.
    #[must_use]
    pub fn entries(&self) -> &[SampleEntry] {
        &self.entries
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads and encodes one sample.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::SampleNotFound`] for an out-of-range index
    /// and [`DatasetError::Trace`] if the file no longer loads.
    pub fn get(&self, index: usize) -> Result<EncodedSample> {
        let entry = self.entries.get(index).ok_or_else(|| {
            DatasetError::sample_not_found(format!("index {index} of {}", self.entries.len()))
        })?;
        let trace = load_trace(&entry.path)?;

        Ok(EncodedSample {
            sequence: encode(&trace, &self.encoder),
            label: entry.label,
            file_name: entry.file_name(),
        })
    }

    /// Loads and encodes several samples, in the given order.
    ///
    /// # Errors
    ///
    /// Fails on the first sample that [`get`](Self::get) rejects.
    pub fn get_many(&self, indices: &[usize]) -> Result<Vec<EncodedSample>> {
        indices.iter().map(|&i| self.get(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn get_encodes_fresh_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(
            &path,
            r#"{"strokes": [[{"x": 0, "y": 0, "t": 0}, {"x": 1, "y": 0, "t": 5}]]}"#,
        )
        .unwrap();

        let ds = RuneDataset::new(vec![SampleEntry::new(&path, 3, 2)], EncoderConfig::legacy(4));
        let first = ds.get(0).unwrap();
        assert_eq!(first.label, 3);
        assert_eq!(first.file_name, "a.json");
        assert_eq!(first.sequence.row(0), Some(&[1.0, 0.0, 0.0][..]));

        fs::write(
            &path,
            r#"{"strokes": [[{"x": 0, "y": 0, "t": 0}, {"x": 0, "y": 1, "t": 5}]]}"#,
        )
        .unwrap();
        let second = ds.get(0).unwrap();
        assert_eq!(second.sequence.row(0), Some(&[0.0, 1.0, 0.0][..]));
    }

    #[test]
    fn get_out_of_range() {
        let ds = RuneDataset::new(Vec::new(), EncoderConfig::new(4));
        assert!(ds.is_empty());
        assert!(matches!(ds.get(0), Err(DatasetError::SampleNotFound(_))));
    }

    #[test]
    fn get_missing_file() {
        let ds = RuneDataset::new(
            vec![SampleEntry::new("/nonexistent/rune.json", 0, 0)],
            EncoderConfig::new(4),
        );
        assert!(matches!(ds.get(0), Err(DatasetError::Trace(_))));
    }
}
