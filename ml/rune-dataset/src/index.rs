//! Directory-per-label dataset indexing.
//!
//! A dataset root holds one subdirectory per label; each label directory
//! holds one `.json` trace per sample:
//!
//! ```text
//! dataset/
//! ├── Fire/
//! │   ├── fire_001.json
//! │   └── fire_002.json
//! ├── Unknown/
//! │   └── noise_42_0000.json
//! └── README.md          (ignored)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use rune_types::{LabelSet, load_trace};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DatasetError, Result};

/// What to do with a `.json` file that is not a valid trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CorruptSamplePolicy {
    /// Log a warning and leave the file out of the index.
    #[default]
    Skip,

    /// Fail the scan with the load error.
    Abort,
}

impl CorruptSamplePolicy {
    /// Returns the policy name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Abort => "abort",
        }
    }
}

impl std::fmt::Display for CorruptSamplePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One indexed sample: a trace file and its label index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleEntry {
    /// Path to the trace file.
    pub path: PathBuf,

    /// Dense label index.
    pub label: usize,

    /// Raw point count of the trace at scan time.
    pub points: usize,
}

impl SampleEntry {
    /// Creates a new sample entry.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, label: usize, points: usize) -> Self {
        Self {
            path: path.into(),
            label,
            points,
        }
    }

    /// Returns the file name of the trace, or an empty string.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// An index of every usable trace under a dataset root.
///
/// Labels are the names of the root's immediate subdirectories, sorted
/// lexicographically before indices are assigned. Samples are grouped by
/// label and sorted by path, so scanning an unchanged tree twice yields
/// the same index.
///
/// # Example
///
/// ```no_run
/// use rune_dataset::{CorruptSamplePolicy, DatasetIndex};
///
/// let index = DatasetIndex::scan("dataset", CorruptSamplePolicy::Skip)?;
/// for (name, count) in index.label_counts() {
///     println!("{name}: {count}");
/// }
/// # Ok::<(), rune_dataset::DatasetError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetIndex {
    root: PathBuf,
    labels: LabelSet,
    samples: Vec<SampleEntry>,
    #[serde(default)]
    skipped: Vec<PathBuf>,
}

impl DatasetIndex {
    /// Scans a dataset root.
    ///
    /// # Errors
    ///
    /// - [`DatasetError::Io`] if the root or a label directory is unreadable
    /// - [`DatasetError::EmptyDataset`] if there are no label directories or
    ///   no samples at all
    /// - [`DatasetError::Trace`] for a corrupt sample under
    ///   [`CorruptSamplePolicy::Abort`]
    pub fn scan(root: impl AsRef<Path>, policy: CorruptSamplePolicy) -> Result<Self> {
        let root = root.as_ref();
        let names = label_dirs(root)?;
        if names.is_empty() {
            return Err(DatasetError::empty_dataset(format!(
                "no label directories in {}",
                root.display()
            )));
        }
        let labels = LabelSet::from_names(names)?;

        let mut samples = Vec::new();
        let mut skipped = Vec::new();

        for (label, name) in labels.iter() {
            let dir = root.join(name);
            let files = json_files(&dir)?;
            let before = samples.len();

            for path in files {
                match load_trace(&path) {
                    Ok(trace) => {
                        samples.push(SampleEntry::new(path, label, trace.point_count()));
                    }
                    Err(err) => match policy {
                        CorruptSamplePolicy::Skip => {
                            warn!(path = %path.display(), error = %err, "Skipping corrupt sample");
                            skipped.push(path);
                        }
                        CorruptSamplePolicy::Abort => return Err(err.into()),
                    },
                }
            }

            let count = samples.len() - before;
            if count == 0 {
                warn!(label = name, index = label, "Label has no samples");
            } else {
                debug!(label = name, index = label, samples = count, "Indexed label");
            }
        }

        if samples.is_empty() {
            return Err(DatasetError::empty_dataset(format!(
                "no trace files under {}",
                root.display()
            )));
        }

        info!(
            root = %root.display(),
            labels = labels.len(),
            samples = samples.len(),
            skipped = skipped.len(),
            "Indexed dataset"
        );

        Ok(Self {
            root: root.to_path_buf(),
            labels,
            samples,
            skipped,
        })
    }

    /// Builds an index from parts, checking that every label is in range.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Validation`] for an out-of-range label and
    /// [`DatasetError::EmptyDataset`] for an empty sample list.
    pub fn from_parts(
        root: impl Into<PathBuf>,
        labels: LabelSet,
        samples: Vec<SampleEntry>,
    ) -> Result<Self> {
        if samples.is_empty() {
            return Err(DatasetError::empty_dataset("no samples"));
        }
        if let Some(bad) = samples.iter().find(|s| s.label >= labels.len()) {
            return Err(DatasetError::validation(format!(
                "label {} out of range for {} labels ({})",
                bad.label,
                labels.len(),
                bad.path.display()
            )));
        }
        Ok(Self {
            root: root.into(),
            labels,
            samples,
            skipped: Vec::new(),
        })
    }

    /// Returns the dataset root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the label set.
    #[must_use]
    pub const fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Returns all samples, grouped by label.
    #[must_use]
    pub fn samples(&self) -> &[SampleEntry] {
        &self.samples
    }

    /// Returns files that were left out as corrupt.
    #[must_use]
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns `(label, sample count)` in index order, including empty labels.
    #[must_use]
    pub fn label_counts(&self) -> Vec<(String, usize)> {
        let mut counts = vec![0usize; self.labels.len()];
        for s in &self.samples {
            counts[s.label] += 1;
        }
        self.labels
            .names()
            .iter()
            .cloned()
            .zip(counts)
            .collect()
    }

    /// Returns the raw point count of every sample, in sample order.
    #[must_use]
    pub fn point_counts(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.points).collect()
    }

    /// Serializes the index to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

/// Lists the UTF-8 names of the immediate subdirectories of `root`.
fn label_dirs(root: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(root).map_err(|e| DatasetError::io(format!("{}: {e}", root.display())))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!(name = ?raw, "Ignoring non-UTF-8 label directory"),
        }
    }
    names.sort_unstable();
    Ok(names)
}

/// Lists `*.json` regular files in a label directory, sorted.
fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).map_err(|e| DatasetError::io(format!("{}: {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TRACE: &str = r#"{"strokes": [[{"x": 0, "y": 0, "t": 0}, {"x": 1, "y": 2, "t": 10}]]}"#;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn policy_default_and_names() {
        assert_eq!(CorruptSamplePolicy::default(), CorruptSamplePolicy::Skip);
        assert_eq!(CorruptSamplePolicy::Abort.to_string(), "abort");
    }

    #[test]
    fn sample_entry_file_name() {
        let entry = SampleEntry::new("data/Fire/a.json", 0, 2);
        assert_eq!(entry.file_name(), "a.json");
    }

    #[test]
    fn scan_assigns_sorted_indices() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("b/1.json"), TRACE);
        write(&dir.path().join("a/1.json"), TRACE);
        write(&dir.path().join("C/1.json"), TRACE);

        let index = DatasetIndex::scan(dir.path(), CorruptSamplePolicy::Skip).unwrap();
        assert_eq!(index.labels().names(), &["C", "a", "b"]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.samples()[0].label, 0);
        assert_eq!(index.samples()[2].label, 2);
        assert_eq!(index.point_counts(), vec![2, 2, 2]);
    }

    #[test]
    fn from_parts_validates_labels() {
        let labels = LabelSet::from_names(["a", "b"]).unwrap();
        let ok = DatasetIndex::from_parts("r", labels.clone(), vec![SampleEntry::new("x", 1, 3)]);
        assert!(ok.is_ok());

        let bad = DatasetIndex::from_parts("r", labels.clone(), vec![SampleEntry::new("x", 2, 3)]);
        assert!(matches!(bad, Err(DatasetError::Validation(_))));

        let empty = DatasetIndex::from_parts("r", labels, Vec::new());
        assert!(matches!(empty, Err(DatasetError::EmptyDataset(_))));
    }

    #[test]
    fn missing_root_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DatasetIndex::scan(dir.path().join("nope"), CorruptSamplePolicy::Skip);
        assert!(matches!(err, Err(DatasetError::Io(_))));
    }

    #[test]
    fn index_serialization() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a/1.json"), TRACE);
        let index = DatasetIndex::scan(dir.path(), CorruptSamplePolicy::Skip).unwrap();

        let json = index.to_json().unwrap();
        let parsed: DatasetIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, index);
    }
}
