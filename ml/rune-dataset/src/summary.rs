//! Dataset summary and statistics.

use rune_features::estimate_max_points;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::DatasetIndex;

/// Summary statistics for an indexed dataset.
///
/// Provides per-label sample counts and trace length statistics, useful for
/// choosing `max_points` and spotting unbalanced classes.
///
/// # Example
///
/// ```
/// use rune_dataset::{DatasetIndex, DatasetSummary, SampleEntry};
/// use rune_types::LabelSet;
///
/// let labels = LabelSet::from_names(["Fire", "Ice"]).unwrap();
/// let index = DatasetIndex::from_parts(
///     "data",
///     labels,
///     vec![
///         SampleEntry::new("data/Fire/a.json", 0, 40),
///         SampleEntry::new("data/Fire/b.json", 0, 60),
///         SampleEntry::new("data/Ice/a.json", 1, 50),
///     ],
/// )
/// .unwrap();
///
/// let summary = DatasetSummary::from_index(&index);
/// assert_eq!(summary.total_samples, 3);
/// assert_eq!(summary.min_points, 40);
/// assert_eq!(summary.max_points, 60);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DatasetSummary {
    /// Total number of samples.
    pub total_samples: usize,

    /// Samples per label, in label index order.
    pub label_counts: Vec<(String, usize)>,

    /// Files left out of the index as corrupt.
    pub skipped_samples: usize,

    /// Shortest trace, in raw points.
    pub min_points: usize,

    /// Longest trace, in raw points.
    pub max_points: usize,

    /// Mean trace length, in raw points.
    pub mean_points: f32,

    /// Raw point count of every sample.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub point_counts: Vec<usize>,
}

impl DatasetSummary {
    /// Creates a summary of an index.
    #[must_use]
    pub fn from_index(index: &DatasetIndex) -> Self {
        let point_counts = index.point_counts();
        let total_samples = point_counts.len();

        #[allow(clippy::cast_precision_loss)]
        let mean_points = if total_samples > 0 {
            point_counts.iter().sum::<usize>() as f32 / total_samples as f32
        } else {
            0.0
        };

        Self {
            total_samples,
            label_counts: index.label_counts(),
            skipped_samples: index.skipped().len(),
            min_points: point_counts.iter().copied().min().unwrap_or(0),
            max_points: point_counts.iter().copied().max().unwrap_or(0),
            mean_points,
            point_counts,
        }
    }

    /// Returns true if the dataset is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_samples == 0
    }

    /// Returns the number of labels, including empty ones.
    #[must_use]
    pub fn num_labels(&self) -> usize {
        self.label_counts.len()
    }

    /// Returns labels that have no samples.
    #[must_use]
    pub fn empty_labels(&self) -> Vec<&str> {
        self.label_counts
            .iter()
            .filter(|(_, n)| *n == 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Suggests a sequence length covering `percentile` percent of traces.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Feature`](crate::DatasetError::Feature) if
    /// there are no samples or the percentile is out of range.
    pub fn suggested_max_points(&self, percentile: f64) -> Result<usize> {
        Ok(estimate_max_points(&self.point_counts, percentile)?)
    }

    /// Checks if the dataset is balanced (within tolerance).
    ///
    /// Balanced means every label's share of the samples is within
    /// `tolerance` of an even `1 / num_labels` share.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_balanced(&self, tolerance: f32) -> bool {
        if self.total_samples == 0 || self.label_counts.is_empty() {
            return true;
        }
        let even = 1.0 / self.label_counts.len() as f32;
        self.label_counts
            .iter()
            .all(|(_, n)| (*n as f32 / self.total_samples as f32 - even).abs() <= tolerance)
    }

    /// Returns a human-readable summary string.
    #[must_use]
    #[allow(clippy::let_underscore_must_use)] // String::write_fmt is infallible
    pub fn to_report(&self) -> String {
        use std::fmt::Write;

        let mut report = String::new();
        let _ = writeln!(report, "Dataset Summary");
        let _ = writeln!(report, "===============");
        let _ = writeln!(report, "Total samples: {}", self.total_samples);
        let _ = writeln!(report, "Labels: {}", self.num_labels());
        if self.skipped_samples > 0 {
            let _ = writeln!(report, "Skipped (corrupt): {}", self.skipped_samples);
        }
        let _ = writeln!(
            report,
            "Points per trace: min {} / mean {:.1} / max {}",
            self.min_points, self.mean_points, self.max_points
        );

        let _ = writeln!(report, "\nLabel Distribution:");
        for (i, (name, count)) in self.label_counts.iter().enumerate() {
            let _ = writeln!(report, "  {i:>3} {name}: {count}");
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SampleEntry;
    use rune_types::LabelSet;

    fn index(points: &[(usize, usize)], labels: &[&str]) -> DatasetIndex {
        let labels = LabelSet::from_names(labels.iter().copied()).unwrap();
        let samples = points
            .iter()
            .enumerate()
            .map(|(i, &(label, n))| SampleEntry::new(format!("{i}.json"), label, n))
            .collect();
        DatasetIndex::from_parts("root", labels, samples).unwrap()
    }

    #[test]
    fn summary_counts() {
        let summary = DatasetSummary::from_index(&index(&[(0, 10), (0, 20), (2, 30)], &["a", "b", "c"]));

        assert_eq!(summary.total_samples, 3);
        assert_eq!(summary.num_labels(), 3);
        assert_eq!(
            summary.label_counts,
            vec![("a".to_string(), 2), ("b".to_string(), 0), ("c".to_string(), 1)]
        );
        assert_eq!(summary.empty_labels(), vec!["b"]);
        assert!((summary.mean_points - 20.0).abs() < 1e-6);
    }

    #[test]
    fn suggested_max_points_uses_percentile() {
        let summary = DatasetSummary::from_index(&index(
            &[(0, 40), (0, 55), (1, 60), (1, 61), (1, 300)],
            &["a", "b"],
        ));
        assert_eq!(summary.suggested_max_points(50.0).unwrap(), 60);
        assert_eq!(summary.suggested_max_points(100.0).unwrap(), 300);
        assert!(summary.suggested_max_points(120.0).is_err());
    }

    #[test]
    fn summary_is_balanced() {
        let even = DatasetSummary::from_index(&index(&[(0, 5), (1, 5)], &["a", "b"]));
        assert!(even.is_balanced(0.0));

        let skewed =
            DatasetSummary::from_index(&index(&[(0, 5), (0, 5), (0, 5), (1, 5)], &["a", "b"]));
        assert!(!skewed.is_balanced(0.1));
        assert!(skewed.is_balanced(0.25));
    }

    #[test]
    fn summary_to_report() {
        let summary = DatasetSummary::from_index(&index(&[(0, 12), (1, 8)], &["Fire", "Ice"]));
        let report = summary.to_report();

        assert!(report.contains("Total samples: 2"));
        assert!(report.contains("Fire: 1"));
        assert!(report.contains("min 8"));
    }

    #[test]
    fn summary_serialization() {
        let summary = DatasetSummary::from_index(&index(&[(0, 12), (1, 8)], &["a", "b"]));
        let json = serde_json::to_string(&summary).unwrap_or_default();
        let parsed: std::result::Result<DatasetSummary, _> = serde_json::from_str(&json);
        assert_eq!(parsed.unwrap_or_default(), summary);
    }

    #[test]
    fn summary_default() {
        let summary = DatasetSummary::default();
        assert!(summary.is_empty());
        assert!(summary.suggested_max_points(99.0).is_err());
    }
}
