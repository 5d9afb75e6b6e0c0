//! Training metrics and logging.

use serde::{Deserialize, Serialize};

/// Metrics for a single training epoch.
///
/// # Example
///
/// ```
/// use rune_training::EpochMetrics;
///
/// let metrics = EpochMetrics::new(0, 0.5, 0.75).with_validation(0.4, 0.8);
/// assert_eq!(metrics.epoch, 0);
/// assert!((metrics.val_accuracy - 0.8).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number (0-indexed).
    pub epoch: usize,

    /// Mean training loss over batches.
    pub train_loss: f32,

    /// Share of training samples classified correctly.
    pub train_accuracy: f32,

    /// Sample-weighted mean validation loss.
    pub val_loss: f32,

    /// Share of validation samples classified correctly.
    pub val_accuracy: f32,

    /// Learning rate at the last step of the epoch.
    pub learning_rate: f64,

    /// Training time in seconds.
    pub train_time_secs: f32,

    /// Validation time in seconds.
    pub val_time_secs: f32,

    /// Number of training samples processed.
    pub train_samples: usize,

    /// Number of validation samples processed.
    pub val_samples: usize,
}

impl EpochMetrics {
    /// Creates new epoch metrics from the training pass.
    #[must_use]
    pub const fn new(epoch: usize, train_loss: f32, train_accuracy: f32) -> Self {
        Self {
            epoch,
            train_loss,
            train_accuracy,
            val_loss: 0.0,
            val_accuracy: 0.0,
            learning_rate: 0.0,
            train_time_secs: 0.0,
            val_time_secs: 0.0,
            train_samples: 0,
            val_samples: 0,
        }
    }

    /// Sets the validation results.
    #[must_use]
    pub const fn with_validation(mut self, val_loss: f32, val_accuracy: f32) -> Self {
        self.val_loss = val_loss;
        self.val_accuracy = val_accuracy;
        self
    }

    /// Sets the learning rate.
    #[must_use]
    pub const fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the pass durations.
    #[must_use]
    pub const fn with_times(mut self, train_secs: f32, val_secs: f32) -> Self {
        self.train_time_secs = train_secs;
        self.val_time_secs = val_secs;
        self
    }

    /// Sets sample counts.
    #[must_use]
    pub const fn with_samples(mut self, train: usize, val: usize) -> Self {
        self.train_samples = train;
        self.val_samples = val;
        self
    }

    /// Returns total time (train + val) in seconds.
    #[must_use]
    pub fn total_time_secs(&self) -> f32 {
        self.train_time_secs + self.val_time_secs
    }

    /// Returns true if validation accuracy beats the previous best.
    ///
    /// Only a strictly greater accuracy counts.
    #[must_use]
    pub fn val_improved(&self, previous_best: Option<f32>) -> bool {
        previous_best.is_none_or(|best| self.val_accuracy > best)
    }

    /// Formats the one-line epoch report, `ep NN train_acc=… val_acc=… val_loss=…`.
    #[must_use]
    pub fn report_line(&self) -> String {
        format!(
            "ep {:02}  train_acc={:.3}  val_acc={:.3}  val_loss={:.3}",
            self.epoch + 1,
            self.train_accuracy,
            self.val_accuracy,
            self.val_loss
        )
    }
}

/// Aggregate metrics for a training run.
///
/// # Example
///
/// ```
/// use rune_training::{EpochMetrics, TrainingMetrics};
///
/// let mut metrics = TrainingMetrics::new();
/// metrics.add_epoch(EpochMetrics::new(0, 0.9, 0.4).with_validation(0.8, 0.5));
/// metrics.add_epoch(EpochMetrics::new(1, 0.6, 0.6).with_validation(0.7, 0.5));
///
/// assert_eq!(metrics.epochs_completed(), 2);
/// assert_eq!(metrics.best_epoch, Some(0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Metrics for each epoch.
    pub epoch_metrics: Vec<EpochMetrics>,

    /// Best validation accuracy seen.
    pub best_val_accuracy: Option<f32>,

    /// Epoch with best validation accuracy.
    pub best_epoch: Option<usize>,

    /// Total training time in seconds.
    pub total_time_secs: f32,

    /// Whether training was early stopped.
    pub early_stopped: bool,

    /// Reason for stopping (if not completed normally).
    pub stop_reason: Option<String>,
}

impl TrainingMetrics {
    /// Creates new empty training metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds metrics for an epoch.
    ///
    /// Returns true if the epoch set a new best validation accuracy.
    pub fn add_epoch(&mut self, metrics: EpochMetrics) -> bool {
        let improved = metrics.val_improved(self.best_val_accuracy);
        if improved {
            self.best_val_accuracy = Some(metrics.val_accuracy);
            self.best_epoch = Some(metrics.epoch);
        }

        self.total_time_secs += metrics.total_time_secs();
        self.epoch_metrics.push(metrics);
        improved
    }

    /// Returns the number of completed epochs.
    #[must_use]
    pub fn epochs_completed(&self) -> usize {
        self.epoch_metrics.len()
    }

    /// Returns the final training loss.
    #[must_use]
    pub fn final_loss(&self) -> f32 {
        self.epoch_metrics.last().map_or(f32::NAN, |m| m.train_loss)
    }

    /// Returns the final validation accuracy.
    #[must_use]
    pub fn final_val_accuracy(&self) -> Option<f32> {
        self.epoch_metrics.last().map(|m| m.val_accuracy)
    }

    /// Returns training losses as a vector.
    #[must_use]
    pub fn train_losses(&self) -> Vec<f32> {
        self.epoch_metrics.iter().map(|m| m.train_loss).collect()
    }

    /// Returns validation accuracies as a vector.
    #[must_use]
    pub fn val_accuracies(&self) -> Vec<f32> {
        self.epoch_metrics.iter().map(|m| m.val_accuracy).collect()
    }

    /// Returns learning rates as a vector.
    #[must_use]
    pub fn learning_rates(&self) -> Vec<f64> {
        self.epoch_metrics.iter().map(|m| m.learning_rate).collect()
    }

    /// Marks training as early stopped.
    pub fn set_early_stopped(&mut self, reason: impl Into<String>) {
        self.early_stopped = true;
        self.stop_reason = Some(reason.into());
    }

    /// Returns a human-readable summary.
    #[must_use]
    #[allow(clippy::let_underscore_must_use)] // String::write_fmt is infallible
    pub fn summary(&self) -> String {
        use std::fmt::Write;

        let mut s = String::new();
        let _ = writeln!(s, "Training Summary");
        let _ = writeln!(s, "================");
        let _ = writeln!(s, "Epochs completed: {}", self.epochs_completed());
        let _ = writeln!(s, "Total time: {:.1}s", self.total_time_secs);
        let _ = writeln!(s, "Final train loss: {:.4}", self.final_loss());

        if let Some(best) = self.best_val_accuracy {
            let _ = writeln!(
                s,
                "Best val accuracy: {:.3} (epoch {})",
                best,
                self.best_epoch.map_or(0, |e| e + 1)
            );
        }

        if self.early_stopped {
            let _ = writeln!(
                s,
                "Early stopped: {}",
                self.stop_reason.as_deref().unwrap_or("yes")
            );
        }

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn epoch(n: usize, val_accuracy: f32) -> EpochMetrics {
        EpochMetrics::new(n, 1.0 / (n as f32 + 1.0), 0.5).with_validation(0.5, val_accuracy)
    }

    #[test]
    fn epoch_metrics_builder() {
        let metrics = EpochMetrics::new(1, 0.3, 0.9)
            .with_validation(0.4, 0.85)
            .with_learning_rate(1e-3)
            .with_times(10.0, 2.0)
            .with_samples(1000, 200);

        assert_relative_eq!(metrics.learning_rate, 1e-3);
        assert_relative_eq!(metrics.total_time_secs(), 12.0);
        assert_eq!(metrics.train_samples, 1000);
        assert_eq!(metrics.val_samples, 200);
        assert_relative_eq!(metrics.val_accuracy, 0.85);
    }

    #[test]
    fn epoch_metrics_val_improved_is_strict() {
        let metrics = epoch(0, 0.5);
        assert!(metrics.val_improved(None));
        assert!(metrics.val_improved(Some(0.4)));
        assert!(!metrics.val_improved(Some(0.5)));
        assert!(!metrics.val_improved(Some(0.6)));
    }

    #[test]
    fn epoch_report_line() {
        let metrics = EpochMetrics::new(2, 0.7, 0.8126).with_validation(0.61234, 0.75);
        assert_eq!(
            metrics.report_line(),
            "ep 03  train_acc=0.813  val_acc=0.750  val_loss=0.612"
        );
    }

    #[test]
    fn training_metrics_tracks_best() {
        let mut metrics = TrainingMetrics::new();
        assert!(metrics.add_epoch(epoch(0, 0.5)));
        assert!(metrics.add_epoch(epoch(1, 0.7)));
        assert!(!metrics.add_epoch(epoch(2, 0.7)));
        assert!(!metrics.add_epoch(epoch(3, 0.6)));

        assert_eq!(metrics.epochs_completed(), 4);
        assert_eq!(metrics.best_epoch, Some(1));
        assert_eq!(metrics.best_val_accuracy, Some(0.7));
        assert_eq!(metrics.final_val_accuracy(), Some(0.6));
        assert_eq!(metrics.val_accuracies(), vec![0.5, 0.7, 0.7, 0.6]);
    }

    #[test]
    fn training_metrics_empty() {
        let metrics = TrainingMetrics::new();
        assert!(metrics.final_loss().is_nan());
        assert!(metrics.final_val_accuracy().is_none());
        assert!(metrics.train_losses().is_empty());
    }

    #[test]
    fn training_metrics_summary() {
        let mut metrics = TrainingMetrics::new();
        metrics.add_epoch(epoch(0, 0.5));
        metrics.set_early_stopped("patience exhausted");

        let summary = metrics.summary();
        assert!(summary.contains("Epochs completed: 1"));
        assert!(summary.contains("Best val accuracy: 0.500 (epoch 1)"));
        assert!(summary.contains("patience exhausted"));
    }

    #[test]
    fn training_metrics_serialization() {
        let mut metrics = TrainingMetrics::new();
        metrics.add_epoch(epoch(0, 0.5));
        let json = serde_json::to_string(&metrics).unwrap_or_default();
        let parsed: std::result::Result<TrainingMetrics, _> = serde_json::from_str(&json);
        assert_eq!(parsed.unwrap_or_default().best_epoch, Some(0));
    }
}
