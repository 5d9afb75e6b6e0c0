//! Training configuration.

use std::fs;
use std::path::Path;

use rune_models::CheckpointFormat;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainingError};

/// Configuration for a training run.
///
/// # Example
///
/// ```
/// use rune_training::TrainingConfig;
///
/// let config = TrainingConfig::default();
/// assert_eq!(config.epochs, 30);
/// assert_eq!(config.batch_size, 16);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of training epochs.
    pub epochs: usize,

    /// Training batch size.
    pub batch_size: usize,

    /// Validation batch size.
    pub val_batch_size: usize,

    /// Share of samples held out for validation, in `(0, 1)`.
    pub val_fraction: f32,

    /// Split each label separately instead of the whole dataset at once.
    pub stratified: bool,

    /// Optimizer configuration.
    pub optimizer: OptimizerConfig,

    /// Learning rate schedule, applied per optimizer step.
    pub lr_schedule: LearningRateSchedule,

    /// Whether to reshuffle the training set each epoch.
    pub shuffle: bool,

    /// Epochs without a validation accuracy gain before stopping (0 = disabled).
    pub early_stopping_patience: usize,

    /// Gradient norm clipping threshold (0.0 = disabled).
    pub gradient_clip: f32,

    /// Cross-entropy label smoothing (0.0 = disabled).
    pub label_smoothing: f32,

    /// Seed for the split, the per-epoch shuffle and weight init.
    pub seed: u64,

    /// Weight file format of the saved bundle.
    pub checkpoint_format: CheckpointFormat,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new(30)
    }
}

impl TrainingConfig {
    /// Creates a training config with the given epochs and standard settings.
    #[must_use]
    pub const fn new(epochs: usize) -> Self {
        Self {
            epochs,
            batch_size: 16,
            val_batch_size: 32,
            val_fraction: 0.2,
            stratified: false,
            optimizer: OptimizerConfig::adamw(1e-3),
            lr_schedule: LearningRateSchedule::warmup_cosine(200),
            shuffle: true,
            early_stopping_patience: 10,
            gradient_clip: 1.0,
            label_smoothing: 0.1,
            seed: 42,
            checkpoint_format: CheckpointFormat::Binary,
        }
    }

    /// Sets the training batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the validation batch size.
    #[must_use]
    pub const fn with_val_batch_size(mut self, batch_size: usize) -> Self {
        self.val_batch_size = batch_size;
        self
    }

    /// Sets the validation fraction.
    #[must_use]
    pub const fn with_val_fraction(mut self, val_fraction: f32) -> Self {
        self.val_fraction = val_fraction;
        self
    }

    /// Enables per-label splitting.
    #[must_use]
    pub const fn stratified(mut self) -> Self {
        self.stratified = true;
        self
    }

    /// Sets the optimizer.
    #[must_use]
    pub const fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Sets the learning rate schedule.
    #[must_use]
    pub const fn with_lr_schedule(mut self, schedule: LearningRateSchedule) -> Self {
        self.lr_schedule = schedule;
        self
    }

    /// Sets the early stopping patience.
    #[must_use]
    pub const fn with_patience(mut self, patience: usize) -> Self {
        self.early_stopping_patience = patience;
        self
    }

    /// Sets the gradient clipping threshold.
    #[must_use]
    pub const fn with_gradient_clip(mut self, clip: f32) -> Self {
        self.gradient_clip = clip;
        self
    }

    /// Sets the label smoothing factor.
    #[must_use]
    pub const fn with_label_smoothing(mut self, smoothing: f32) -> Self {
        self.label_smoothing = smoothing;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the checkpoint weight format.
    #[must_use]
    pub const fn with_checkpoint_format(mut self, format: CheckpointFormat) -> Self {
        self.checkpoint_format = format;
        self
    }

    /// Disables shuffling.
    #[must_use]
    pub const fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns `true` if all values are valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.epochs > 0
            && self.batch_size > 0
            && self.val_batch_size > 0
            && self.val_fraction > 0.0
            && self.val_fraction < 1.0
            && self.gradient_clip >= 0.0
            && (0.0..=1.0).contains(&self.label_smoothing)
            && self.optimizer.is_valid()
            && self.lr_schedule.is_valid()
    }

    /// Returns an error describing the first invalid setting.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfig`] if [`is_valid`](Self::is_valid)
    /// is false.
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(TrainingError::invalid_config(format!("{self:?}")))
        }
    }

    /// Reads a config from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the result
    /// is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// `AdamW` optimizer settings.
///
/// # Example
///
/// ```
/// use rune_training::OptimizerConfig;
///
/// let adamw = OptimizerConfig::adamw(1e-3);
/// assert_eq!(adamw.learning_rate, 1e-3);
/// assert_eq!(adamw.weight_decay, 1e-4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Base learning rate.
    pub learning_rate: f64,

    /// Decoupled weight decay.
    pub weight_decay: f32,

    /// First moment decay.
    pub beta1: f32,

    /// Second moment decay.
    pub beta2: f32,

    /// Epsilon for numerical stability.
    pub epsilon: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::adamw(1e-3)
    }
}

impl OptimizerConfig {
    /// Creates an `AdamW` config with standard moments and weight decay.
    #[must_use]
    pub const fn adamw(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            weight_decay: 1e-4,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }

    /// Sets weight decay.
    #[must_use]
    pub const fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Validates the configuration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.learning_rate > 0.0
            && self.weight_decay >= 0.0
            && (0.0..1.0).contains(&self.beta1)
            && (0.0..1.0).contains(&self.beta2)
            && self.epsilon > 0.0
    }
}

/// Learning rate schedule, expressed as a multiplier on the base rate.
///
/// Steps count optimizer updates across the whole run, starting at 0.
///
/// # Example
///
/// ```
/// use rune_training::LearningRateSchedule;
///
/// let schedule = LearningRateSchedule::warmup_cosine(10);
/// assert_eq!(schedule.factor(0, 100), 0.0);
/// assert_eq!(schedule.factor(5, 100), 0.5);
/// assert_eq!(schedule.factor(10, 100), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum LearningRateSchedule {
    /// Constant learning rate.
    #[default]
    Constant,

    /// Step decay: multiply by `factor` every `step_size` steps.
    Step {
        /// Decay factor.
        factor: f64,
        /// Steps between decays.
        step_size: usize,
    },

    /// Linear warmup from zero followed by cosine decay to zero.
    WarmupCosine {
        /// Warmup steps.
        warmup_steps: usize,
    },
}

impl LearningRateSchedule {
    /// Creates a step decay schedule.
    #[must_use]
    pub const fn step(factor: f64, step_size: usize) -> Self {
        Self::Step { factor, step_size }
    }

    /// Creates a warmup + cosine schedule.
    #[must_use]
    pub const fn warmup_cosine(warmup_steps: usize) -> Self {
        Self::WarmupCosine { warmup_steps }
    }

    /// Validates the schedule parameters.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Constant | Self::WarmupCosine { .. } => true,
            Self::Step { factor, step_size } => *factor > 0.0 && *step_size > 0,
        }
    }

    /// Returns the learning rate multiplier at `step` of `total_steps`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn factor(&self, step: usize, total_steps: usize) -> f64 {
        match *self {
            Self::Constant => 1.0,
            Self::Step { factor, step_size } => {
                factor.powi((step / step_size.max(1)) as i32)
            }
            Self::WarmupCosine { warmup_steps } => {
                if step < warmup_steps {
                    return step as f64 / warmup_steps as f64;
                }
                let span = total_steps.saturating_sub(warmup_steps).max(1);
                let progress = (step - warmup_steps) as f64 / span as f64;
                0.5 * (1.0 + (std::f64::consts::PI * progress).cos())
            }
        }
    }

    /// Returns the learning rate at `step` for a base rate.
    #[must_use]
    pub fn learning_rate(&self, base_lr: f64, step: usize, total_steps: usize) -> f64 {
        base_lr * self.factor(step, total_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn config_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs, 30);
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.val_batch_size, 32);
        assert_relative_eq!(config.val_fraction, 0.2);
        assert_eq!(config.early_stopping_patience, 10);
        assert_relative_eq!(config.label_smoothing, 0.1);
        assert_eq!(config.seed, 42);
        assert_eq!(config.lr_schedule, LearningRateSchedule::warmup_cosine(200));
        assert!(config.is_valid());
    }

    #[test]
    fn config_builder() {
        let config = TrainingConfig::new(5)
            .with_batch_size(4)
            .with_val_batch_size(8)
            .with_val_fraction(0.25)
            .with_patience(2)
            .with_gradient_clip(0.0)
            .with_label_smoothing(0.0)
            .with_seed(7)
            .with_lr_schedule(LearningRateSchedule::Constant)
            .with_checkpoint_format(CheckpointFormat::Json)
            .stratified()
            .without_shuffle();

        assert_eq!(config.epochs, 5);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.val_batch_size, 8);
        assert_eq!(config.early_stopping_patience, 2);
        assert_eq!(config.seed, 7);
        assert_eq!(config.checkpoint_format, CheckpointFormat::Json);
        assert!(config.stratified);
        assert!(!config.shuffle);
        assert!(config.is_valid());
    }

    #[test]
    fn config_validation() {
        assert!(!TrainingConfig::new(0).is_valid());
        assert!(!TrainingConfig::new(1).with_batch_size(0).is_valid());
        assert!(!TrainingConfig::new(1).with_val_fraction(1.0).is_valid());
        assert!(!TrainingConfig::new(1).with_val_fraction(0.0).is_valid());
        assert!(!TrainingConfig::new(1).with_label_smoothing(1.5).is_valid());
        assert!(!TrainingConfig::new(1).with_gradient_clip(-1.0).is_valid());
        assert!(
            !TrainingConfig::new(1)
                .with_optimizer(OptimizerConfig::adamw(0.0))
                .is_valid()
        );
        assert!(TrainingConfig::new(0).validate().is_err());
    }

    #[test]
    fn config_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        let config = TrainingConfig::new(12).with_seed(3);
        config.save(&path).unwrap();
        assert_eq!(TrainingConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn config_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        std::fs::write(&path, r#"{"epochs": 3, "batch_size": 8}"#).unwrap();

        let config = TrainingConfig::load(&path).unwrap();
        assert_eq!(config.epochs, 3);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.val_batch_size, 32);
    }

    #[test]
    fn config_load_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        std::fs::write(&path, r#"{"epochs": 0}"#).unwrap();
        assert!(matches!(
            TrainingConfig::load(&path),
            Err(TrainingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn optimizer_validation() {
        assert!(OptimizerConfig::default().is_valid());
        assert!(!OptimizerConfig::adamw(1e-3).with_weight_decay(-1.0).is_valid());
    }

    #[test]
    fn lr_constant() {
        let schedule = LearningRateSchedule::Constant;
        assert_relative_eq!(schedule.learning_rate(1e-3, 0, 100), 1e-3);
        assert_relative_eq!(schedule.learning_rate(1e-3, 99, 100), 1e-3);
    }

    #[test]
    fn lr_step() {
        let schedule = LearningRateSchedule::step(0.5, 10);
        assert_relative_eq!(schedule.factor(9, 100), 1.0);
        assert_relative_eq!(schedule.factor(10, 100), 0.5);
        assert_relative_eq!(schedule.factor(25, 100), 0.25);
        assert!(!LearningRateSchedule::step(0.5, 0).is_valid());
    }

    #[test]
    fn lr_warmup_cosine() {
        let schedule = LearningRateSchedule::warmup_cosine(200);
        assert_relative_eq!(schedule.factor(0, 1000), 0.0);
        assert_relative_eq!(schedule.factor(100, 1000), 0.5);
        assert_relative_eq!(schedule.factor(200, 1000), 1.0);
        // Halfway through the decay phase.
        assert_relative_eq!(schedule.factor(600, 1000), 0.5, epsilon = 1e-12);
        assert!(schedule.factor(999, 1000) < 1e-4);
    }

    #[test]
    fn lr_warmup_longer_than_run() {
        let schedule = LearningRateSchedule::warmup_cosine(200);
        assert_relative_eq!(schedule.factor(50, 60), 0.25);
    }

    #[test]
    fn lr_schedule_serialization() {
        let schedule = LearningRateSchedule::warmup_cosine(50);
        let json = serde_json::to_string(&schedule).unwrap_or_default();
        let parsed: std::result::Result<LearningRateSchedule, _> = serde_json::from_str(&json);
        assert_eq!(parsed.unwrap_or_default(), schedule);
    }
}
