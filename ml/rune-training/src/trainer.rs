//! Training loop implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use burn::grad_clipping::GradientClippingConfig;
use burn::module::AutodiffModule;
use burn::optim::{AdamWConfig, GradientsParams, Optimizer};
use burn::tensor::ElementConversion;
use burn::tensor::backend::AutodiffBackend;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rune_dataset::{
    DatasetIndex, RuneBatcher, RuneDataset, SampleEntry, split_stratified, split_train_val,
};
use rune_models::{
    BUNDLE_STEM, CheckpointMeta, ModelError, StrokeTransformer, StrokeTransformerConfig, save_bundle,
};
use rune_types::EncoderConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TrainingConfig;
use crate::error::{Result, TrainingError};
use crate::loss::{classification_loss, correct_predictions};
use crate::metrics::{EpochMetrics, TrainingMetrics};

/// State of a training run.
///
/// # Example
///
/// ```
/// use rune_training::TrainingState;
///
/// let state = TrainingState::new();
/// assert_eq!(state.epoch, 0);
/// assert!(!state.is_finished());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    /// Current epoch (0-indexed).
    pub epoch: usize,

    /// Total epochs to run.
    pub total_epochs: usize,

    /// Optimizer steps taken so far.
    pub step: usize,

    /// Best validation accuracy seen.
    pub best_val_accuracy: Option<f32>,

    /// Epochs without improvement (for early stopping).
    pub epochs_without_improvement: usize,

    /// Whether training has finished.
    pub finished: bool,

    /// Accumulated metrics.
    pub metrics: TrainingMetrics,
}

impl Default for TrainingState {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingState {
    /// Creates a new training state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: 0,
            total_epochs: 0,
            step: 0,
            best_val_accuracy: None,
            epochs_without_improvement: 0,
            finished: false,
            metrics: TrainingMetrics::new(),
        }
    }

    /// Creates a training state for the given config.
    #[must_use]
    pub fn from_config(config: &TrainingConfig) -> Self {
        Self {
            total_epochs: config.epochs,
            ..Self::new()
        }
    }

    /// Returns true if training is finished.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the progress as a fraction [0, 1].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f32 {
        if self.total_epochs == 0 {
            0.0
        } else {
            self.epoch as f32 / self.total_epochs as f32
        }
    }

    /// Advances to the next epoch.
    pub const fn next_epoch(&mut self) {
        self.epoch += 1;
        if self.epoch >= self.total_epochs {
            self.finished = true;
        }
    }

    /// Records an epoch and checks validation accuracy for improvement.
    ///
    /// Returns true if this is a new best. Equal accuracy is not an
    /// improvement.
    pub fn record_epoch(&mut self, metrics: EpochMetrics) -> bool {
        let improved = self.metrics.add_epoch(metrics);
        self.best_val_accuracy = self.metrics.best_val_accuracy;

        if improved {
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;
        }
        improved
    }

    /// Checks if early stopping should trigger.
    #[must_use]
    pub const fn should_early_stop(&self, patience: usize) -> bool {
        patience > 0 && self.epochs_without_improvement >= patience
    }

    /// Marks training as early stopped.
    pub fn early_stop(&mut self, reason: impl Into<String>) {
        self.finished = true;
        self.metrics.set_early_stopped(reason);
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Per-epoch metrics and best-epoch tracking.
    pub metrics: TrainingMetrics,

    /// Metadata of the saved best checkpoint.
    pub best: CheckpointMeta,

    /// Directory holding the checkpoint bundle.
    pub bundle_dir: PathBuf,

    /// Number of training samples.
    pub train_samples: usize,

    /// Number of validation samples.
    pub val_samples: usize,
}

/// Trainer for the stroke classifier.
///
/// # Example
///
/// ```
/// use rune_training::{Trainer, TrainingConfig};
///
/// let config = TrainingConfig::new(10);
/// let trainer = Trainer::new(config);
///
/// assert_eq!(trainer.config().epochs, 10);
/// assert_eq!(trainer.num_batches(33), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

impl Trainer {
    /// Creates a new trainer with the given config.
    #[must_use]
    pub const fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Returns the training configuration.
    #[must_use]
    pub const fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Creates initial training state.
    #[must_use]
    pub fn initial_state(&self) -> TrainingState {
        TrainingState::from_config(&self.config)
    }

    /// Computes the learning rate for an optimizer step.
    #[must_use]
    pub fn learning_rate(&self, step: usize, total_steps: usize) -> f64 {
        self.config
            .lr_schedule
            .learning_rate(self.config.optimizer.learning_rate, step, total_steps)
    }

    /// Computes the number of training batches for a dataset size.
    #[must_use]
    pub const fn num_batches(&self, dataset_size: usize) -> usize {
        if self.config.batch_size == 0 {
            0
        } else {
            dataset_size.div_ceil(self.config.batch_size)
        }
    }

    /// Splits the indexed samples into `(train, val)` with the configured seed.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InsufficientData`] if either side is empty.
    pub fn split(&self, index: &DatasetIndex) -> Result<(Vec<SampleEntry>, Vec<SampleEntry>)> {
        let (train, val) = if self.config.stratified {
            split_stratified(index.samples(), self.config.val_fraction, self.config.seed)?
        } else {
            split_train_val(index.samples(), self.config.val_fraction, self.config.seed)?
        };

        if train.is_empty() {
            return Err(TrainingError::insufficient_data("training split is empty"));
        }
        if val.is_empty() {
            return Err(TrainingError::insufficient_data(format!(
                "validation split is empty ({} samples, val_fraction {})",
                index.len(),
                self.config.val_fraction
            )));
        }
        Ok((train, val))
    }

    /// Trains a fresh model on `index` and saves the best epoch to `artifacts`.
    ///
    /// The bundle is rewritten every time validation accuracy strictly
    /// improves, so `artifacts` always holds the best model seen so far
    /// along with its labels and encoder.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the model does not
    /// fit the encoder or labels, a split is empty, a sample cannot be
    /// loaded, the loss stops being finite, or the bundle cannot be written.
    #[allow(clippy::cast_precision_loss, clippy::too_many_lines)]
    pub fn fit<B: AutodiffBackend>(
        &self,
        index: &DatasetIndex,
        encoder: EncoderConfig,
        model_config: StrokeTransformerConfig,
        artifacts: &Path,
        device: &B::Device,
    ) -> Result<TrainingOutcome> {
        let config = &self.config;
        config.validate()?;
        encoder.validate().map_err(ModelError::from)?;

        let meta = CheckpointMeta::new(index.labels().clone(), encoder, model_config)
            .with_format(config.checkpoint_format);
        meta.validate()?;

        let (train, val) = self.split(index)?;
        let train_set = RuneDataset::new(train, encoder);
        let val_set = RuneDataset::new(val, encoder);
        let (n_train, n_val) = (train_set.len(), val_set.len());

        B::seed(config.seed);
        let mut model = StrokeTransformer::<B>::new(&model_config, device);
        let clipping =
            (config.gradient_clip > 0.0).then_some(GradientClippingConfig::Norm(config.gradient_clip));
        let mut optim = AdamWConfig::new()
            .with_beta_1(config.optimizer.beta1)
            .with_beta_2(config.optimizer.beta2)
            .with_epsilon(config.optimizer.epsilon)
            .with_weight_decay(config.optimizer.weight_decay)
            .with_grad_clipping(clipping)
            .init::<B, StrokeTransformer<B>>();

        let train_batcher = RuneBatcher::<B>::new(device.clone());
        let val_batcher = RuneBatcher::<B::InnerBackend>::new(device.clone());
        let total_steps = config.epochs * self.num_batches(n_train);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut order: Vec<usize> = (0..n_train).collect();
        let mut state = self.initial_state();
        let mut best = meta.clone();

        info!(
            train = n_train,
            val = n_val,
            labels = meta.labels.len(),
            epochs = config.epochs,
            total_steps,
            "Starting training"
        );

        while !state.is_finished() {
            let epoch = state.epoch;

            // Train
            let started = Instant::now();
            if config.shuffle {
                order.shuffle(&mut rng);
            }
            let mut loss_sum = 0.0_f32;
            let mut batches = 0_usize;
            let mut correct = 0_usize;
            let mut lr = 0.0;
            for chunk in order.chunks(config.batch_size) {
                let batch = train_batcher.load(&train_set, chunk)?;
                lr = self.learning_rate(state.step, total_steps);

                let logits = model.forward(batch.traces);
                let loss =
                    classification_loss(logits.clone(), batch.targets.clone(), config.label_smoothing);
                let loss_value: f32 = loss.clone().into_scalar().elem();
                if !loss_value.is_finite() {
                    return Err(TrainingError::numerical_instability(format!(
                        "training loss is {loss_value} at step {}",
                        state.step
                    )));
                }
                correct += correct_predictions(logits, batch.targets);

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(lr, model, grads);

                loss_sum += loss_value;
                batches += 1;
                state.step += 1;
            }
            let train_secs = started.elapsed().as_secs_f32();

            // Validate
            let started = Instant::now();
            let valid_model = model.valid();
            let val_order: Vec<usize> = (0..n_val).collect();
            let mut val_loss_sum = 0.0_f32;
            let mut val_correct = 0_usize;
            for chunk in val_order.chunks(config.val_batch_size) {
                let batch = val_batcher.load(&val_set, chunk)?;
                let logits = valid_model.forward(batch.traces);
                let loss = classification_loss(
                    logits.clone(),
                    batch.targets.clone(),
                    config.label_smoothing,
                );
                let loss_value: f32 = loss.into_scalar().elem();
                val_loss_sum += loss_value * chunk.len() as f32;
                val_correct += correct_predictions(logits, batch.targets);
            }
            let val_secs = started.elapsed().as_secs_f32();

            let metrics = EpochMetrics::new(
                epoch,
                loss_sum / batches.max(1) as f32,
                correct as f32 / n_train as f32,
            )
            .with_validation(val_loss_sum / n_val as f32, val_correct as f32 / n_val as f32)
            .with_learning_rate(lr)
            .with_times(train_secs, val_secs)
            .with_samples(n_train, n_val);

            info!(
                epoch = epoch + 1,
                train_loss = metrics.train_loss,
                lr,
                "{}",
                metrics.report_line()
            );

            let val_accuracy = metrics.val_accuracy;
            if state.record_epoch(metrics) {
                best = meta.clone().with_progress(epoch + 1, val_accuracy);
                save_bundle(&valid_model, &best, artifacts)?;
            } else {
                debug!(
                    epoch = epoch + 1,
                    stale = state.epochs_without_improvement,
                    "Validation accuracy did not improve"
                );
            }

            state.next_epoch();
            if state.should_early_stop(config.early_stopping_patience) {
                info!(epoch = epoch + 1, "Early stopping.");
                state.early_stop(format!(
                    "no validation accuracy gain for {} epochs",
                    config.early_stopping_patience
                ));
            }
        }

        let metrics_path = artifacts.join(format!("{BUNDLE_STEM}.metrics.json"));
        if let Err(e) = fs::write(&metrics_path, serde_json::to_string_pretty(&state.metrics)?) {
            warn!(path = %metrics_path.display(), error = %e, "Failed to write training metrics");
        }

        info!(
            best_epoch = best.epoch,
            best_val_accuracy = best.val_accuracy,
            epochs = state.metrics.epochs_completed(),
            "Training finished"
        );

        Ok(TrainingOutcome {
            metrics: state.metrics,
            best,
            bundle_dir: artifacts.to_path_buf(),
            train_samples: n_train,
            val_samples: n_val,
        })
    }
}
