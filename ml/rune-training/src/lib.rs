//! Supervised training for the rune stroke classifier.
//!
//! # Training Components
//!
//! - [`TrainingConfig`] - Configuration for training runs
//! - [`Trainer`] - Split, mini-batch loop, validation and checkpointing
//! - [`TrainingMetrics`] - Metrics collected during training
//!
//! # Loss Functions
//!
//! - [`classification_loss`] - Cross-entropy with optional label smoothing
//! - [`accuracy`] - Arg-max accuracy
//!
//! Early stopping is keyed on validation accuracy: an epoch counts as an
//! improvement only if its accuracy is strictly greater than the best so far,
//! and each improvement rewrites the checkpoint bundle.
//!
//! # Example
//!
//! ```ignore
//! use burn::backend::Autodiff;
//! use burn_ndarray::NdArray;
//! use rune_training::{Trainer, TrainingConfig};
//!
//! let trainer = Trainer::new(TrainingConfig::default());
//! let outcome = trainer.fit::<Autodiff<NdArray>>(&index, encoder, model, artifacts, &device)?;
//! println!("{}", outcome.metrics.summary());
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod error;
mod loss;
mod metrics;
mod trainer;

// Re-export configuration
pub use config::{LearningRateSchedule, OptimizerConfig, TrainingConfig};

// Re-export loss functions
pub use loss::{accuracy, classification_loss, correct_predictions};

// Re-export metrics
pub use metrics::{EpochMetrics, TrainingMetrics};

// Re-export trainer
pub use trainer::{Trainer, TrainingOutcome, TrainingState};

// Re-export error types
pub use error::{Result, TrainingError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        EpochMetrics, LearningRateSchedule, OptimizerConfig, Trainer, TrainingConfig,
        TrainingError, TrainingMetrics, TrainingOutcome, TrainingState, accuracy,
        classification_loss,
    };
}
