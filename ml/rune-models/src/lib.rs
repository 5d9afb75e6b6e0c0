//! Burn model, checkpoint persistence and inference for rune recognition.
//!
//! # Model Architecture
//!
//! - [`StrokeTransformer`] - Transformer encoder over encoded stroke sequences
//!
//! # Checkpoint Persistence
//!
//! A checkpoint bundle pairs Burn weights with a [`CheckpointMeta`] sidecar
//! recording labels, encoder and model configuration:
//! - Binary format (compact, fast)
//! - JSON format (human-readable, debuggable)
//!
//! # Inference
//!
//! - [`export_inference`] - Weights plus an [`InferenceManifest`]
//! - [`RunePredictor`] - Classifies raw traces with the persisted encoder
//!
//! # Backend Support
//!
//! Models are generic over Burn backends. Training and tests use
//! `burn-ndarray`, wrapped in `Autodiff` for training.
//!
//! # Example
//!
//! ```ignore
//! use rune_models::RunePredictor;
//!
//! let predictor = RunePredictor::<MyBackend>::from_bundle(Path::new("artifacts"), device)?;
//! let prediction = predictor.predict_file(Path::new("capture.json"))?;
//! println!("{} ({:.2})", prediction.label, prediction.confidence);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod checkpoint;
mod classifier;
mod error;
mod export;
mod predict;

// Re-export model types
pub use classifier::{StrokeTransformer, StrokeTransformerConfig};

// Re-export checkpoint utilities
pub use checkpoint::{
    BUNDLE_STEM, CheckpointFormat, CheckpointMeta, load_bundle, load_checkpoint, save_bundle,
    save_checkpoint,
};

// Re-export inference utilities
pub use export::{INPUT_NAME, InferenceManifest, OUTPUT_NAME, export_inference};
pub use predict::{Prediction, RunePredictor};

// Re-export error types
pub use error::{ModelError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        CheckpointFormat, CheckpointMeta, InferenceManifest, ModelError, Prediction,
        RunePredictor, StrokeTransformer, StrokeTransformerConfig, export_inference, load_bundle,
        save_bundle,
    };
}
