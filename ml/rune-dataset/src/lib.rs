//! Dataset lifecycle management for rune recognition.
//!
//! This crate turns a directory tree of trace captures into training
//! batches:
//!
//! # Indexing
//!
//! - [`DatasetIndex`] - Labels from subdirectory names, samples from `*.json`
//! - [`CorruptSamplePolicy`] - Skip or abort on unreadable traces
//! - [`DatasetSummary`] - Per-label counts and trace length statistics
//!
//! # Training Data
//!
//! - [`split_train_val`] - Seeded train/validation split
//! - [`RuneDataset`] - Loads and encodes a sample on every access
//! - [`RuneBatcher`] - Stacks encoded samples into Burn tensors
//!
//! # Synthetic Data
//!
//! - [`noise::write_noise_samples`] - Random-walk traces for the "Unknown" class
//!
//! # Example
//!
//! ```
//! use rune_dataset::split_train_val;
//!
//! let items: Vec<usize> = (0..20).collect();
//! let (train, val) = split_train_val(&items, 0.2, 42).unwrap();
//!
//! assert_eq!(train.len(), 16);
//! assert_eq!(val.len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod batcher;
mod dataset;
mod error;
mod index;
pub mod noise;
mod splits;
mod summary;

// Re-export indexing types
pub use index::{CorruptSamplePolicy, DatasetIndex, SampleEntry};
pub use summary::DatasetSummary;

// Re-export training data types
pub use batcher::{RuneBatch, RuneBatcher};
pub use dataset::{EncodedSample, RuneDataset};
pub use splits::{SplitRatio, split_stratified, split_train_val};

// Re-export error types
pub use error::{DatasetError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        CorruptSamplePolicy, DatasetError, DatasetIndex, DatasetSummary, EncodedSample,
        RuneBatch, RuneBatcher, RuneDataset, SampleEntry, SplitRatio, split_stratified,
        split_train_val,
    };
}
