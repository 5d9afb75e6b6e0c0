//! Trace-to-tensor feature encoding for rune recognition.
//!
//! Turns a variable-length [`RawTrace`](rune_types::RawTrace) into a
//! fixed-length [`EncodedSequence`] suitable for a sequence model. The
//! numeric behavior is stable across releases: models trained against one
//! version of this crate keep working with the next.
//!
//! # Pipeline
//!
//! - [`encode`] - Normalize, delta-encode, denoise, standardize, resample
//! - [`delta_rows`] - The raw delta rows, before any row is dropped
//! - [`resample_indices`] - Nearest-neighbour index selection
//! - [`encode_batch`] - Parallel encoding with `rayon`
//!
//! # Sizing
//!
//! - [`estimate_max_points`] - Percentile of observed trace lengths
//!
//! # Example
//!
//! ```
//! use rune_features::encode;
//! use rune_types::{EncoderConfig, RawStroke, RawTrace};
//!
//! let trace = RawTrace::new(vec![
//!     RawStroke::from_tuples(&[(0.0, 0.0, 0), (10.0, 0.0, 30)]),
//!     RawStroke::from_tuples(&[(10.0, 10.0, 60), (0.0, 10.0, 90)]),
//! ]);
//!
//! let seq = encode(&trace, &EncoderConfig::new(32));
//! assert_eq!(seq.shape(), [32, 4]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod batch;
mod encode;
mod error;
mod estimate;
mod resample;
mod sequence;

pub use batch::{encode_batch, encode_batch_flat};
pub use encode::{
    DENOISE_THRESHOLD, DeltaRow, EXTENT_EPSILON, STD_EPSILON, delta_rows, encode,
};
pub use estimate::{DEFAULT_PERCENTILE, estimate_max_points, percentile};
pub use resample::resample_indices;
pub use sequence::EncodedSequence;

pub use error::{FeatureError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        EncodedSequence, FeatureError, delta_rows, encode, encode_batch, estimate_max_points,
        resample_indices,
    };
}
