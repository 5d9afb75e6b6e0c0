//! Parallel encoding of many traces.

use rayon::prelude::*;
use rune_types::{EncoderConfig, RawTrace};
use tracing::debug;

use crate::encode::encode;
use crate::sequence::EncodedSequence;

/// Encodes traces in parallel, preserving input order.
///
/// Output is identical to calling [`encode`] on each trace in turn.
#[must_use]
pub fn encode_batch(traces: &[RawTrace], config: &EncoderConfig) -> Vec<EncodedSequence> {
    debug!(count = traces.len(), variant = %config.variant, "Encoding batch");
    traces.par_iter().map(|t| encode(t, config)).collect()
}

/// Encodes traces in parallel into one flat row-major buffer.
///
/// The buffer has shape `[traces.len(), max_points, channels]`, ready to be
/// wrapped in a tensor.
#[must_use]
pub fn encode_batch_flat(traces: &[RawTrace], config: &EncoderConfig) -> Vec<f32> {
    let mut flat = Vec::with_capacity(traces.len() * config.len());
    for seq in encode_batch(traces, config) {
        flat.extend_from_slice(seq.as_slice());
    }
    flat
}
