//! Fixed-length encoded sequences.

use rune_types::{EncoderConfig, EncoderVariant};
use serde::{Deserialize, Serialize};

/// A fixed-length, multi-channel encoding of one trace.
///
/// Stored row-major: row `i`, channel `c` lives at `i * channels + c`.
/// Always holds exactly `max_points` rows.
///
/// # Example
///
/// ```
/// use rune_features::EncodedSequence;
/// use rune_types::EncoderConfig;
///
/// let seq = EncodedSequence::zeros(&EncoderConfig::new(8));
/// assert_eq!(seq.max_points(), 8);
/// assert_eq!(seq.channels(), 4);
/// assert!(seq.is_all_zero());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedSequence {
    variant: EncoderVariant,
    max_points: usize,
    data: Vec<f32>,
}

impl EncodedSequence {
    /// Creates an all-zero sequence for a configuration.
    #[must_use]
    pub fn zeros(config: &EncoderConfig) -> Self {
        Self {
            variant: config.variant,
            max_points: config.max_points,
            data: vec![0.0; config.len()],
        }
    }

    /// Returns the encoder variant that produced this sequence.
    #[must_use]
    pub const fn variant(&self) -> EncoderVariant {
        self.variant
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn max_points(&self) -> usize {
        self.max_points
    }

    /// Returns the number of channels per row.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.variant.channels()
    }

    /// Returns `[max_points, channels]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 2] {
        [self.max_points, self.variant.channels()]
    }

    /// Returns a row by index.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let c = self.channels();
        self.data.get(index * c..(index + 1) * c)
    }

    /// Iterates over rows.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.channels())
    }

    /// Returns one channel across all rows.
    #[must_use]
    pub fn channel(&self, channel: usize) -> Vec<f32> {
        self.rows().map(|r| r[channel]).collect()
    }

    /// Returns the flat row-major values.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the sequence, returning the flat row-major values.
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Returns `true` if every value is zero.
    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }

    /// Counts rows whose pen-lift channel is exactly `1.0`.
    ///
    /// Only meaningful for unstandardized output (the legacy variant);
    /// standardization rescales the channel.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn pen_lift_count(&self) -> usize {
        let pen = self.variant.pen_channel();
        self.rows().filter(|r| r[pen] == 1.0).count()
    }

    pub(crate) fn row_mut(&mut self, index: usize) -> &mut [f32] {
        let c = self.channels();
        &mut self.data[index * c..(index + 1) * c]
    }
}
