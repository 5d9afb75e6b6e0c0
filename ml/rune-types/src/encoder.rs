//! Feature encoder configuration.
//!
//! The encoder configuration decides the shape and meaning of every model
//! input, so it travels with checkpoints and exports instead of living in a
//! constant.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypesError};

/// Encoded trace format.
///
/// The two variants produce incompatible tensors and must never be mixed
/// within one model.
///
/// # Example
///
/// ```
/// use rune_types::EncoderVariant;
///
/// assert_eq!(EncoderVariant::default(), EncoderVariant::Delta4);
/// assert_eq!(EncoderVariant::Delta4.channels(), 4);
/// assert_eq!(EncoderVariant::Legacy3.channels(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncoderVariant {
    /// `[dx, dy, dt, pen_lift]` with denoise, standardization and
    /// nearest-neighbour resampling.
    #[default]
    Delta4,

    /// `[dx, dy, pen_lift]` with hard truncation.
    ///
    /// Deprecated. Kept so early checkpoints stay interpretable.
    Legacy3,
}

impl EncoderVariant {
    /// Returns the number of channels per encoded step.
    #[must_use]
    pub const fn channels(&self) -> usize {
        match self {
            Self::Delta4 => 4,
            Self::Legacy3 => 3,
        }
    }

    /// Returns the variant name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Delta4 => "delta4",
            Self::Legacy3 => "legacy3",
        }
    }

    /// Parses a variant name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "delta4" => Some(Self::Delta4),
            "legacy3" => Some(Self::Legacy3),
            _ => None,
        }
    }

    /// Returns `true` for the deprecated format.
    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy3)
    }

    /// Returns `true` if the variant has a time channel.
    #[must_use]
    pub const fn has_time_channel(&self) -> bool {
        matches!(self, Self::Delta4)
    }

    /// Index of the pen-lift channel within a row.
    #[must_use]
    pub const fn pen_channel(&self) -> usize {
        self.channels() - 1
    }
}

impl std::fmt::Display for EncoderVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Handling of negative time deltas.
///
/// Strokes captured with overlapping time ranges (multi-touch) produce
/// negative `dt` when flattened in stroke order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NegativeDtPolicy {
    /// Keep the raw difference. Matches existing checkpoints.
    #[default]
    Keep,

    /// Clamp negative `dt` to zero before denoising.
    ClampToZero,
}

/// Configuration of the trace-to-tensor encoder.
///
/// No `Default`: `max_points` must match the model
/// a sequence is fed to, so every caller states it.
///
/// # Example
///
/// ```
/// use rune_types::{EncoderConfig, EncoderVariant};
///
/// let config = EncoderConfig::new(100);
/// assert_eq!(config.variant, EncoderVariant::Delta4);
/// assert_eq!(config.shape(), [100, 4]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Encoded trace format.
    pub variant: EncoderVariant,

    /// Fixed output sequence length.
    pub max_points: usize,

    /// Handling of negative time deltas.
    #[serde(default)]
    pub negative_dt: NegativeDtPolicy,
}

impl EncoderConfig {
    /// Creates a configuration for the current 4-channel format.
    #[must_use]
    pub const fn new(max_points: usize) -> Self {
        Self {
            variant: EncoderVariant::Delta4,
            max_points,
            negative_dt: NegativeDtPolicy::Keep,
        }
    }

    /// Creates a configuration for the deprecated 3-channel format.
    #[must_use]
    pub const fn legacy(max_points: usize) -> Self {
        Self {
            variant: EncoderVariant::Legacy3,
            max_points,
            negative_dt: NegativeDtPolicy::Keep,
        }
    }

    /// Sets the encoder variant.
    #[must_use]
    pub const fn with_variant(mut self, variant: EncoderVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Sets the negative time delta policy.
    #[must_use]
    pub const fn with_negative_dt(mut self, policy: NegativeDtPolicy) -> Self {
        self.negative_dt = policy;
        self
    }

    /// Returns the number of channels per step.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.variant.channels()
    }

    /// Returns `[max_points, channels]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 2] {
        [self.max_points, self.channels()]
    }

    /// Returns the number of values in one encoded sequence.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.max_points * self.channels()
    }

    /// Returns `true` if the configuration would encode to nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.max_points == 0
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::InvalidConfig` if `max_points` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_points == 0 {
            return Err(TypesError::invalid_config("max_points must be > 0"));
        }
        Ok(())
    }

    /// Checks that two configurations produce interchangeable tensors.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::InvalidConfig` describing the first difference.
    pub fn ensure_matches(&self, other: &Self) -> Result<()> {
        if self.variant != other.variant {
            return Err(TypesError::invalid_config(format!(
                "encoder variant mismatch: {} vs {}",
                self.variant, other.variant
            )));
        }
        if self.max_points != other.max_points {
            return Err(TypesError::invalid_config(format!(
                "max_points mismatch: {} vs {}",
                self.max_points, other.max_points
            )));
        }
        if self.negative_dt != other.negative_dt {
            return Err(TypesError::invalid_config("negative dt policy mismatch"));
        }
        Ok(())
    }
}
