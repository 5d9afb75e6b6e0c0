//! Dataset splitting utilities.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};
use crate::index::SampleEntry;

/// Fraction of a dataset held out for validation.
///
/// # Example
///
/// ```
/// use rune_dataset::SplitRatio;
///
/// let ratio = SplitRatio::try_new(0.2).unwrap();
/// assert_eq!(ratio.val_count(10), 2);
/// assert_eq!(ratio.val_count(9), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatio {
    val: f32,
}

impl SplitRatio {
    /// Creates a split ratio, returning `None` unless `val` is in `[0, 1)`.
    #[must_use]
    pub fn try_new(val: f32) -> Option<Self> {
        if (0.0..1.0).contains(&val) {
            Some(Self { val })
        } else {
            None
        }
    }

    /// Returns the validation fraction.
    #[must_use]
    pub const fn val_ratio(&self) -> f32 {
        self.val
    }

    /// Returns the training fraction.
    #[must_use]
    pub fn train_ratio(&self) -> f32 {
        1.0 - self.val
    }

    /// Number of validation samples for a dataset size, rounded down.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn val_count(&self, total: usize) -> usize {
        ((total as f64 * f64::from(self.val)).floor() as usize).min(total)
    }

    /// Common 80/20 split.
    pub const EIGHTY_TWENTY: Self = Self { val: 0.2 };

    /// Common 90/10 split.
    pub const NINETY_TEN: Self = Self { val: 0.1 };
}

impl Default for SplitRatio {
    fn default() -> Self {
        Self::EIGHTY_TWENTY
    }
}

/// Splits items into `(train, val)` after a seeded shuffle.
///
/// The validation set gets `floor(len * val_fraction)` items; the same seed
/// and input always give the same split.
///
/// # Errors
///
/// Returns [`DatasetError::InvalidSplitRatio`] unless `val_fraction` is in
/// `[0, 1)`.
///
/// # Example
///
/// ```
/// use rune_dataset::split_train_val;
///
/// let items: Vec<u32> = (0..10).collect();
/// let (train, val) = split_train_val(&items, 0.2, 42).unwrap();
/// assert_eq!(train.len(), 8);
/// assert_eq!(val.len(), 2);
/// ```
pub fn split_train_val<T: Clone>(
    items: &[T],
    val_fraction: f32,
    seed: u64,
) -> Result<(Vec<T>, Vec<T>)> {
    let ratio =
        SplitRatio::try_new(val_fraction).ok_or(DatasetError::invalid_split_ratio(val_fraction))?;

    let mut indices: Vec<usize> = (0..items.len()).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let split = items.len() - ratio.val_count(items.len());
    let train = indices[..split].iter().map(|&i| items[i].clone()).collect();
    let val = indices[split..].iter().map(|&i| items[i].clone()).collect();

    Ok((train, val))
}

/// Splits samples per label so each label keeps roughly the same share.
///
/// Each label's samples are split with [`split_train_val`] on a seed derived
/// from the label index; the combined sets are then shuffled.
///
/// # Errors
///
/// Same as [`split_train_val`].
pub fn split_stratified(
    samples: &[SampleEntry],
    val_fraction: f32,
    seed: u64,
) -> Result<(Vec<SampleEntry>, Vec<SampleEntry>)> {
    let num_labels = samples.iter().map(|s| s.label + 1).max().unwrap_or(0);

    let mut train = Vec::with_capacity(samples.len());
    let mut val = Vec::new();
    for label in 0..num_labels {
        let group: Vec<SampleEntry> = samples.iter().filter(|s| s.label == label).cloned().collect();
        let (t, v) = split_train_val(&group, val_fraction, seed.wrapping_add(label as u64))?;
        train.extend(t);
        val.extend(v);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(num_labels as u64));
    train.shuffle(&mut rng);
    val.shuffle(&mut rng);

    Ok((train, val))
}
