//! Length normalization: nearest-neighbour resampling, padding, truncation.

/// Selects `target` row indices spread evenly over `0..len`.
///
/// Index `i` is `i * (len - 1) / (target - 1)` rounded half to even, with
/// the last index pinned to `len - 1`. Downsampling only picks existing
/// rows; when `len` is barely larger than `target` an index may repeat.
///
/// Returns an empty vector when either argument is zero. A single target
/// selects the first row.
///
/// # Example
///
/// ```
/// use rune_features::resample_indices;
///
/// assert_eq!(resample_indices(10, 5), vec![0, 2, 4, 7, 9]);
/// ```
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn resample_indices(len: usize, target: usize) -> Vec<usize> {
    if len == 0 || target == 0 {
        return Vec::new();
    }
    if target == 1 {
        return vec![0];
    }

    let last = len - 1;
    let step = last as f64 / (target - 1) as f64;

    (0..target)
        .map(|i| {
            if i == target - 1 {
                last
            } else {
                ((i as f64 * step).round_ties_even() as usize).min(last)
            }
        })
        .collect()
}

/// Brings `rows` to exactly `target` rows.
///
/// Longer inputs are resampled with [`resample_indices`] when `resample` is
/// set and truncated to the first `target` rows otherwise. Shorter inputs
/// are left as they are; the caller's zero-initialized output supplies the
/// padding.
pub(crate) fn fit_length<T: Copy>(rows: &[T], target: usize, resample: bool) -> Vec<T> {
    if rows.len() <= target {
        return rows.to_vec();
    }
    if resample {
        resample_indices(rows.len(), target)
            .into_iter()
            .map(|i| rows[i])
            .collect()
    } else {
        rows[..target].to_vec()
    }
}
