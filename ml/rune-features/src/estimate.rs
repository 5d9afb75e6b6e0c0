//! Choosing `max_points` from observed trace lengths.

use crate::error::{FeatureError, Result};

/// Percentile used when no other value is configured.
pub const DEFAULT_PERCENTILE: f64 = 99.0;

/// Linear-interpolated percentile of `values`.
///
/// Matches the common "linear" definition: the rank is
/// `(n - 1) * q / 100` and the result interpolates between the two
/// neighbouring order statistics. Interpolation is anchored on the nearer
/// neighbour so that exact ranks return exact values.
///
/// # Errors
///
/// Returns [`FeatureError::EmptyInput`] for an empty slice and
/// [`FeatureError::InvalidPercentile`] if `q` is outside `[0, 100]`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile(values: &[f64], q: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(FeatureError::EmptyInput);
    }
    if !(0.0..=100.0).contains(&q) {
        return Err(FeatureError::InvalidPercentile(q));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (sorted.len() - 1) as f64 * (q / 100.0);
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = rank - rank.floor();

    let (a, b) = (sorted[lo], sorted[hi]);
    let diff = b - a;
    Ok(if frac >= 0.5 {
        b - diff * (1.0 - frac)
    } else {
        a + diff * frac
    })
}

/// Suggests a sequence length covering `percentile` percent of traces.
///
/// `lengths` are raw point counts per trace. The interpolated percentile is
/// truncated toward zero and never drops below one.
///
/// # Errors
///
/// Same as [`percentile`].
///
/// # Example
///
/// ```
/// use rune_features::estimate_max_points;
///
/// let lengths = [40, 55, 60, 61, 300];
/// assert_eq!(estimate_max_points(&lengths, 50.0).unwrap(), 60);
/// assert_eq!(estimate_max_points(&lengths, 99.0).unwrap(), 290);
/// ```
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn estimate_max_points(lengths: &[usize], percentile_q: f64) -> Result<usize> {
    let values: Vec<f64> = lengths.iter().map(|&n| n as f64).collect();
    let p = percentile(&values, percentile_q)?;
    Ok((p as usize).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&v, 0.0).unwrap(), 1.0);
        assert_relative_eq!(percentile(&v, 100.0).unwrap(), 4.0);
        assert_relative_eq!(percentile(&v, 50.0).unwrap(), 2.5);
        assert_relative_eq!(percentile(&v, 25.0).unwrap(), 1.75);
    }

    #[test]
    fn percentile_ignores_input_order() {
        let a = percentile(&[9.0, 1.0, 5.0], 50.0).unwrap();
        let b = percentile(&[1.0, 5.0, 9.0], 50.0).unwrap();
        assert_relative_eq!(a, b);
        assert_relative_eq!(a, 5.0);
    }

    #[test]
    fn percentile_single_value() {
        assert_relative_eq!(percentile(&[7.0], 99.0).unwrap(), 7.0);
    }

    #[test]
    fn ninety_ninth_truncates() {
        // rank = 4 * 0.99 = 3.96 -> 300 - 239 * 0.04 = 290.44
        let lengths = [40, 55, 60, 61, 300];
        assert_eq!(estimate_max_points(&lengths, 99.0).unwrap(), 290);
    }

    #[test]
    fn estimate_never_zero() {
        assert_eq!(estimate_max_points(&[0, 0, 0], 99.0).unwrap(), 1);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(estimate_max_points(&[], 99.0), Err(FeatureError::EmptyInput));
        assert_eq!(
            estimate_max_points(&[3], 100.5),
            Err(FeatureError::InvalidPercentile(100.5))
        );
        assert!(percentile(&[1.0], -1.0).is_err());
        assert!(percentile(&[1.0], f64::NAN).is_err());
    }
}
