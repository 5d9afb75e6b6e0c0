//! The trace-to-tensor encoder.
//!
//! Order of operations for [`EncoderVariant::Delta4`]:
//!
//! 1. Flatten strokes; an empty trace encodes to all zeros
//! 2. Uniform bounding-box scaling of `(x, y)`
//! 3. Time normalized against the first and last flattened points
//! 4. Delta rows `[dx, dy, dt, pen_lift]`
//! 5. Drop rows with `|(dx, dy)| <= 1e-5`
//! 6. Per-channel standardization
//! 7. Nearest-neighbour resampling or zero padding to `max_points`
//!
//! [`EncoderVariant::Legacy3`] runs steps 1, 2 and 4 without the time
//! channel and truncates instead of resampling.
//!
//! Spatial and temporal arithmetic is done in `f64` and each row is rounded
//! to `f32` once; denoising and standardization then run in `f32`.

use rune_types::{EncoderConfig, EncoderVariant, NegativeDtPolicy, RawPoint, RawTrace};
use tracing::trace;

use crate::resample::fit_length;
use crate::sequence::EncodedSequence;

/// Floor for the bounding box extent and the time span.
pub const EXTENT_EPSILON: f64 = 1e-6;

/// Rows whose `(dx, dy)` magnitude is at or below this are dropped.
pub const DENOISE_THRESHOLD: f32 = 1e-5;

/// Added to each channel's standard deviation.
pub const STD_EPSILON: f32 = 1e-6;

/// One delta row in full form: `[dx, dy, dt, pen_lift]`.
pub type DeltaRow = [f32; 4];

const DX: usize = 0;
const DY: usize = 1;
const PEN: usize = 3;

/// Maps raw coordinates into the trace's normalized frame.
#[derive(Debug, Clone, Copy)]
struct Normalizer {
    min_x: f64,
    min_y: f64,
    scale: f64,
    t0: i64,
    t_span: f64,
}

impl Normalizer {
    /// Fits the normalizer to a trace; `None` if it has no points.
    fn fit(trace: &RawTrace) -> Option<Self> {
        let mut points = trace.points();
        let first = points.next()?;

        let (mut min_x, mut max_x) = (first.x, first.x);
        let (mut min_y, mut max_y) = (first.y, first.y);
        let mut last = first;
        for p in points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
            last = p;
        }

        let w = (max_x - min_x).max(EXTENT_EPSILON);
        let h = (max_y - min_y).max(EXTENT_EPSILON);

        #[allow(clippy::cast_precision_loss)]
        let t_span = ((i128::from(last.t) - i128::from(first.t)) as f64).max(EXTENT_EPSILON);

        Some(Self {
            min_x,
            min_y,
            scale: 1.0 / w.max(h),
            t0: first.t,
            t_span,
        })
    }

    fn xy(&self, p: &RawPoint) -> (f64, f64) {
        ((p.x - self.min_x) * self.scale, (p.y - self.min_y) * self.scale)
    }

    #[allow(clippy::cast_precision_loss)]
    fn t(&self, p: &RawPoint) -> f64 {
        (i128::from(p.t) - i128::from(self.t0)) as f64 / self.t_span
    }
}

/// Builds the raw delta rows of a trace (steps 1 to 4).
///
/// The first point of the trace only seeds the previous position. Each
/// later point emits one row; `pen_lift` is `1.0` on the first point of
/// every stroke after that. Empty strokes emit nothing.
///
/// For [`EncoderVariant::Legacy3`] the `dt` slot is left at zero.
///
/// # Example
///
/// ```
/// use rune_features::delta_rows;
/// use rune_types::{EncoderConfig, RawStroke, RawTrace};
///
/// let trace = RawTrace::new(vec![
///     RawStroke::from_tuples(&[(0.0, 0.0, 0), (1.0, 0.0, 50)]),
///     RawStroke::from_tuples(&[(1.0, 1.0, 100)]),
/// ]);
/// let rows = delta_rows(&trace, &EncoderConfig::new(8));
///
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0], [1.0, 0.0, 0.5, 0.0]);
/// assert_eq!(rows[1], [0.0, 1.0, 0.5, 1.0]);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn delta_rows(trace: &RawTrace, config: &EncoderConfig) -> Vec<DeltaRow> {
    let Some(norm) = Normalizer::fit(trace) else {
        return Vec::new();
    };
    let with_time = config.variant.has_time_channel();
    let clamp_dt = config.negative_dt == NegativeDtPolicy::ClampToZero;

    let mut rows = Vec::with_capacity(trace.point_count().saturating_sub(1));
    let mut prev: Option<(f64, f64, f64)> = None;

    for stroke in trace.strokes.iter().filter(|s| !s.is_empty()) {
        for (j, p) in stroke.points.iter().enumerate() {
            let (x, y) = norm.xy(p);
            let t = norm.t(p);

            let Some((px, py, pt)) = prev.replace((x, y, t)) else {
                continue;
            };

            let dt = if !with_time {
                0.0
            } else if clamp_dt {
                (t - pt).max(0.0)
            } else {
                t - pt
            };
            let pen = if j == 0 { 1.0 } else { 0.0 };

            rows.push([(x - px) as f32, (y - py) as f32, dt as f32, pen]);
        }
    }

    rows
}

/// Drops near-stationary rows (step 5).
fn denoise(rows: &mut Vec<DeltaRow>) {
    rows.retain(|r| (r[DX] * r[DX] + r[DY] * r[DY]).sqrt() > DENOISE_THRESHOLD);
}

/// Standardizes each channel to zero mean and unit variance (step 6).
///
/// Population statistics, accumulated sequentially in row order.
#[allow(clippy::cast_precision_loss)]
fn standardize(rows: &mut [DeltaRow]) {
    if rows.is_empty() {
        return;
    }
    let n = rows.len() as f32;

    for c in 0..4 {
        let mut sum = 0.0_f32;
        for r in rows.iter() {
            sum += r[c];
        }
        let mean = sum / n;

        let mut sq = 0.0_f32;
        for r in rows.iter() {
            let d = r[c] - mean;
            sq += d * d;
        }
        let std = (sq / n).sqrt() + STD_EPSILON;

        for r in rows.iter_mut() {
            r[c] = (r[c] - mean) / std;
        }
    }
}

/// Encodes a trace into a fixed-length sequence.
///
/// Total: every input, including empty and degenerate traces, produces
/// exactly `config.max_points` rows of `config.channels()` values.
///
/// # Example
///
/// ```
/// use rune_features::encode;
/// use rune_types::{EncoderConfig, RawStroke, RawTrace};
///
/// let trace = RawTrace::new(vec![RawStroke::from_tuples(&[
///     (0.0, 0.0, 0),
///     (3.0, 4.0, 10),
///     (6.0, 0.0, 20),
/// ])]);
/// let seq = encode(&trace, &EncoderConfig::new(16));
///
/// assert_eq!(seq.shape(), [16, 4]);
/// assert!(seq.rows().skip(2).all(|r| r.iter().all(|&v| v == 0.0)));
/// ```
#[must_use]
pub fn encode(trace: &RawTrace, config: &EncoderConfig) -> EncodedSequence {
    let mut out = EncodedSequence::zeros(config);
    let mut rows = delta_rows(trace, config);
    let raw_rows = rows.len();

    let fitted = match config.variant {
        EncoderVariant::Delta4 => {
            denoise(&mut rows);
            standardize(&mut rows);
            fit_length(&rows, config.max_points, true)
        }
        EncoderVariant::Legacy3 => fit_length(&rows, config.max_points, false),
    };

    for (i, row) in fitted.iter().enumerate() {
        let dst = out.row_mut(i);
        match config.variant {
            EncoderVariant::Delta4 => dst.copy_from_slice(row),
            EncoderVariant::Legacy3 => dst.copy_from_slice(&[row[DX], row[DY], row[PEN]]),
        }
    }

    trace!(
        variant = %config.variant,
        raw_rows,
        kept_rows = rows.len(),
        max_points = config.max_points,
        "Encoded trace"
    );

    out
}
