//! Synthetic noise traces for the catch-all "Unknown" class.
//!
//! Each trace is a clamped gaussian random walk in the unit square. Stroke
//! count, points per stroke and jitter are drawn per trace from a
//! [`NoiseConfig`].

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rune_types::{RawPoint, RawStroke, RawTrace};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DatasetError, Result};

/// Label directory conventionally used for noise samples.
pub const NOISE_LABEL: &str = "Unknown";

/// Ranges the generator draws from (half-open).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Strokes per trace.
    pub strokes: Range<usize>,

    /// Points per stroke.
    pub points: Range<usize>,

    /// Standard deviation of each step.
    pub jitter: Range<f64>,

    /// Milliseconds between consecutive points.
    pub step_ms: Range<i64>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            strokes: 1..4,
            points: 10..60,
            jitter: 0.05..0.25,
            step_ms: 5..20,
        }
    }
}

impl NoiseConfig {
    /// Returns `true` if every range is non-empty and values are sane.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.strokes.is_empty()
            && !self.points.is_empty()
            && !self.jitter.is_empty()
            && !self.step_ms.is_empty()
            && self.strokes.start > 0
            && self.points.start > 0
            && self.jitter.start >= 0.0
            && self.jitter.end.is_finite()
            && self.step_ms.start >= 0
    }
}

/// Generates one random-walk trace.
///
/// Each stroke starts at a uniform position in the unit square; every point
/// adds gaussian noise with standard deviation `jitter` and is clamped back
/// into `[0, 1]`. Time advances by `step_ms` (drawn per point) and keeps
/// running across strokes.
///
/// # Errors
///
/// Returns [`DatasetError::Validation`] if `jitter` is negative or not
/// finite, or if `step_ms` is empty.
pub fn random_trace<R: Rng + ?Sized>(
    rng: &mut R,
    strokes: usize,
    points: usize,
    jitter: f64,
    step_ms: Range<i64>,
) -> Result<RawTrace> {
    if !(jitter.is_finite() && jitter >= 0.0) {
        return Err(DatasetError::validation(format!(
            "jitter must be finite and non-negative, got {jitter}"
        )));
    }
    let normal = Normal::new(0.0, jitter)
        .map_err(|e| DatasetError::validation(format!("jitter {jitter}: {e}")))?;
    if step_ms.is_empty() {
        return Err(DatasetError::validation("empty time step range"));
    }

    let mut t = 0i64;
    let mut out = Vec::with_capacity(strokes);
    for _ in 0..strokes {
        let mut x: f64 = rng.r#gen();
        let mut y: f64 = rng.r#gen();
        let mut pts = Vec::with_capacity(points);
        for _ in 0..points {
            x = (x + normal.sample(rng)).clamp(0.0, 1.0);
            y = (y + normal.sample(rng)).clamp(0.0, 1.0);
            t += rng.gen_range(step_ms.clone());
            pts.push(RawPoint::new(x, y, t));
        }
        out.push(RawStroke::new(pts));
    }

    Ok(RawTrace::new(out))
}

/// Generates one trace with parameters drawn from `config`.
///
/// # Errors
///
/// Returns [`DatasetError::Validation`] if `config` is not valid.
pub fn random_trace_from<R: Rng + ?Sized>(rng: &mut R, config: &NoiseConfig) -> Result<RawTrace> {
    if !config.is_valid() {
        return Err(DatasetError::validation(format!("invalid noise config: {config:?}")));
    }
    let strokes = rng.gen_range(config.strokes.clone());
    let points = rng.gen_range(config.points.clone());
    let jitter = rng.gen_range(config.jitter.clone());
    random_trace(rng, strokes, points, jitter, config.step_ms.clone())
}

/// Writes `count` noise traces into `dir` with the default configuration.
///
/// Files are named `noise_{seed}_{i:04}.json`; the same seed always
/// generates the same traces. Existing files are never overwritten, so add
/// more samples to a directory by running again with a different seed.
///
/// # Errors
///
/// Returns [`DatasetError::Validation`] if a target file already exists, and
/// [`DatasetError::Io`] if the directory or a file cannot be written.
pub fn write_noise_samples(dir: impl AsRef<Path>, count: usize, seed: u64) -> Result<Vec<PathBuf>> {
    write_noise_samples_with(dir, count, seed, &NoiseConfig::default())
}

/// Writes `count` noise traces into `dir` with a custom configuration.
///
/// # Errors
///
/// Same as [`write_noise_samples`], plus [`DatasetError::Validation`] for an
/// invalid `config`.
pub fn write_noise_samples_with(
    dir: impl AsRef<Path>,
    count: usize,
    seed: u64,
    config: &NoiseConfig,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| DatasetError::io(format!("{}: {e}", dir.display())))?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut paths = Vec::with_capacity(count);

    for i in 0..count {
        let trace = random_trace_from(&mut rng, config)?;
        let path = dir.join(format!("noise_{seed}_{i:04}.json"));
        let json = serde_json::to_string(&trace)?;
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(DatasetError::validation(format!(
                    "{} already exists; use a different seed",
                    path.display()
                )));
            }
            Err(e) => return Err(DatasetError::io(format!("{}: {e}", path.display()))),
        };
        file.write_all(json.as_bytes())
            .map_err(|e| DatasetError::io(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), points = trace.point_count(), "Wrote noise sample");
        paths.push(path);
    }

    info!(dir = %dir.display(), count, seed, "Generated noise samples");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rune_types::load_trace;

    #[test]
    fn default_config_is_valid() {
        assert!(NoiseConfig::default().is_valid());

        let bad = NoiseConfig {
            strokes: 0..1,
            ..NoiseConfig::default()
        };
        assert!(!bad.is_valid());
    }

    #[test]
    fn random_trace_shape_and_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let trace = random_trace(&mut rng, 3, 25, 0.2, 5..20).unwrap();

        assert_eq!(trace.strokes.len(), 3);
        assert!(trace.strokes.iter().all(|s| s.len() == 25));
        assert!(trace.points().all(|p| (0.0..=1.0).contains(&p.x)));
        assert!(trace.points().all(|p| (0.0..=1.0).contains(&p.y)));
    }

    #[test]
    fn time_advances_across_strokes() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let trace = random_trace(&mut rng, 2, 10, 0.1, 5..20).unwrap();

        let times: Vec<i64> = trace.points().map(|p| p.t).collect();
        assert!(times[0] >= 5 && times[0] < 20);
        for w in times.windows(2) {
            let step = w[1] - w[0];
            assert!((5..20).contains(&step), "step {step}");
        }
    }

    #[test]
    fn random_trace_rejects_bad_jitter() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(random_trace(&mut rng, 1, 5, -1.0, 5..20).is_err());
        assert!(random_trace(&mut rng, 1, 5, 0.0, 5..20).is_ok());
        assert!(random_trace(&mut rng, 1, 5, f64::INFINITY, 5..20).is_err());
        assert!(random_trace(&mut rng, 1, 5, f64::NAN, 5..20).is_err());
        assert!(random_trace(&mut rng, 1, 5, 0.1, 5..5).is_err());
    }

    #[test]
    fn drawn_parameters_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = NoiseConfig::default();
        for _ in 0..50 {
            let trace = random_trace_from(&mut rng, &config).unwrap();
            assert!(config.strokes.contains(&trace.strokes.len()));
            assert!(trace.strokes.iter().all(|s| config.points.contains(&s.len())));
        }
    }

    #[test]
    fn write_is_seeded_and_loadable() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();

        let paths_a = write_noise_samples(a.path(), 4, 42).unwrap();
        let paths_b = write_noise_samples(b.path(), 4, 42).unwrap();

        assert_eq!(paths_a.len(), 4);
        assert!(paths_a[0].ends_with("noise_42_0000.json"));
        for (pa, pb) in paths_a.iter().zip(&paths_b) {
            let ta = load_trace(pa).unwrap();
            let tb = load_trace(pb).unwrap();
            assert_eq!(ta, tb);
            assert!(ta.point_count() >= 10);
        }
    }

    #[test]
    fn write_refuses_to_overwrite_existing_samples() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_noise_samples(dir.path(), 2, 7).unwrap();
        let before = fs::read_to_string(&first[0]).unwrap();

        let err = write_noise_samples(dir.path(), 2, 7).unwrap_err();
        assert!(err.to_string().contains("already exists"), "{err}");
        assert_eq!(fs::read_to_string(&first[0]).unwrap(), before);

        let more = write_noise_samples(dir.path(), 2, 8).unwrap();
        assert_eq!(more.len(), 2);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 4);
    }
}
