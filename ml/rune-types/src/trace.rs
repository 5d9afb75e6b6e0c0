//! Raw stroke capture types and the trace loader.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypesError};
use crate::schema::SchemaVersion;

/// Source label used for traces parsed from memory.
const MEMORY_SOURCE: &str = "<memory>";

/// A single captured pen sample.
///
/// `t` is a timestamp in a fixed unit (milliseconds in practice) relative
/// to capture start. It is expected to be non-decreasing in capture order.
///
/// # Example
///
/// ```
/// use rune_types::RawPoint;
///
/// let p = RawPoint::new(0.25, 0.5, 16);
/// assert_eq!(p.t, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Timestamp.
    pub t: i64,
}

impl RawPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64, t: i64) -> Self {
        Self { x, y, t }
    }

    /// Returns `true` if both coordinates are finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One continuous pen-down segment, in capture order.
///
/// Serialized as a bare JSON array of points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawStroke {
    /// Points in capture order.
    pub points: Vec<RawPoint>,
}

impl RawStroke {
    /// Creates a stroke from points.
    #[must_use]
    pub const fn new(points: Vec<RawPoint>) -> Self {
        Self { points }
    }

    /// Creates a stroke from `(x, y, t)` tuples.
    ///
    /// # Example
    ///
    /// ```
    /// use rune_types::RawStroke;
    ///
    /// let stroke = RawStroke::from_tuples(&[(0.0, 0.0, 0), (1.0, 0.0, 10)]);
    /// assert_eq!(stroke.len(), 2);
    /// ```
    #[must_use]
    pub fn from_tuples(points: &[(f64, f64, i64)]) -> Self {
        Self {
            points: points
                .iter()
                .map(|&(x, y, t)| RawPoint::new(x, y, t))
                .collect(),
        }
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the stroke has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One complete captured gesture.
///
/// A trace may have zero strokes or only empty strokes; encoders treat
/// that as the empty-trace case rather than an error.
///
/// # Example
///
/// ```
/// use rune_types::RawTrace;
///
/// let json = r#"{"strokes": [[{"x": 0, "y": 0, "t": 0}, {"x": 4, "y": 2, "t": 30}]]}"#;
/// let trace = RawTrace::from_json(json).unwrap();
/// assert_eq!(trace.point_count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrace {
    /// Optional file schema version. Absent in legacy captures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<SchemaVersion>,

    /// Strokes in capture order.
    pub strokes: Vec<RawStroke>,
}

impl RawTrace {
    /// Creates an unversioned trace from strokes.
    #[must_use]
    pub const fn new(strokes: Vec<RawStroke>) -> Self {
        Self {
            schema_version: None,
            strokes,
        }
    }

    /// Stamps the trace with the current schema version.
    #[must_use]
    pub const fn versioned(mut self) -> Self {
        self.schema_version = Some(SchemaVersion::CURRENT);
        self
    }

    /// Iterates over all points in stroke order, then within-stroke order.
    pub fn points(&self) -> impl Iterator<Item = &RawPoint> {
        self.strokes.iter().flat_map(|s| s.points.iter())
    }

    /// Returns the total number of points across all strokes.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(RawStroke::len).sum()
    }

    /// Returns the number of strokes with at least one point.
    #[must_use]
    pub fn non_empty_strokes(&self) -> usize {
        self.strokes.iter().filter(|s| !s.is_empty()).count()
    }

    /// Returns `true` if the trace has no points at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.iter().all(RawStroke::is_empty)
    }

    /// Checks that the trace can be encoded.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::MalformedTrace` for non-finite coordinates and
    /// `TypesError::SchemaVersionMismatch` for an unsupported schema.
    pub fn validate(&self, source: &str) -> Result<()> {
        if let Some(version) = &self.schema_version {
            version.ensure_supported()?;
        }

        for (s, stroke) in self.strokes.iter().enumerate() {
            if let Some(j) = stroke.points.iter().position(|p| !p.is_finite()) {
                return Err(TypesError::malformed(
                    source,
                    format!("non-finite coordinate at stroke {s}, point {j}"),
                ));
            }
        }

        Ok(())
    }

    /// Parses a trace from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::MalformedTrace` if the JSON does not describe a
    /// valid trace.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::parse(json, MEMORY_SOURCE)
    }

    /// Serializes the trace to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(TypesError::from)
    }

    fn parse(json: &str, source: &str) -> Result<Self> {
        let trace: Self =
            serde_json::from_str(json).map_err(|e| TypesError::malformed(source, e.to_string()))?;
        trace.validate(source)?;
        Ok(trace)
    }
}

/// Loads a trace from a JSON file.
///
/// # Errors
///
/// Returns `TypesError::Io` if the file cannot be read and
/// `TypesError::MalformedTrace` if its content is not a valid trace.
///
/// # Example
///
/// ```no_run
/// use rune_types::load_trace;
///
/// let trace = load_trace("dataset/Fire/sample_001.json")?;
/// println!("{} strokes", trace.strokes.len());
/// # Ok::<(), rune_types::TypesError>(())
/// ```
pub fn load_trace(path: impl AsRef<Path>) -> Result<RawTrace> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let json = std::fs::read_to_string(path).map_err(|e| TypesError::io(&source, e.to_string()))?;
    RawTrace::parse(&json, &source)
}
