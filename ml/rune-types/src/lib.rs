//! Stroke capture types for rune recognition.
//!
//! This crate provides the shared vocabulary of the rune pipeline:
//!
//! # Capture Types
//!
//! - [`RawPoint`] - One `(x, y, t)` pen sample
//! - [`RawStroke`] - One pen-down segment
//! - [`RawTrace`] - One complete gesture
//! - [`load_trace`] - Read a trace from a JSON capture file
//!
//! # Encoding Contract
//!
//! - [`EncoderConfig`] - Output length, format and time policy of the encoder
//! - [`EncoderVariant`] - Current 4-channel or legacy 3-channel format
//! - [`LabelSet`] - Ordered class names, persisted with every model
//! - [`SchemaVersion`] - Version stamp for files and artifacts
//!
//! # Dependencies
//!
//! No ML framework dependency. It can be used in:
//! - Training pipelines
//! - Capture tooling
//! - Dataset validation scripts
//!
//! # Example
//!
//! ```
//! use rune_types::{EncoderConfig, RawTrace};
//!
//! let json = r#"{"strokes": [[{"x": 0, "y": 0, "t": 0}, {"x": 1, "y": 1, "t": 20}]]}"#;
//! let trace = RawTrace::from_json(json).unwrap();
//! let config = EncoderConfig::new(100);
//!
//! assert_eq!(trace.point_count(), 2);
//! assert_eq!(config.channels(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod encoder;
mod error;
mod labels;
mod schema;
mod trace;

// Re-export capture types
pub use trace::{RawPoint, RawStroke, RawTrace, load_trace};

// Re-export encoding contract types
pub use encoder::{EncoderConfig, EncoderVariant, NegativeDtPolicy};
pub use labels::LabelSet;
pub use schema::SchemaVersion;

// Re-export error types
pub use error::{Result, TypesError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        EncoderConfig, EncoderVariant, LabelSet, NegativeDtPolicy, RawPoint, RawStroke, RawTrace,
        SchemaVersion, TypesError, load_trace,
    };
}
