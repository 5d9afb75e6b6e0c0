//! Checkpoint persistence for model weights and their metadata.
//!
//! A checkpoint bundle is a directory holding the Burn weight record next to
//! a JSON sidecar:
//!
//! ```text
//! artifacts/
//! ├── rune_seq.bin        (or rune_seq.json)
//! └── rune_seq.meta.json  (CheckpointMeta)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::Backend;
use burn::record::{BinFileRecorder, FullPrecisionSettings, PrettyJsonFileRecorder};
use rune_types::{EncoderConfig, LabelSet, SchemaVersion};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::{StrokeTransformer, StrokeTransformerConfig};
use crate::error::{ModelError, Result};

/// Base file name of the weights and sidecar inside a bundle directory.
pub const BUNDLE_STEM: &str = "rune_seq";

/// Supported checkpoint file formats.
///
/// # Example
///
/// ```
/// use rune_models::CheckpointFormat;
///
/// let format = CheckpointFormat::from_extension("bin");
/// assert_eq!(format, Some(CheckpointFormat::Binary));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointFormat {
    /// Binary format - compact and fast.
    ///
    /// Uses Burn's `BinFileRecorder` with full precision.
    #[default]
    Binary,

    /// JSON format - human-readable.
    ///
    /// Uses Burn's `PrettyJsonFileRecorder`; larger, but diffable.
    Json,
}

impl CheckpointFormat {
    /// Determines format from file extension.
    ///
    /// - `.bin`, `.burn` -> Binary
    /// - `.json` -> Json
    /// - Other -> None
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "bin" | "burn" => Some(Self::Binary),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Determines format from file path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns the default file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Binary => "bin",
            Self::Json => "json",
        }
    }

    /// Returns the format name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for CheckpointFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Everything needed to rebuild and feed a saved model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// Format version of this sidecar.
    pub schema_version: SchemaVersion,

    /// Class names in output index order.
    pub labels: LabelSet,

    /// Encoder the model was trained against.
    pub encoder: EncoderConfig,

    /// Model hyperparameters.
    pub model: StrokeTransformerConfig,

    /// Weight file format.
    #[serde(default)]
    pub format: CheckpointFormat,

    /// Epoch the weights were taken from (1-based).
    pub epoch: usize,

    /// Validation accuracy at that epoch.
    pub val_accuracy: f32,
}

impl CheckpointMeta {
    /// Creates metadata for a freshly configured model.
    #[must_use]
    pub fn new(labels: LabelSet, encoder: EncoderConfig, model: StrokeTransformerConfig) -> Self {
        Self {
            schema_version: SchemaVersion::CURRENT,
            labels,
            encoder,
            model,
            format: CheckpointFormat::default(),
            epoch: 0,
            val_accuracy: 0.0,
        }
    }

    /// Records the epoch and accuracy the weights come from.
    #[must_use]
    pub const fn with_progress(mut self, epoch: usize, val_accuracy: f32) -> Self {
        self.epoch = epoch;
        self.val_accuracy = val_accuracy;
        self
    }

    /// Sets the weight file format.
    #[must_use]
    pub const fn with_format(mut self, format: CheckpointFormat) -> Self {
        self.format = format;
        self
    }

    /// Checks that labels, encoder and model agree with each other.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidInput`] for an unsupported schema version or
    ///   invalid encoder
    /// - [`ModelError::InvalidConfig`] for an invalid model configuration
    /// - [`ModelError::LabelMismatch`] if the label count differs from
    ///   `num_classes`
    /// - [`ModelError::ShapeMismatch`] if the encoder output does not fit
    ///   the model input
    pub fn validate(&self) -> Result<()> {
        self.schema_version.ensure_supported()?;
        self.encoder.validate()?;
        if !self.model.is_valid() {
            return Err(ModelError::invalid_config(format!("{:?}", self.model)));
        }
        if self.labels.len() != self.model.num_classes {
            return Err(ModelError::label_mismatch(
                self.labels.len(),
                self.model.num_classes,
            ));
        }
        let encoded = self.encoder.shape();
        let expected = [self.model.max_points, self.model.channels];
        if encoded != expected {
            return Err(ModelError::shape_mismatch(
                format!("{expected:?}"),
                format!("{encoded:?}"),
            ));
        }
        Ok(())
    }

    /// Path of the sidecar inside a bundle directory.
    #[must_use]
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(format!("{BUNDLE_STEM}.meta.json"))
    }

    /// Writes the sidecar into a bundle directory.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = Self::path_in(dir);
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .map_err(|e| ModelError::save_checkpoint(path.display().to_string(), e.to_string()))?;
        Ok(path)
    }

    /// Reads and validates the sidecar of a bundle directory.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CheckpointNotFound`] if the sidecar is missing,
    /// [`ModelError::LoadCheckpoint`] if it cannot be parsed, and any
    /// [`validate`](Self::validate) error.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        if !path.exists() {
            return Err(ModelError::checkpoint_not_found(path.display().to_string()));
        }
        let json = fs::read_to_string(&path)?;
        let meta: Self = serde_json::from_str(&json)
            .map_err(|e| ModelError::load_checkpoint(path.display().to_string(), e.to_string()))?;
        meta.validate()?;
        Ok(meta)
    }
}

/// Saves a model checkpoint to a file.
///
/// # Arguments
///
/// - `model`: The model to save
/// - `path`: Output file path (without extension)
/// - `format`: Checkpoint format to use
///
/// # Returns
///
/// The full path to the saved checkpoint (with extension added).
///
/// # Errors
///
/// Returns `ModelError::SaveCheckpoint` if saving fails.
pub fn save_checkpoint<B, M>(model: &M, path: &Path, format: CheckpointFormat) -> Result<PathBuf>
where
    B: Backend,
    M: Module<B>,
{
    let full_path = path.with_extension(format.extension());
    let path_str = full_path.display().to_string();

    match format {
        CheckpointFormat::Binary => {
            let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
            model
                .clone()
                .save_file(full_path.clone(), &recorder)
                .map_err(|e| ModelError::save_checkpoint(&path_str, e.to_string()))?;
        }
        CheckpointFormat::Json => {
            let recorder = PrettyJsonFileRecorder::<FullPrecisionSettings>::new();
            model
                .clone()
                .save_file(full_path.clone(), &recorder)
                .map_err(|e| ModelError::save_checkpoint(&path_str, e.to_string()))?;
        }
    }

    debug!(path = %path_str, format = %format, "Saved checkpoint");
    Ok(full_path)
}

/// Loads a model checkpoint from a file.
///
/// # Arguments
///
/// - `model`: The model to load weights into
/// - `path`: Path to the checkpoint file (with extension)
/// - `device`: Device to load the model onto
///
/// # Errors
///
/// Returns `ModelError::LoadCheckpoint` if loading fails.
/// Returns `ModelError::CheckpointNotFound` if the file doesn't exist.
/// Returns `ModelError::UnsupportedFormat` if the format can't be determined.
pub fn load_checkpoint<B, M>(model: M, path: &Path, device: &B::Device) -> Result<M>
where
    B: Backend,
    M: Module<B>,
{
    let display = path.display().to_string();
    if !path.exists() {
        return Err(ModelError::checkpoint_not_found(display));
    }

    let format =
        CheckpointFormat::from_path(path).ok_or_else(|| ModelError::unsupported_format(&display))?;

    let loaded = match format {
        CheckpointFormat::Binary => {
            let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
            model
                .load_file(path.to_path_buf(), &recorder, device)
                .map_err(|e| ModelError::load_checkpoint(&display, e.to_string()))?
        }
        CheckpointFormat::Json => {
            let recorder = PrettyJsonFileRecorder::<FullPrecisionSettings>::new();
            model
                .load_file(path.to_path_buf(), &recorder, device)
                .map_err(|e| ModelError::load_checkpoint(&display, e.to_string()))?
        }
    };

    Ok(loaded)
}

/// Writes weights and sidecar into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns an error if `meta` is inconsistent or any file cannot be written.
pub fn save_bundle<B: Backend>(
    model: &StrokeTransformer<B>,
    meta: &CheckpointMeta,
    dir: &Path,
) -> Result<PathBuf> {
    meta.validate()?;
    fs::create_dir_all(dir)?;

    let weights = save_checkpoint::<B, _>(model, &dir.join(BUNDLE_STEM), meta.format)?;
    meta.save(dir)?;

    info!(
        dir = %dir.display(),
        epoch = meta.epoch,
        val_accuracy = meta.val_accuracy,
        labels = meta.labels.len(),
        "Saved checkpoint bundle"
    );
    Ok(weights)
}

/// Rebuilds a model from a bundle directory.
///
/// The sidecar decides the architecture, the weight format and the label
/// order; the weights are then loaded into that architecture.
///
/// # Errors
///
/// Returns an error if the sidecar is missing or inconsistent, or the
/// weights do not load into the described architecture.
pub fn load_bundle<B: Backend>(
    dir: &Path,
    device: &B::Device,
) -> Result<(StrokeTransformer<B>, CheckpointMeta)> {
    let meta = CheckpointMeta::load(dir)?;
    let weights = dir.join(BUNDLE_STEM).with_extension(meta.format.extension());

    let model = StrokeTransformer::new(&meta.model, device);
    let model = load_checkpoint::<B, _>(model, &weights, device)?;

    debug!(dir = %dir.display(), epoch = meta.epoch, "Loaded checkpoint bundle");
    Ok((model, meta))
}
