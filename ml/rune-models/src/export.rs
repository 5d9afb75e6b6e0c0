//! Inference export: weights plus a manifest pinning the tensor contract.
//!
//! The manifest fixes input and output names and shapes so that a runtime
//! consuming the export can check its inputs without rebuilding the model
//! description. Only the batch axis is allowed to vary.

use std::fs;
use std::path::{Path, PathBuf};

use burn::prelude::Backend;
use rune_types::{EncoderConfig, LabelSet, SchemaVersion};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checkpoint::{BUNDLE_STEM, CheckpointFormat, CheckpointMeta, save_checkpoint};
use crate::classifier::{StrokeTransformer, StrokeTransformerConfig};
use crate::error::{ModelError, Result};

/// Name of the model input tensor.
pub const INPUT_NAME: &str = "trace";

/// Name of the model output tensor.
pub const OUTPUT_NAME: &str = "logits";

/// Description of an exported model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceManifest {
    /// Format version of this manifest.
    pub schema_version: SchemaVersion,

    /// Input tensor name.
    pub input_name: String,

    /// Output tensor name.
    pub output_name: String,

    /// `[batch, max_points, channels]` at export time.
    pub input_shape: [usize; 3],

    /// `[batch, num_labels]` at export time.
    pub output_shape: [usize; 2],

    /// Whether the batch axis may differ from the exported batch size.
    pub dynamic_batch: bool,

    /// Class names in output index order.
    pub labels: LabelSet,

    /// Encoder that must produce the input.
    pub encoder: EncoderConfig,

    /// Model hyperparameters.
    pub model: StrokeTransformerConfig,

    /// Weight file name, relative to the manifest.
    pub weights: String,

    /// Weight file format.
    pub format: CheckpointFormat,
}

impl InferenceManifest {
    /// Builds the manifest for a checkpoint at a given batch size.
    #[must_use]
    pub fn from_meta(meta: &CheckpointMeta, batch_size: usize) -> Self {
        Self {
            schema_version: SchemaVersion::CURRENT,
            input_name: INPUT_NAME.to_string(),
            output_name: OUTPUT_NAME.to_string(),
            input_shape: meta.model.input_shape(batch_size),
            output_shape: [batch_size, meta.labels.len()],
            dynamic_batch: true,
            labels: meta.labels.clone(),
            encoder: meta.encoder,
            model: meta.model,
            weights: format!("{BUNDLE_STEM}.{}", meta.format.extension()),
            format: meta.format,
        }
    }

    /// Returns the checkpoint metadata this manifest describes.
    #[must_use]
    pub fn to_meta(&self) -> CheckpointMeta {
        CheckpointMeta::new(self.labels.clone(), self.encoder, self.model).with_format(self.format)
    }

    /// Path of the manifest inside an export directory.
    #[must_use]
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(format!("{BUNDLE_STEM}.manifest.json"))
    }

    /// Checks the manifest for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if the recorded shapes disagree
    /// with the encoder, model or labels, and any
    /// [`CheckpointMeta::validate`] error.
    pub fn validate(&self) -> Result<()> {
        self.to_meta().validate()?;

        let batch = self.input_shape[0];
        let input = self.model.input_shape(batch);
        if self.input_shape != input {
            return Err(ModelError::shape_mismatch(
                format!("{input:?}"),
                format!("{:?}", self.input_shape),
            ));
        }
        let output = [batch, self.labels.len()];
        if self.output_shape != output {
            return Err(ModelError::shape_mismatch(
                format!("{output:?}"),
                format!("{:?}", self.output_shape),
            ));
        }
        Ok(())
    }

    /// Reads and validates a manifest from an export directory.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CheckpointNotFound`] if the manifest is
    /// missing, [`ModelError::LoadCheckpoint`] if it cannot be parsed, and
    /// any [`validate`](Self::validate) error.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        if !path.exists() {
            return Err(ModelError::checkpoint_not_found(path.display().to_string()));
        }
        let json = fs::read_to_string(&path)?;
        let manifest: Self = serde_json::from_str(&json)
            .map_err(|e| ModelError::load_checkpoint(path.display().to_string(), e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }
}

/// Writes an inference export of `model` into `dir`.
///
/// Produces the weight file and `rune_seq.manifest.json`. Graph formats
/// such as ONNX are not emitted; the manifest carries the tensor contract
/// instead.
///
/// # Errors
///
/// Returns an error if `meta` is inconsistent, `batch_size` is zero, or any
/// file cannot be written.
pub fn export_inference<B: Backend>(
    model: &StrokeTransformer<B>,
    meta: &CheckpointMeta,
    dir: &Path,
    batch_size: usize,
) -> Result<InferenceManifest> {
    if batch_size == 0 {
        return Err(ModelError::invalid_config("export batch size must be > 0"));
    }
    meta.validate()?;
    fs::create_dir_all(dir)?;

    save_checkpoint::<B, _>(model, &dir.join(BUNDLE_STEM), meta.format)?;

    let manifest = InferenceManifest::from_meta(meta, batch_size);
    let path = InferenceManifest::path_in(dir);
    fs::write(&path, serde_json::to_string_pretty(&manifest)?)
        .map_err(|e| ModelError::save_checkpoint(path.display().to_string(), e.to_string()))?;

    info!(
        dir = %dir.display(),
        input = ?manifest.input_shape,
        output = ?manifest.output_shape,
        "Exported inference model"
    );
    Ok(manifest)
}
