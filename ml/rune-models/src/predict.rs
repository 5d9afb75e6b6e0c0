//! Classifying traces with a saved model.

use std::path::Path;

use burn::prelude::Backend;
use burn::tensor::{Tensor, TensorData};
use rune_features::encode_batch_flat;
use rune_types::{EncoderConfig, LabelSet, RawTrace, load_trace};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checkpoint::{CheckpointMeta, load_bundle, load_checkpoint};
use crate::classifier::StrokeTransformer;
use crate::error::{ModelError, Result};
use crate::export::InferenceManifest;

/// The classifier's answer for one trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Winning label name.
    pub label: String,

    /// Winning label index.
    pub index: usize,

    /// Probability of the winning label.
    pub confidence: f32,

    /// Probability of every label, in label index order.
    pub scores: Vec<f32>,
}

impl Prediction {
    fn from_scores(scores: Vec<f32>, labels: &LabelSet) -> Result<Self> {
        // First maximum wins ties.
        let (index, confidence) = scores
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((i, p)),
            })
            .ok_or_else(|| ModelError::invalid_input("empty score vector"))?;

        let label = labels
            .name(index)
            .ok_or_else(|| ModelError::label_mismatch(labels.len(), scores.len()))?
            .to_string();

        Ok(Self {
            label,
            index,
            confidence,
            scores,
        })
    }

    /// Returns `(label index, probability)` pairs, most likely first.
    #[must_use]
    pub fn ranked(&self) -> Vec<(usize, f32)> {
        let mut ranked: Vec<(usize, f32)> = self.scores.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}

/// A loaded model plus the encoder and labels it was trained with.
///
/// Inputs are always encoded with the persisted [`EncoderConfig`], never a
/// caller-supplied one.
#[derive(Debug)]
pub struct RunePredictor<B: Backend> {
    model: StrokeTransformer<B>,
    meta: CheckpointMeta,
    device: B::Device,
}

impl<B: Backend> RunePredictor<B> {
    /// Wraps an in-memory model.
    ///
    /// # Errors
    ///
    /// Returns any [`CheckpointMeta::validate`] error.
    pub fn new(model: StrokeTransformer<B>, meta: CheckpointMeta, device: B::Device) -> Result<Self> {
        meta.validate()?;
        Ok(Self {
            model,
            meta,
            device,
        })
    }

    /// Loads a checkpoint bundle directory.
    ///
    /// # Errors
    ///
    /// Returns any [`load_bundle`] error.
    pub fn from_bundle(dir: &Path, device: B::Device) -> Result<Self> {
        let (model, meta) = load_bundle::<B>(dir, &device)?;
        Ok(Self {
            model,
            meta,
            device,
        })
    }

    /// Loads an inference export directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is missing or invalid, or the
    /// weights do not load.
    pub fn from_export(dir: &Path, device: B::Device) -> Result<Self> {
        let manifest = InferenceManifest::load(dir)?;
        let meta = manifest.to_meta();
        let model = StrokeTransformer::new(&meta.model, &device);
        let model = load_checkpoint::<B, _>(model, &dir.join(&manifest.weights), &device)?;
        Ok(Self {
            model,
            meta,
            device,
        })
    }

    /// Returns the label set.
    #[must_use]
    pub const fn labels(&self) -> &LabelSet {
        &self.meta.labels
    }

    /// Returns the encoder configuration inputs are encoded with.
    #[must_use]
    pub const fn encoder(&self) -> &EncoderConfig {
        &self.meta.encoder
    }

    /// Returns the checkpoint metadata.
    #[must_use]
    pub const fn meta(&self) -> &CheckpointMeta {
        &self.meta
    }

    /// Classifies one trace.
    ///
    /// # Errors
    ///
    /// Returns an error if the model output cannot be read back.
    pub fn predict(&self, trace: &RawTrace) -> Result<Prediction> {
        let mut out = self.predict_batch(std::slice::from_ref(trace))?;
        out.pop()
            .ok_or_else(|| ModelError::invalid_input("model returned no prediction"))
    }

    /// Loads and classifies a trace file.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidInput`] if the file is not a valid
    /// trace, and any [`predict`](Self::predict) error.
    pub fn predict_file(&self, path: &Path) -> Result<Prediction> {
        let trace = load_trace(path)?;
        self.predict(&trace)
    }

    /// Classifies many traces in one forward pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the model output cannot be read back.
    pub fn predict_batch(&self, traces: &[RawTrace]) -> Result<Vec<Prediction>> {
        if traces.is_empty() {
            return Ok(Vec::new());
        }
        let encoder = &self.meta.encoder;
        let n = traces.len();
        let flat = encode_batch_flat(traces, encoder);
        let input = Tensor::<B, 3>::from_data(
            TensorData::new(flat, [n, encoder.max_points, encoder.channels()]),
            &self.device,
        );

        let probs = self.model.probabilities(input);
        let values: Vec<f32> = probs
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| ModelError::invalid_input(format!("{e:?}")))?;

        let classes = self.meta.labels.len();
        let predictions = values
            .chunks_exact(classes)
            .map(|row| Prediction::from_scores(row.to_vec(), &self.meta.labels))
            .collect::<Result<Vec<_>>>()?;

        debug!(count = predictions.len(), "Classified traces");
        Ok(predictions)
    }
}
