//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::backend::Autodiff;
use burn_ndarray::{NdArray, NdArrayDevice};
use rune_dataset::noise::write_noise_samples;
use rune_dataset::{CorruptSamplePolicy, DatasetIndex, DatasetSummary};
use rune_features::DEFAULT_PERCENTILE;
use rune_models::{
    CheckpointFormat, InferenceManifest, RunePredictor, StrokeTransformerConfig, export_inference,
    load_bundle,
};
use rune_training::{Trainer, TrainingConfig};
use rune_types::{EncoderConfig, EncoderVariant, NegativeDtPolicy, load_trace};
use tracing::info;

use crate::{EncoderArgs, ModelArgs};

type TrainBackend = Autodiff<NdArray<f32>>;
type InferBackend = NdArray<f32>;

const DEVICE: NdArrayDevice = NdArrayDevice::Cpu;

/// Command-line overrides applied on top of a training config.
pub struct TrainOverrides {
    pub epochs: Option<usize>,
    pub batch_size: Option<usize>,
    pub val_fraction: Option<f32>,
    pub patience: Option<usize>,
    pub seed: Option<u64>,
    pub stratified: bool,
    pub json_weights: bool,
}

impl TrainOverrides {
    fn apply(&self, mut config: TrainingConfig) -> TrainingConfig {
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(val_fraction) = self.val_fraction {
            config.val_fraction = val_fraction;
        }
        if let Some(patience) = self.patience {
            config.early_stopping_patience = patience;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.stratified {
            config.stratified = true;
        }
        if self.json_weights {
            config.checkpoint_format = CheckpointFormat::Json;
        }
        config
    }
}

fn policy(strict: bool) -> CorruptSamplePolicy {
    if strict {
        CorruptSamplePolicy::Abort
    } else {
        CorruptSamplePolicy::Skip
    }
}

fn scan(root: &Path, strict: bool) -> Result<DatasetIndex> {
    DatasetIndex::scan(root, policy(strict))
        .with_context(|| format!("scanning dataset {}", root.display()))
}

fn encoder_config(args: &EncoderArgs, max_points: usize) -> Result<EncoderConfig> {
    let variant = if args.legacy {
        EncoderVariant::Legacy3
    } else {
        EncoderVariant::Delta4
    };
    let negative_dt = if args.clamp_negative_dt {
        NegativeDtPolicy::ClampToZero
    } else {
        NegativeDtPolicy::Keep
    };
    let config = EncoderConfig::new(max_points)
        .with_variant(variant)
        .with_negative_dt(negative_dt);
    config.validate().context("invalid encoder settings")?;
    Ok(config)
}

pub fn index(root: &Path, strict: bool, json: bool) -> Result<()> {
    let index = scan(root, strict)?;
    if json {
        println!("{}", index.to_json()?);
    } else {
        print!("{}", DatasetSummary::from_index(&index).to_report());
    }
    Ok(())
}

pub fn estimate(root: &Path, percentile: f64, json: bool) -> Result<()> {
    let summary = DatasetSummary::from_index(&scan(root, false)?);
    let max_points = summary.suggested_max_points(percentile)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "percentile": percentile, "max_points": max_points })
        );
    } else {
        println!("max_points = {max_points} (covers {percentile}% of samples)");
    }
    Ok(())
}

pub fn encode(file: &Path, args: &EncoderArgs, json: bool) -> Result<()> {
    let max_points = args
        .max_points
        .context("--max-points is required to encode a single file")?;
    let config = encoder_config(args, max_points)?;
    let trace = load_trace(file).with_context(|| format!("loading {}", file.display()))?;
    let sequence = rune_features::encode(&trace, &config);

    if json {
        let rows: Vec<&[f32]> = sequence.rows().collect();
        println!("{}", serde_json::to_string(&rows)?);
    } else {
        for (i, row) in sequence.rows().enumerate() {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:>10.5}")).collect();
            println!("{i:>4} {}", cells.join(" "));
        }
    }
    Ok(())
}

pub fn train(
    root: &Path,
    out: &Path,
    config_path: Option<&Path>,
    overrides: &TrainOverrides,
    strict: bool,
    encoder: &EncoderArgs,
    model: &ModelArgs,
) -> Result<()> {
    let base = match config_path {
        Some(path) => TrainingConfig::load(path)
            .with_context(|| format!("loading training config {}", path.display()))?,
        None => TrainingConfig::default(),
    };
    let config = overrides.apply(base);

    let index = scan(root, strict)?;
    let max_points = match encoder.max_points {
        Some(n) => n,
        None => {
            let n = DatasetSummary::from_index(&index).suggested_max_points(DEFAULT_PERCENTILE)?;
            info!(max_points = n, percentile = DEFAULT_PERCENTILE, "Estimated sequence length");
            n
        }
    };
    let encoder = encoder_config(encoder, max_points)?;
    let model = StrokeTransformerConfig::for_encoder(&encoder, index.labels().len())
        .with_d_model(model.d_model)
        .with_n_heads(model.heads)
        .with_depth(model.depth)
        .with_d_ff(model.d_ff)
        .with_dropout(model.dropout);

    let outcome = Trainer::new(config)
        .fit::<TrainBackend>(&index, encoder, model, out, &DEVICE)
        .context("training failed")?;

    print!("{}", outcome.metrics.summary());
    println!("Saved best model to {}", outcome.bundle_dir.display());
    Ok(())
}

pub fn export(bundle: &Path, out: &Path, batch_size: usize) -> Result<()> {
    let (model, meta) = load_bundle::<InferBackend>(bundle, &DEVICE)
        .with_context(|| format!("loading bundle {}", bundle.display()))?;
    let manifest = export_inference(&model, &meta, out, batch_size)?;
    println!(
        "Exported {} -> {} ({:?} -> {:?})",
        bundle.display(),
        InferenceManifest::path_in(out).display(),
        manifest.input_shape,
        manifest.output_shape
    );
    Ok(())
}

pub fn predict(model: &Path, files: &[PathBuf], export: bool, top: usize, json: bool) -> Result<()> {
    let predictor = if export {
        RunePredictor::<InferBackend>::from_export(model, DEVICE)
    } else {
        RunePredictor::<InferBackend>::from_bundle(model, DEVICE)
    }
    .with_context(|| format!("loading model {}", model.display()))?;

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let prediction = predictor
            .predict_file(file)
            .with_context(|| format!("classifying {}", file.display()))?;

        if json {
            results.push(serde_json::json!({
                "file": file.display().to_string(),
                "prediction": prediction,
            }));
            continue;
        }

        println!(
            "{}\t{}\t{:.3}",
            file.display(),
            prediction.label,
            prediction.confidence
        );
        for (index, score) in prediction.ranked().into_iter().skip(1).take(top.saturating_sub(1)) {
            let name = predictor.labels().name(index).unwrap_or("?");
            println!("\t{name}\t{score:.3}");
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}

pub fn noise(dir: &Path, count: usize, seed: u64) -> Result<()> {
    let paths = write_noise_samples(dir, count, seed)?;
    println!("Wrote {} noise traces to {}", paths.len(), dir.display());
    Ok(())
}
