//! End-to-end training on a small on-disk dataset.

use std::fs;
use std::path::Path;

use burn::backend::Autodiff;
use burn_ndarray::NdArray;
use rune_dataset::{CorruptSamplePolicy, DatasetIndex};
use rune_models::{CheckpointMeta, RunePredictor, StrokeTransformerConfig};
use rune_training::{LearningRateSchedule, OptimizerConfig, Trainer, TrainingConfig, TrainingError};
use rune_types::{EncoderConfig, RawStroke, RawTrace};

type TrainBackend = Autodiff<NdArray<f32>>;
type InferBackend = NdArray<f32>;

fn horizontal(i: usize) -> RawTrace {
    let dy = i as f64 * 0.1;
    RawTrace::new(vec![RawStroke::from_tuples(&[
        (0.0, dy, 0),
        (5.0, dy + 0.2, 16),
        (10.0, dy, 33),
        (15.0, dy + 0.1, 50),
    ])])
}

fn vee(i: usize) -> RawTrace {
    let dx = i as f64 * 0.1;
    RawTrace::new(vec![
        RawStroke::from_tuples(&[(dx, 0.0, 0), (dx + 2.0, 6.0, 20), (dx + 4.0, 12.0, 40)]),
        RawStroke::from_tuples(&[(dx + 4.0, 12.0, 60), (dx + 6.0, 6.0, 80), (dx + 8.0, 0.0, 100)]),
    ])
}

fn write_dataset(root: &Path, per_label: usize) {
    for (label, make) in [("Line", horizontal as fn(usize) -> RawTrace), ("Vee", vee)] {
        let dir = root.join(label);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..per_label {
            let json = make(i).to_json().unwrap();
            fs::write(dir.join(format!("{i:03}.json")), json).unwrap();
        }
    }
}

fn small_model(encoder: &EncoderConfig, classes: usize) -> StrokeTransformerConfig {
    StrokeTransformerConfig::for_encoder(encoder, classes)
        .with_d_model(8)
        .with_n_heads(2)
        .with_d_ff(16)
        .with_depth(1)
        .with_dropout(0.0)
}

fn quick_config(epochs: usize) -> TrainingConfig {
    TrainingConfig::new(epochs)
        .with_batch_size(4)
        .with_val_batch_size(3)
        .with_val_fraction(0.25)
        .with_lr_schedule(LearningRateSchedule::Constant)
        .with_patience(0)
}

#[test]
fn fit_writes_best_bundle() {
    let data = tempfile::tempdir().unwrap();
    let artifacts = tempfile::tempdir().unwrap();
    write_dataset(data.path(), 6);

    let index = DatasetIndex::scan(data.path(), CorruptSamplePolicy::Skip).unwrap();
    let encoder = EncoderConfig::new(8);
    let model = small_model(&encoder, index.labels().len());
    let trainer = Trainer::new(quick_config(2));

    let device = Default::default();
    let outcome = trainer
        .fit::<TrainBackend>(&index, encoder, model, artifacts.path(), &device)
        .unwrap();

    assert_eq!(outcome.train_samples, 9);
    assert_eq!(outcome.val_samples, 3);
    assert_eq!(outcome.metrics.epochs_completed(), 2);
    assert!(!outcome.metrics.early_stopped);
    assert!((1..=2).contains(&outcome.best.epoch));
    assert_eq!(
        outcome.metrics.best_val_accuracy,
        Some(outcome.best.val_accuracy)
    );
    assert!(artifacts.path().join("rune_seq.bin").exists());
    assert!(artifacts.path().join("rune_seq.metrics.json").exists());

    let saved = CheckpointMeta::load(artifacts.path()).unwrap();
    assert_eq!(saved.labels.names(), &["Line", "Vee"]);
    assert_eq!(saved.encoder, encoder);
    assert_eq!(saved.epoch, outcome.best.epoch);

    let predictor = RunePredictor::<InferBackend>::from_bundle(artifacts.path(), device).unwrap();
    let prediction = predictor.predict(&vee(2)).unwrap();
    assert!(prediction.label == "Line" || prediction.label == "Vee");
    assert_eq!(prediction.scores.len(), 2);
}

#[test]
fn fit_stops_early_when_accuracy_stalls() {
    let data = tempfile::tempdir().unwrap();
    let artifacts = tempfile::tempdir().unwrap();
    write_dataset(data.path(), 6);

    let index = DatasetIndex::scan(data.path(), CorruptSamplePolicy::Skip).unwrap();
    let encoder = EncoderConfig::new(8);
    let model = small_model(&encoder, index.labels().len());
    // A vanishing learning rate keeps predictions fixed, so the second
    // epoch cannot strictly beat the first.
    let config = quick_config(10)
        .with_optimizer(OptimizerConfig::adamw(1e-12).with_weight_decay(0.0))
        .with_patience(1);

    let device = Default::default();
    let outcome = Trainer::new(config)
        .fit::<TrainBackend>(&index, encoder, model, artifacts.path(), &device)
        .unwrap();

    assert_eq!(outcome.metrics.epochs_completed(), 2);
    assert!(outcome.metrics.early_stopped);
    assert_eq!(outcome.best.epoch, 1);
}

#[test]
fn fit_rejects_empty_validation_split() {
    let data = tempfile::tempdir().unwrap();
    let artifacts = tempfile::tempdir().unwrap();
    write_dataset(data.path(), 1);

    let index = DatasetIndex::scan(data.path(), CorruptSamplePolicy::Skip).unwrap();
    let encoder = EncoderConfig::new(8);
    let model = small_model(&encoder, index.labels().len());

    let err = Trainer::new(quick_config(1))
        .fit::<TrainBackend>(&index, encoder, model, artifacts.path(), &Default::default())
        .unwrap_err();
    assert!(matches!(err, TrainingError::InsufficientData(_)), "{err}");
}

#[test]
fn fit_rejects_model_that_does_not_match_labels() {
    let data = tempfile::tempdir().unwrap();
    let artifacts = tempfile::tempdir().unwrap();
    write_dataset(data.path(), 4);

    let index = DatasetIndex::scan(data.path(), CorruptSamplePolicy::Skip).unwrap();
    let encoder = EncoderConfig::new(8);
    let model = small_model(&encoder, 5);

    let err = Trainer::new(quick_config(1))
        .fit::<TrainBackend>(&index, encoder, model, artifacts.path(), &Default::default())
        .unwrap_err();
    assert!(matches!(err, TrainingError::Model(_)), "{err}");
}

#[test]
fn fit_rejects_odd_model_width() {
    let data = tempfile::tempdir().unwrap();
    let artifacts = tempfile::tempdir().unwrap();
    write_dataset(data.path(), 4);

    let index = DatasetIndex::scan(data.path(), CorruptSamplePolicy::Skip).unwrap();
    let encoder = EncoderConfig::new(8);
    let model = small_model(&encoder, 2).with_d_model(9).with_n_heads(3);

    let err = Trainer::new(quick_config(1))
        .fit::<TrainBackend>(&index, encoder, model, artifacts.path(), &Default::default())
        .unwrap_err();
    assert!(matches!(err, TrainingError::Model(_)), "{err}");
    assert!(!artifacts.path().join("rune_seq.meta.json").exists());
}
