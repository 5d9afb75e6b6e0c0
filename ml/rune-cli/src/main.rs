//! rune - train and run the rune stroke classifier.
//!
//! Usage:
//!   rune index dataset                     # Scan a dataset and print a summary
//!   rune estimate dataset                  # Suggest a sequence length
//!   rune encode capture.json -n 100        # Print the encoded tensor
//!   rune train dataset -o artifacts        # Train and save the best bundle
//!   rune export artifacts -o export        # Write an inference export
//!   rune predict artifacts a.json b.json   # Classify trace files
//!   rune noise dataset/Unknown -c 200      # Generate noise samples
//!
//! Set `RUST_LOG` to override the log filter.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Rune stroke classifier toolkit
#[derive(Parser)]
#[command(name = "rune")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logs)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

/// Encoder settings shared by commands that turn traces into tensors.
#[derive(Args, Debug, Clone)]
struct EncoderArgs {
    /// Sequence length; `train` estimates it from the dataset when omitted
    #[arg(short = 'n', long)]
    max_points: Option<usize>,

    /// Use the deprecated 3-channel encoder
    #[arg(long)]
    legacy: bool,

    /// Clamp negative time deltas to zero
    #[arg(long)]
    clamp_negative_dt: bool,
}

/// Model hyperparameters.
#[derive(Args, Debug, Clone)]
struct ModelArgs {
    /// Embedding width
    #[arg(long, default_value_t = 96)]
    d_model: usize,

    /// Attention heads per layer
    #[arg(long, default_value_t = 3)]
    heads: usize,

    /// Encoder layers
    #[arg(long, default_value_t = 2)]
    depth: usize,

    /// Feed-forward width
    #[arg(long, default_value_t = 256)]
    d_ff: usize,

    /// Dropout probability
    #[arg(long, default_value_t = 0.1)]
    dropout: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a dataset directory and summarize it
    Index {
        /// Dataset root with one directory per label
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Fail on the first unreadable sample instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Suggest `max_points` from the dataset's point counts
    Estimate {
        /// Dataset root with one directory per label
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Share of samples that should fit without resampling
        #[arg(short, long, default_value_t = rune_features::DEFAULT_PERCENTILE)]
        percentile: f64,
    },

    /// Encode one trace file and print the rows
    Encode {
        /// Trace file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        encoder: EncoderArgs,
    },

    /// Train a classifier and save the best checkpoint bundle
    Train {
        /// Dataset root with one directory per label
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Directory for the checkpoint bundle
        #[arg(short, long, default_value = "artifacts")]
        out: PathBuf,

        /// Training config JSON; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Training batch size
        #[arg(long)]
        batch_size: Option<usize>,

        /// Validation fraction
        #[arg(long)]
        val_fraction: Option<f32>,

        /// Early stopping patience (0 disables)
        #[arg(long)]
        patience: Option<usize>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Split each label separately
        #[arg(long)]
        stratified: bool,

        /// Save weights as JSON instead of binary
        #[arg(long)]
        json_weights: bool,

        /// Fail on the first unreadable sample instead of skipping it
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        encoder: EncoderArgs,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Write an inference export from a checkpoint bundle
    Export {
        /// Checkpoint bundle directory
        #[arg(value_name = "BUNDLE")]
        bundle: PathBuf,

        /// Export directory
        #[arg(short, long, default_value = "export")]
        out: PathBuf,

        /// Batch size recorded in the manifest
        #[arg(long, default_value_t = 1)]
        batch_size: usize,
    },

    /// Classify trace files
    Predict {
        /// Checkpoint bundle or export directory
        #[arg(value_name = "MODEL")]
        model: PathBuf,

        /// Trace files
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Treat MODEL as an inference export
        #[arg(long)]
        export: bool,

        /// Number of ranked labels to print per file
        #[arg(long, default_value_t = 1)]
        top: usize,
    },

    /// Generate synthetic noise traces
    Noise {
        /// Output directory, usually `<ROOT>/Unknown`
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Number of traces
        #[arg(short, long, default_value_t = 100)]
        count: usize,

        /// Random seed; use a new seed to add samples to an existing directory
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json = cli.json;

    match cli.command {
        Commands::Index { root, strict } => commands::index(&root, strict, json),
        Commands::Estimate { root, percentile } => commands::estimate(&root, percentile, json),
        Commands::Encode { file, encoder } => commands::encode(&file, &encoder, json),
        Commands::Train {
            root,
            out,
            config,
            epochs,
            batch_size,
            val_fraction,
            patience,
            seed,
            stratified,
            json_weights,
            strict,
            encoder,
            model,
        } => {
            let overrides = commands::TrainOverrides {
                epochs,
                batch_size,
                val_fraction,
                patience,
                seed,
                stratified,
                json_weights,
            };
            commands::train(
                &root,
                &out,
                config.as_deref(),
                &overrides,
                strict,
                &encoder,
                &model,
            )
        }
        Commands::Export {
            bundle,
            out,
            batch_size,
        } => commands::export(&bundle, &out, batch_size),
        Commands::Predict {
            model,
            files,
            export,
            top,
        } => commands::predict(&model, &files, export, top, json),
        Commands::Noise { dir, count, seed } => commands::noise(&dir, count, seed),
    }
}
