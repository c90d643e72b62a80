// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their configurable flags:
//
//   train     labelled file   → checkpoint directory
//   predict   unlabelled file → id,difficulty CSV
//   evaluate  labelled file   → exact / coarse / fuzzy report
//   score     two label files → exact / coarse / fuzzy report
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::ml::device::DeviceKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the level classifier on a labelled .csv / .jsonl file
    Train(TrainArgs),

    /// Predict a level for every sentence of an unlabelled file
    Predict(PredictArgs),

    /// Evaluate a trained checkpoint on a labelled file
    Evaluate(EvaluateArgs),

    /// Compare a predictions file with a reference file, no model needed
    Score(ScoreArgs),
}

/// Burn backend to run on
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DeviceArg {
    /// NdArray, always available
    Cpu,
    /// Wgpu (Vulkan / Metal / DX12)
    Gpu,
}

impl From<DeviceArg> for DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Cpu => DeviceKind::Cpu,
            DeviceArg::Gpu => DeviceKind::Gpu,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Labelled sentences with `sentence` and `difficulty` columns
    #[arg(long, default_value = "data/training_data.csv")]
    pub data: String,

    /// Directory to save model checkpoints and tokenizer
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Reuse an existing HuggingFace tokenizer.json instead of
    /// building a word-level vocabulary from the training data
    #[arg(long)]
    pub tokenizer: Option<String>,

    /// Maximum tokens per sentence, including [CLS] and [SEP]
    #[arg(long, default_value_t = 128)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 4)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 2e-4)]
    pub lr: f64,

    /// Hidden dimension of the encoder, divisible by num_heads
    #[arg(long, default_value_t = 128)]
    pub d_model: usize,

    #[arg(long, default_value_t = 4)]
    pub num_heads: usize,

    /// Number of stacked encoder layers
    #[arg(long, default_value_t = 2)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 512)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Upper bound on the vocabulary when building a tokenizer
    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,

    /// Share of the data used for training; the rest is validation
    #[arg(long, default_value_t = 0.9)]
    pub train_fraction: f64,

    /// Seed for the split, the shuffling and weight init
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:      a.data,
            checkpoint_dir: a.checkpoint_dir,
            tokenizer_path: a.tokenizer,
            max_seq_len:    a.max_seq_len,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            d_model:        a.d_model,
            num_heads:      a.num_heads,
            num_layers:     a.num_layers,
            d_ff:           a.d_ff,
            dropout:        a.dropout,
            vocab_size:     a.vocab_size,
            train_fraction: a.train_fraction,
            seed:           a.seed,
            device:         a.device.into(),
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Sentences to label (`sentence` column, optional `id`)
    #[arg(long)]
    pub input: PathBuf,

    /// Where to write the id,difficulty CSV
    #[arg(long, default_value = "predictions.csv")]
    pub output: PathBuf,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Override the backend recorded at training time
    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Labelled sentences to score the model on
    #[arg(long)]
    pub data: PathBuf,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Also write the metrics and confusion matrix as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Override the backend recorded at training time
    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,
}

/// All arguments for the `score` command
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// File with predicted levels in a `difficulty` column
    #[arg(long)]
    pub predictions: PathBuf,

    /// File with reference levels in a `difficulty` column
    #[arg(long)]
    pub truth: PathBuf,
}
