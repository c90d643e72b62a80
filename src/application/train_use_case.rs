// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load labelled sentences   (Layer 4 - data)
//   Step 2: Clean the text            (Layer 4 - data)
//   Step 3: Report class balance      (Layer 4 - data)
//   Step 4: Build / load tokenizer    (Layer 6 - infra)
//   Step 5: Encode training samples   (Layer 4 - data)
//   Step 6: Seeded train/val split    (Layer 4 - data)
//   Step 7: Build datasets            (Layer 4 - data)
//   Step 8: Save config               (Layer 6 - infra)
//   Step 9: Run training loop         (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{encode_text, ClassificationSample, LevelDataset},
    label_encoder::LabelEncoder,
    loader::DatasetLoader,
    preprocessor::Preprocessor,
    splitter::split_train_val,
};
use crate::domain::{level::Level, traits::SentenceSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{embedding_size, SpecialTokens, TokenizerStore},
};
use crate::ml::{
    device::DeviceKind,
    trainer::{run_training, TrainingSummary},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved next to the checkpoints and
// reloaded by `predict` / `evaluate` to rebuild the same model.
// Missing fields in an older train_config.json fall back to Default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data_path:      String,
    pub checkpoint_dir: String,
    pub tokenizer_path: Option<String>,
    pub max_seq_len:    usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub d_model:        usize,
    pub num_heads:      usize,
    pub num_layers:     usize,
    pub d_ff:           usize,
    pub dropout:        f64,
    pub vocab_size:     usize,
    pub train_fraction: f64,
    pub seed:           u64,
    pub device:         DeviceKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:      "data/training_data.csv".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            tokenizer_path: None,
            max_seq_len:    128,
            batch_size:     16,
            epochs:         4,
            lr:             2e-4,
            d_model:        128,
            num_heads:      4,
            num_layers:     2,
            d_ff:           512,
            dropout:        0.1,
            vocab_size:     30522,
            train_fraction: 0.9,
            seed:           42,
            device:         DeviceKind::Cpu,
        }
    }
}

impl TrainConfig {
    /// Reject settings that would otherwise fail deep inside Burn
    /// (out-of-range position lookups, empty batches, bad head split).
    pub fn validate(&self) -> Result<()> {
        if self.max_seq_len < 2 {
            bail!("max_seq_len must be at least 2 to hold [CLS] and [SEP], got {}", self.max_seq_len);
        }
        if self.batch_size == 0 {
            bail!("batch_size must be positive");
        }
        if self.epochs == 0 {
            bail!("epochs must be positive");
        }
        if self.num_heads == 0 || self.d_model % self.num_heads != 0 {
            bail!(
                "d_model ({}) must be a positive multiple of num_heads ({})",
                self.d_model,
                self.num_heads
            );
        }
        if !(0.0..=1.0).contains(&self.train_fraction) {
            bail!("train_fraction must be within [0, 1], got {}", self.train_fraction);
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        // The embedding size is only known once the tokenizer exists,
        // so the run works on its own copy of the config
        let mut cfg = self.config.clone();
        cfg.validate()?;

        // ── Step 1: Load labelled sentences ───────────────────────────────────
        tracing::info!("Loading labelled sentences from '{}'", cfg.data_path);
        let labelled = DatasetLoader::new(&cfg.data_path).load_labeled()?;
        if labelled.is_empty() {
            bail!("No labelled sentences found in '{}'", cfg.data_path);
        }

        // ── Step 2: Clean / normalise text ────────────────────────────────────
        let preprocessor = Preprocessor::new();
        let texts: Vec<String> = labelled
            .iter()
            .map(|s| preprocessor.clean(&s.text))
            .collect();

        // ── Step 3: Class balance ─────────────────────────────────────────────
        let encoder = LabelEncoder::new();
        let counts  = encoder.class_counts(&labelled);
        tracing::info!("Class balance over {} levels:", encoder.num_classes());
        for (level, count) in Level::ALL.iter().zip(counts) {
            tracing::info!("  {}: {} sentences", level, count);
        }

        // ── Step 4: Build / load tokenizer ────────────────────────────────────
        let tok_store = TokenizerStore::new(&cfg.checkpoint_dir);
        let tokenizer = tok_store.prepare(cfg.tokenizer_path.as_deref(), &texts, cfg.vocab_size)?;
        let specials  = SpecialTokens::resolve(&tokenizer)?;

        cfg.vocab_size = embedding_size(&tokenizer);
        tracing::info!("Embedding table sized for {} token ids", cfg.vocab_size);

        // ── Step 5: Encode samples ────────────────────────────────────────────
        let samples = texts
            .iter()
            .zip(&labelled)
            .map(|(text, sentence)| {
                Ok(ClassificationSample {
                    token_ids: encode_text(&tokenizer, &specials, text, cfg.max_seq_len)?,
                    label:     encoder.encode(sentence.level),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::info!("Built {} training samples", samples.len());

        // ── Step 6: Seeded train / validation split ───────────────────────────
        let (train_samples, val_samples) = split_train_val(samples, cfg.train_fraction, cfg.seed);
        if train_samples.is_empty() {
            bail!(
                "train_fraction {} leaves no training samples out of {}",
                cfg.train_fraction,
                val_samples.len()
            );
        }
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        // ── Step 7: Build Burn datasets ───────────────────────────────────────
        let train_dataset = LevelDataset::new(train_samples);
        let val_dataset   = LevelDataset::new(val_samples);

        // ── Step 8: Save config for inference ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(&cfg)?;

        // ── Step 9: Run training loop (Layer 5) ───────────────────────────────
        run_training(&cfg, train_dataset, val_dataset, &ckpt_manager, specials.pad)
    }
}
