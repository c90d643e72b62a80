// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder,
// plus the small JSON files inference needs to find them.
//
// What lives in the checkpoint directory:
//   model_epoch_1.mpk.gz   ← weights after epoch 1
//   model_epoch_2.mpk.gz   ← weights after epoch 2
//   ...
//   latest_epoch.json      ← number of the last saved epoch
//   best_epoch.json        ← epoch with the best validation exact accuracy
//   train_config.json      ← architecture + training arguments
//
// Why save the config separately?
//   To load weights we must first rebuild a model of the exact
//   same shape (d_model, num_layers, vocab size...). The config
//   is the recipe for that shape.
//
// Inference prefers best_epoch.json and falls back to
// latest_epoch.json, mirroring "load the best model at the end".
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::LevelClassifier;

const LATEST_FILE: &str = "latest_epoch.json";
const BEST_FILE:   &str = "best_epoch.json";
const CONFIG_FILE: &str = "train_config.json";

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Points at `dir`; nothing is created until something is saved.
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", self.dir.display()))
    }

    fn model_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    /// Save model weights for `epoch` and move the latest pointer to it.
    pub fn save_model<B: Backend>(&self, model: &LevelClassifier<B>, epoch: usize) -> Result<()> {
        self.ensure_dir()?;
        let path = self.model_path(epoch);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_pointer(LATEST_FILE, epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Remember `epoch` as the best one so far
    pub fn mark_best(&self, epoch: usize) -> Result<()> {
        self.ensure_dir()?;
        self.write_pointer(BEST_FILE, epoch)
    }

    /// Forget the epoch pointers of any earlier run in this directory.
    ///
    /// Called before the first epoch: a stale best_epoch.json would
    /// otherwise outrank this run's checkpoints at inference time.
    pub fn reset_pointers(&self) -> Result<()> {
        for file in [BEST_FILE, LATEST_FILE] {
            let path = self.dir.join(file);
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Cannot remove stale '{}'", path.display()))?;
                tracing::debug!("Removed stale pointer '{}'", path.display());
            }
        }
        Ok(())
    }

    /// Load weights into `model` from the best checkpoint, or the
    /// latest one if no best was recorded.
    pub fn load_model<B: Backend>(
        &self,
        model:  LevelClassifier<B>,
        device: &B::Device,
    ) -> Result<LevelClassifier<B>> {
        let epoch = self.checkpoint_epoch()?;
        let path  = self.model_path(epoch);

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Epoch inference will load: best if known, else latest
    pub fn checkpoint_epoch(&self) -> Result<usize> {
        match self.read_pointer(BEST_FILE)? {
            Some(epoch) => Ok(epoch),
            None => self.read_pointer(LATEST_FILE)?.with_context(|| {
                format!(
                    "No checkpoint in '{}'. Have you run 'train' first?",
                    self.dir.display()
                )
            }),
        }
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration saved by `save_config`.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))
    }

    fn write_pointer(&self, file: &str, epoch: usize) -> Result<()> {
        let path = self.dir.join(file);
        fs::write(&path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", path.display()))
    }

    fn read_pointer(&self, file: &str) -> Result<Option<usize>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(Some(serde_json::from_str::<usize>(&s)?))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::LevelClassifierConfig;
    use burn::backend::NdArray;
    use tempfile::TempDir;

    type TestBackend = NdArray;

    fn manager(dir: &TempDir) -> CheckpointManager {
        CheckpointManager::new(dir.path().to_string_lossy())
    }

    #[test]
    fn test_config_round_trip() {
        let dir  = TempDir::new().unwrap();
        let ckpt = manager(&dir);
        let cfg  = TrainConfig { epochs: 7, seed: 3, ..TrainConfig::default() };

        ckpt.save_config(&cfg).unwrap();
        let back = ckpt.load_config().unwrap();
        assert_eq!(back.epochs, 7);
        assert_eq!(back.seed, 3);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(manager(&dir).checkpoint_epoch().is_err());
        assert!(manager(&dir).load_config().is_err());
    }

    #[test]
    fn test_best_pointer_wins_over_latest() {
        let dir    = TempDir::new().unwrap();
        let ckpt   = manager(&dir);
        let device = Default::default();
        let model  = LevelClassifierConfig::for_levels(20, 8, 8, 2, 1, 8, 0.0)
            .init::<TestBackend>(&device);

        ckpt.save_model(&model, 1).unwrap();
        ckpt.save_model(&model, 2).unwrap();
        assert_eq!(ckpt.checkpoint_epoch().unwrap(), 2);

        ckpt.mark_best(1).unwrap();
        assert_eq!(ckpt.checkpoint_epoch().unwrap(), 1);
    }

    #[test]
    fn test_reset_pointers_forgets_earlier_run() {
        let dir    = TempDir::new().unwrap();
        let ckpt   = manager(&dir);
        let device = Default::default();
        let model  = LevelClassifierConfig::for_levels(20, 8, 8, 2, 1, 8, 0.0)
            .init::<TestBackend>(&device);

        ckpt.save_model(&model, 3).unwrap();
        ckpt.mark_best(3).unwrap();

        ckpt.reset_pointers().unwrap();
        assert!(ckpt.checkpoint_epoch().is_err());

        // Nothing to remove is fine too
        ckpt.reset_pointers().unwrap();
    }

    #[test]
    fn test_saved_weights_load_back() {
        let dir    = TempDir::new().unwrap();
        let ckpt   = manager(&dir);
        let device = Default::default();
        let cfg    = LevelClassifierConfig::for_levels(20, 8, 8, 2, 1, 8, 0.0);

        let trained = cfg.init::<TestBackend>(&device);
        ckpt.save_model(&trained, 1).unwrap();

        let fresh  = cfg.init::<TestBackend>(&device);
        let loaded = ckpt.load_model(fresh, &device).unwrap();

        let a: Vec<f32> = trained.head.weight.val().into_data().convert::<f32>().to_vec().unwrap();
        let b: Vec<f32> = loaded.head.weight.val().into_data().convert::<f32>().to_vec().unwrap();
        // CompactRecorder stores half precision
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-2);
        }
    }
}
