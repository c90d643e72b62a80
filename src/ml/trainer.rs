// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Per epoch:
//   1. Training pass   (Autodiff backend, dropout on)
//   2. Validation pass (inner backend via model.valid(), dropout off)
//      → mean loss + exact / coarse / fuzzy accuracy
//   3. Print a summary line, append metrics.csv, save checkpoint
//   4. If exact accuracy improved, mark this epoch as best
//
// Key Burn insights:
//   - model.valid() returns the model on B::InnerBackend, so the
//     validation batcher must build tensors for that backend too
//   - argmax(1) returns [batch, 1]; flatten to [batch] before
//     reading the indices back
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{anyhow, Result};
use burn::{
    backend::Autodiff,
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{LevelBatch, LevelBatcher},
    dataset::LevelDataset,
};
use crate::domain::evaluation::{evaluate_ranks, OrdinalAccuracy};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    device::{cpu_device, gpu_device, CpuBackend, DeviceKind, GpuBackend},
    model::{cross_entropy, LevelClassifier, LevelClassifierConfig},
};

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs_run: usize,
    pub best_epoch: Option<usize>,
    pub best:       Option<OrdinalAccuracy>,
}

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: LevelDataset,
    val_dataset:   LevelDataset,
    ckpt_manager:  &CheckpointManager,
    pad_id:        u32,
) -> Result<TrainingSummary> {
    match cfg.device {
        DeviceKind::Cpu => {
            tracing::info!("Training on CPU (NdArray)");
            train_loop::<Autodiff<CpuBackend>>(cfg, train_dataset, val_dataset, ckpt_manager, pad_id, cpu_device())
        }
        DeviceKind::Gpu => {
            let device = gpu_device();
            tracing::info!("Training on WGPU device: {:?}", device);
            train_loop::<Autodiff<GpuBackend>>(cfg, train_dataset, val_dataset, ckpt_manager, pad_id, device)
        }
    }
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: LevelDataset,
    val_dataset:   LevelDataset,
    ckpt_manager:  &CheckpointManager,
    pad_id:        u32,
    device:        B::Device,
) -> Result<TrainingSummary> {
    B::seed(&device, cfg.seed);
    ckpt_manager.reset_pointers()?;

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: LevelClassifier<B> = cfg.model_config().init(&device);
    tracing::info!("Model ready: {} layers, d_model={}", cfg.num_layers, cfg.d_model);

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let val_size = val_dataset.sample_count();

    let train_loader = DataLoaderBuilder::new(LevelBatcher::<B>::new(device.clone(), pad_id))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // Validation runs on the inner backend, no autodiff overhead
    let val_loader = DataLoaderBuilder::new(LevelBatcher::<B::InnerBackend>::new(device.clone(), pad_id))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
    let mut best_exact: Option<f64> = None;
    let mut summary = TrainingSummary { epochs_run: 0, best_epoch: None, best: None };

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.token_ids, batch.padding_mask, batch.labels);

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let (avg_val_loss, accuracy) = if val_size > 0 {
            validate(&model.valid(), val_loader.iter())?
        } else {
            (f64::NAN, None)
        };

        match accuracy {
            Some(acc) => println!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | exact={:.1}% | coarse={:.1}% | fuzzy={:.1}%",
                epoch, cfg.epochs, avg_train_loss, avg_val_loss,
                acc.exact * 100.0, acc.coarse * 100.0, acc.fuzzy * 100.0,
            ),
            None => println!(
                "Epoch {:>3}/{} | train_loss={:.4} | (no validation set)",
                epoch, cfg.epochs, avg_train_loss,
            ),
        }

        let row = EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, accuracy);
        metrics.log(&row)?;
        ckpt_manager.save_model(&model, epoch)?;

        if row.is_improvement(best_exact) {
            ckpt_manager.mark_best(epoch)?;
            best_exact         = accuracy.map(|a| a.exact);
            summary.best_epoch = Some(epoch);
            summary.best       = accuracy;
            tracing::info!("Epoch {} is the new best checkpoint", epoch);
        }
        summary.epochs_run = epoch;
    }

    tracing::info!("Training complete! Metrics in '{}'", metrics.csv_path().display());
    Ok(summary)
}

/// Mean loss and ordinal accuracy over every validation batch
fn validate<B: Backend>(
    model:   &LevelClassifier<B>,
    batches: impl Iterator<Item = LevelBatch<B>>,
) -> Result<(f64, Option<OrdinalAccuracy>)> {
    let mut loss_sum  = 0.0f64;
    let mut n_batches = 0usize;
    let mut predicted = Vec::new();
    let mut truth     = Vec::new();

    for batch in batches {
        let logits = model.forward(batch.token_ids, batch.padding_mask);

        loss_sum  += cross_entropy(logits.clone(), batch.labels.clone())
            .into_scalar()
            .elem::<f64>();
        n_batches += 1;

        predicted.extend(int_values(logits.argmax(1).flatten::<1>(0, 1))?);
        truth.extend(int_values(batch.labels)?);
    }

    if n_batches == 0 {
        return Ok((f64::NAN, None));
    }
    let accuracy = evaluate_ranks(&predicted, &truth)?;
    Ok((loss_sum / n_batches as f64, Some(accuracy)))
}

/// Read an Int tensor back as class indices
pub(crate) fn int_values<B: Backend>(t: Tensor<B, 1, Int>) -> Result<Vec<usize>> {
    let values: Vec<i64> = t
        .into_data()
        .convert::<i64>()
        .to_vec()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))?;
    Ok(values.into_iter().map(|v| v as usize).collect())
}

impl TrainConfig {
    /// Architecture described by these training arguments
    pub fn model_config(&self) -> LevelClassifierConfig {
        LevelClassifierConfig::for_levels(
            self.vocab_size, self.max_seq_len, self.d_model,
            self.num_heads, self.num_layers, self.d_ff, self.dropout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::ClassificationSample;
    use tempfile::TempDir;

    fn samples(n: usize) -> Vec<ClassificationSample> {
        (0..n)
            .map(|i| ClassificationSample {
                token_ids: vec![2, 5 + (i % 6) as u32, 3],
                label:     i % 6,
            })
            .collect()
    }

    fn tiny_config(dir: &TempDir) -> TrainConfig {
        TrainConfig {
            checkpoint_dir: dir.path().to_string_lossy().to_string(),
            vocab_size: 16,
            max_seq_len: 8,
            d_model: 8,
            num_heads: 2,
            num_layers: 1,
            d_ff: 16,
            batch_size: 4,
            epochs: 2,
            dropout: 0.0,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_training_writes_checkpoints_and_metrics() {
        let dir  = TempDir::new().unwrap();
        let cfg  = tiny_config(&dir);
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);

        let summary = run_training(
            &cfg,
            LevelDataset::new(samples(12)),
            LevelDataset::new(samples(6)),
            &ckpt,
            0,
        )
        .unwrap();

        assert_eq!(summary.epochs_run, 2);
        assert!(summary.best_epoch.is_some());
        let best = summary.best.unwrap();
        assert_eq!(best.total, 6);
        assert!(best.exact <= best.coarse && best.exact <= best.fuzzy);

        assert!(dir.path().join("model_epoch_2.mpk.gz").exists());
        let csv = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_training_without_validation_set() {
        let dir  = TempDir::new().unwrap();
        let cfg  = TrainConfig { epochs: 1, ..tiny_config(&dir) };
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);

        let summary = run_training(&cfg, LevelDataset::new(samples(4)), LevelDataset::new(vec![]), &ckpt, 0)
            .unwrap();

        assert_eq!(summary.best_epoch, None);
        // Inference falls back to the latest checkpoint
        assert_eq!(ckpt.checkpoint_epoch().unwrap(), 1);
    }

    #[test]
    fn test_rerun_without_validation_ignores_earlier_best() {
        let dir  = TempDir::new().unwrap();
        let cfg  = TrainConfig { epochs: 1, ..tiny_config(&dir) };
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);

        // Left behind by an earlier run with a validation set
        ckpt.mark_best(3).unwrap();

        run_training(&cfg, LevelDataset::new(samples(4)), LevelDataset::new(vec![]), &ckpt, 0)
            .unwrap();

        assert_eq!(ckpt.checkpoint_epoch().unwrap(), 1);
    }
}
