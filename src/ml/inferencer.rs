// ============================================================
// Layer 5 - Inferencer
// ============================================================
use anyhow::{anyhow, Result};
use burn::{prelude::*, tensor::activation::softmax};
use tokenizers::Tokenizer;

use crate::data::{batcher::LevelBatcher, dataset::encode_text, label_encoder::LabelEncoder};
use crate::domain::{level::Level, traits::LevelPredictor};
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{SpecialTokens, TokenizerStore},
};
use crate::ml::{
    device::{cpu_device, gpu_device, CpuBackend, DeviceKind, GpuBackend},
    model::LevelClassifier,
};

/// A predicted level and the softmax probability the model gave it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub level:      Level,
    pub confidence: f32,
}

pub struct Inferencer<B: Backend> {
    model:       LevelClassifier<B>,
    tokenizer:   Tokenizer,
    specials:    SpecialTokens,
    batcher:     LevelBatcher<B>,
    max_seq_len: usize,
    batch_size:  usize,
}

impl<B: Backend> Inferencer<B> {
    /// Rebuild the model from the saved config and load the best weights.
    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        tokenizer:    Tokenizer,
        device:       B::Device,
    ) -> Result<Self> {
        let cfg = ckpt_manager.load_config()?;
        let model: LevelClassifier<B> = cfg.model_config().init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");
        Self::new(model, tokenizer, device, cfg.max_seq_len, cfg.batch_size)
    }

    pub fn new(
        model:       LevelClassifier<B>,
        tokenizer:   Tokenizer,
        device:      B::Device,
        max_seq_len: usize,
        batch_size:  usize,
    ) -> Result<Self> {
        let specials = SpecialTokens::resolve(&tokenizer)?;
        let batcher  = LevelBatcher::new(device, specials.pad);
        Ok(Self {
            model, tokenizer, specials, batcher, max_seq_len,
            batch_size: batch_size.max(1),
        })
    }

    /// One prediction per input sentence, in input order.
    pub fn predict(&self, sentences: &[String]) -> Result<Vec<Prediction>> {
        let mut predictions = Vec::with_capacity(sentences.len());

        for chunk in sentences.chunks(self.batch_size) {
            let seqs = chunk
                .iter()
                .map(|s| encode_text(&self.tokenizer, &self.specials, s, self.max_seq_len))
                .collect::<Result<Vec<_>>>()?;

            let (token_ids, padding_mask) = self.batcher.tokens(&seqs);
            let logits = self.model.forward(token_ids, padding_mask);
            let [_, num_classes] = logits.dims();

            let probs: Vec<f32> = softmax(logits, 1)
                .into_data()
                .convert::<f32>()
                .to_vec()
                .map_err(|e| anyhow!("Cannot read model output: {e:?}"))?;

            for row in probs.chunks(num_classes) {
                predictions.push(best_class(row)?);
            }
        }

        tracing::debug!("Predicted levels for {} sentences", predictions.len());
        Ok(predictions)
    }
}

impl<B: Backend> LevelPredictor for Inferencer<B> {
    fn predict_levels(&self, sentences: &[String]) -> Result<Vec<Level>> {
        Ok(self.predict(sentences)?.into_iter().map(|p| p.level).collect())
    }
}

// ─── Backend dispatch ─────────────────────────────────────────────────────────
// The backend is a type parameter, but which one to use is only
// known at runtime (saved config or --device), so commands hold
// one of these instead of a generic Inferencer.
pub enum DeviceInferencer {
    Cpu(Inferencer<CpuBackend>),
    Gpu(Inferencer<GpuBackend>),
}

impl DeviceInferencer {
    /// Load the tokenizer and best checkpoint from `checkpoint_dir`.
    /// `device` overrides the backend recorded at training time.
    pub fn load(checkpoint_dir: &str, device: Option<DeviceKind>) -> Result<Self> {
        let ckpt_manager = CheckpointManager::new(checkpoint_dir);
        let cfg          = ckpt_manager.load_config()?;
        let tokenizer    = TokenizerStore::new(checkpoint_dir).load()?;

        match device.unwrap_or(cfg.device) {
            DeviceKind::Cpu => {
                tracing::info!("Running inference on CPU (NdArray)");
                Inferencer::<CpuBackend>::from_checkpoint(&ckpt_manager, tokenizer, cpu_device()).map(Self::Cpu)
            }
            DeviceKind::Gpu => {
                let device = gpu_device();
                tracing::info!("Running inference on WGPU device: {:?}", device);
                Inferencer::<GpuBackend>::from_checkpoint(&ckpt_manager, tokenizer, device).map(Self::Gpu)
            }
        }
    }

    pub fn predict(&self, sentences: &[String]) -> Result<Vec<Prediction>> {
        match self {
            Self::Cpu(inner) => inner.predict(sentences),
            Self::Gpu(inner) => inner.predict(sentences),
        }
    }
}

impl LevelPredictor for DeviceInferencer {
    fn predict_levels(&self, sentences: &[String]) -> Result<Vec<Level>> {
        Ok(self.predict(sentences)?.into_iter().map(|p| p.level).collect())
    }
}

/// Arg-max of one probability row
fn best_class(probs: &[f32]) -> Result<Prediction> {
    let (class, &confidence) = probs
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .ok_or_else(|| anyhow!("Model produced an empty probability row"))?;
    let level = LabelEncoder::new().decode(class)?;
    Ok(Prediction { level, confidence })
}
