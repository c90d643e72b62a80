use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::infra::tokenizer_store::SpecialTokens;

/// One tokenised sentence and its class index.
/// Sequence format: [CLS] tokens [SEP], NOT padded (the batcher pads).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSample {
    pub token_ids: Vec<u32>,
    pub label:     usize,
}

/// Tokenise `text` as `[CLS] ... [SEP]`, truncated to `max_seq_len`.
///
/// Truncation drops tokens from the end of the sentence but always
/// keeps the closing [SEP].
pub fn encode_text(
    tokenizer:   &Tokenizer,
    specials:    &SpecialTokens,
    text:        &str,
    max_seq_len: usize,
) -> Result<Vec<u32>> {
    let enc = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
    Ok(frame(enc.get_ids(), specials, max_seq_len))
}

fn frame(ids: &[u32], specials: &SpecialTokens, max_seq_len: usize) -> Vec<u32> {
    // Room for [CLS] and [SEP]
    let body = ids.len().min(max_seq_len.saturating_sub(2));

    let mut out = Vec::with_capacity(body + 2);
    out.push(specials.cls);
    out.extend_from_slice(&ids[..body]);
    out.push(specials.sep);
    out
}

pub struct LevelDataset {
    samples: Vec<ClassificationSample>,
}

impl LevelDataset {
    pub fn new(samples: Vec<ClassificationSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<ClassificationSample> for LevelDataset {
    fn get(&self, index: usize) -> Option<ClassificationSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
