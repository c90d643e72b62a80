// ============================================================
// Layer 4 - Padding Batcher (the collator)
// ============================================================
// Implements Burn's Batcher trait to turn a Vec of tokenised
// sentences of DIFFERENT lengths into rectangular tensors.
//
// Dynamic padding:
//   Sentences are stored unpadded. Each batch is padded only up
//   to its own longest sentence, not to max_seq_len. Short
//   sentences (most of an A1 set) therefore cost far less
//   compute than if every row were padded to 128 tokens.
//
//   Input:  [101 5 6 102]            (4 tokens)
//           [101 7 102]              (3 tokens)
//   Output: token_ids    [[101 5 6 102], [101 7 102 PAD]]
//           padding_mask [[F F F F],     [F F F T]]
//
// The mask follows Burn's convention: true = padding, which is
// what MultiHeadAttention's `mask_pad` expects.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::{
    data::dataloader::batcher::Batcher,
    tensor::{backend::Backend, Bool, Int, Tensor, TensorData},
};

use crate::data::dataset::ClassificationSample;

// ─── Padding (pure) ───────────────────────────────────────────────────────────
/// Row-major padded ids and mask for a batch of sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedBatch {
    pub ids:        Vec<i64>,
    /// true = padding position
    pub mask:       Vec<bool>,
    pub batch_size: usize,
    pub seq_len:    usize,
}

/// Pad every sequence to the longest one with `pad_id`.
pub fn pad_sequences<S: AsRef<[u32]>>(seqs: &[S], pad_id: u32) -> PaddedBatch {
    let batch_size = seqs.len();
    let seq_len    = seqs.iter().map(|s| s.as_ref().len()).max().unwrap_or(0);

    let mut ids  = Vec::with_capacity(batch_size * seq_len);
    let mut mask = Vec::with_capacity(batch_size * seq_len);

    for seq in seqs {
        let seq = seq.as_ref();
        ids.extend(seq.iter().map(|&t| t as i64));
        mask.extend(std::iter::repeat(false).take(seq.len()));

        let pad = seq_len - seq.len();
        ids.extend(std::iter::repeat(pad_id as i64).take(pad));
        mask.extend(std::iter::repeat(true).take(pad));
    }

    PaddedBatch { ids, mask, batch_size, seq_len }
}

// ─── LevelBatch ───────────────────────────────────────────────────────────────
/// A batch ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct LevelBatch<B: Backend> {
    /// Token ids, shape [batch_size, seq_len]
    pub token_ids: Tensor<B, 2, Int>,

    /// true where the position is padding, shape [batch_size, seq_len]
    pub padding_mask: Tensor<B, 2, Bool>,

    /// Class index per sentence, shape [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── LevelBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device and the tokenizer's pad id.
#[derive(Clone, Debug)]
pub struct LevelBatcher<B: Backend> {
    pub device: B::Device,
    pub pad_id: u32,
}

impl<B: Backend> LevelBatcher<B> {
    pub fn new(device: B::Device, pad_id: u32) -> Self {
        Self { device, pad_id }
    }

    /// Pad and upload a batch of token sequences (no labels).
    /// Used directly by the inferencer.
    pub fn tokens(&self, seqs: &[Vec<u32>]) -> (Tensor<B, 2, Int>, Tensor<B, 2, Bool>) {
        let padded = pad_sequences(seqs, self.pad_id);
        let shape  = [padded.batch_size, padded.seq_len];

        let token_ids = Tensor::<B, 2, Int>::from_data(
            TensorData::new(padded.ids, shape),
            &self.device,
        );
        let padding_mask = Tensor::<B, 2, Bool>::from_data(
            TensorData::new(padded.mask, shape),
            &self.device,
        );
        (token_ids, padding_mask)
    }
}

impl<B: Backend> Batcher<B, ClassificationSample, LevelBatch<B>> for LevelBatcher<B> {
    fn batch(&self, items: Vec<ClassificationSample>, _device: &B::Device) -> LevelBatch<B> {
        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();
        let seqs: Vec<Vec<u32>> = items.into_iter().map(|s| s.token_ids).collect();

        let (token_ids, padding_mask) = self.tokens(&seqs);
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [seqs.len()]),
            &self.device,
        );

        LevelBatch { token_ids, padding_mask, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_pads_to_longest_in_batch() {
        let padded = pad_sequences(&[vec![101u32, 5, 6, 102], vec![101, 7, 102]], 0);
        assert_eq!(padded.seq_len, 4);
        assert_eq!(padded.ids, vec![101, 5, 6, 102, 101, 7, 102, 0]);
        assert_eq!(
            padded.mask,
            vec![false, false, false, false, false, false, false, true]
        );
    }

    #[test]
    fn test_uses_the_given_pad_id() {
        let padded = pad_sequences(&[vec![1u32], vec![1, 2, 3]], 9);
        assert_eq!(&padded.ids[..3], &[1, 9, 9]);
    }

    #[test]
    fn test_empty_batch() {
        let padded = pad_sequences::<Vec<u32>>(&[], 0);
        assert_eq!(padded.batch_size, 0);
        assert_eq!(padded.seq_len, 0);
        assert!(padded.ids.is_empty());
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = LevelBatcher::<TestBackend>::new(Default::default(), 0);
        let batch = batcher.batch(vec![
            ClassificationSample { token_ids: vec![101, 5, 102], label: 1 },
            ClassificationSample { token_ids: vec![101, 5, 6, 7, 102], label: 4 },
        ], &Default::default());

        assert_eq!(batch.token_ids.dims(), [2, 5]);
        assert_eq!(batch.padding_mask.dims(), [2, 5]);
        assert_eq!(batch.labels.dims(), [2]);

        let labels: Vec<i64> = batch.labels.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![1, 4]);
    }
}
