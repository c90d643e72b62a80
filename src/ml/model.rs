use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::{activation::gelu, backend::AutodiffBackend},
};

use crate::domain::level::Level;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally, do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct LevelClassifierConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
    #[config(default = 6)]
    pub num_classes: usize,
}

impl LevelClassifierConfig {
    /// Architecture for a six-level classifier
    pub fn for_levels(
        vocab_size:  usize,
        max_seq_len: usize,
        d_model:     usize,
        num_heads:   usize,
        num_layers:  usize,
        d_ff:        usize,
        dropout:     f64,
    ) -> Self {
        Self::new(vocab_size, max_seq_len, d_model, num_heads, num_layers, d_ff, dropout)
            .with_num_classes(Level::COUNT)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> LevelClassifier<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let head       = LinearConfig::new(self.d_model, self.num_classes).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        LevelClassifier {
            token_embedding, position_embedding, layers,
            final_norm, head, dropout,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// Post-norm block. Padding positions are masked out of attention.
    pub fn forward(&self, x: Tensor<B, 3>, mask_pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(mask_pad);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(gelu(self.ffn_linear1.forward(x.clone())));
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// Sentence encoder with a six-way level head.
#[derive(Module, Debug)]
pub struct LevelClassifier<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub head:               Linear<B>,
    pub dropout:            Dropout,
}

impl<B: Backend> LevelClassifier<B> {
    /// token_ids, padding_mask: [batch, seq_len] → logits: [batch, num_classes]
    pub fn forward(
        &self,
        token_ids:    Tensor<B, 2, Int>,
        padding_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = token_ids.dims();

        let tok_emb = self.token_embedding.forward(token_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, padding_mask.clone());
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]
        let [_, _, d_model] = x.dims();

        // Mean over real tokens only
        let keep = padding_mask
            .bool_not()
            .float()
            .unsqueeze_dim::<3>(2); // [batch, seq_len, 1]
        let summed = (x * keep.clone().expand([batch_size, seq_len, d_model])).sum_dim(1);
        let counts = keep.sum_dim(1).clamp_min(1.0); // [batch, 1, 1]
        let pooled = (summed / counts.expand([batch_size, 1, d_model]))
            .reshape([batch_size, d_model]);

        self.head.forward(self.dropout.forward(pooled))
    }

    pub fn forward_loss(
        &self,
        token_ids:    Tensor<B, 2, Int>,
        padding_mask: Tensor<B, 2, Bool>,
        labels:       Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(token_ids, padding_mask);
        let loss   = cross_entropy(logits.clone(), labels);
        (loss, logits)
    }
}

/// Mean cross-entropy of `logits` against class indices
pub fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, labels)
}
