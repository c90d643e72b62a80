// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn-specific modelling code. The
// data layer's batcher and the infra checkpoint manager touch
// Burn types too, but the model, the optimiser and backend
// selection live only here.
//
// What's in this layer:
//
//   model.rs      - The sentence encoder classifier
//                   • Token + positional embeddings
//                   • Multi-head self-attention with padding mask
//                   • Feed-forward networks (GELU activation)
//                   • Residual connections + layer normalisation
//                   • Masked mean pooling
//                   • Six-way level head
//
//   trainer.rs    - The training loop: forward, loss, backward,
//                   Adam step, validation with exact / coarse /
//                   fuzzy accuracy, checkpoint per epoch
//
//   inferencer.rs - Loads the best checkpoint and maps raw
//                   sentences to predicted levels
//
//   device.rs     - CPU (NdArray) or GPU (Wgpu) backend choice
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Encoder classifier architecture
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Inference engine, loads checkpoint and predicts levels
pub mod inferencer;

/// Backend selection
pub mod device;
