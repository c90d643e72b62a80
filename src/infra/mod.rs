// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by both training and inference:
//
//   checkpoint.rs      - model weights (Burn CompactRecorder),
//                        latest/best epoch pointers, and the
//                        TrainConfig JSON needed to rebuild
//                        the model before loading weights
//
//   tokenizer_store.rs - reuses a pretrained tokenizer.json or
//                        builds a word-level one from the corpus,
//                        and keeps it next to the checkpoints so
//                        inference tokenises like training did
//
//   metrics.rs         - per-epoch loss and exact / coarse /
//                        fuzzy accuracy appended to a CSV file
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer reuse, building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
