// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between a dataset file on disk and tensor batches
// the model can consume.
//
//   train.csv / test.csv
//       │
//       ▼
//   DatasetLoader     → reads rows, validates level symbols
//       │
//       ▼
//   Preprocessor      → normalises whitespace and apostrophes
//       │
//       ▼
//   LabelEncoder      → level ↔ class index (index = rank)
//       │
//       ▼
//   encode_text       → [CLS] tokens [SEP], truncated
//       │
//       ▼
//   split_train_val   → seeded shuffle, train / validation
//       │
//       ▼
//   LevelDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   LevelBatcher      → pads each batch to its longest sentence
//
// Each module does exactly one step and is tested on its own.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads labelled / unlabelled sentences from .csv or .jsonl
pub mod loader;

/// Normalises one sentence before tokenisation
pub mod preprocessor;

/// Fixed mapping between levels and class indices
pub mod label_encoder;

/// Tokenised samples and Burn's Dataset implementation
pub mod dataset;

/// Dynamic padding collator implementing Burn's Batcher trait
pub mod batcher;

/// Seeded shuffle and train/validation split
pub mod splitter;
