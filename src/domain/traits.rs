// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The evaluator only needs labels. Where those labels come from
// is somebody else's business, so the two collaborators are
// expressed as traits:
//
//   SentenceSource  - something that yields labelled sentences
//                     (CSV file, JSONL file, an in-memory fixture)
//   LevelPredictor  - "given raw text, produce a predicted level"
//                     (the fine-tuned encoder, or a stub in tests)
//
// The application layer is written against these traits, so a
// different model or data format slots in without touching it.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::{level::Level, sentence::LabeledSentence};

// ─── SentenceSource ───────────────────────────────────────────────────────────
/// Any component that can load labelled sentences.
pub trait SentenceSource {
    /// Load every labelled sentence from this source.
    fn load_labeled(&self) -> Result<Vec<LabeledSentence>>;
}

// ─── LevelPredictor ───────────────────────────────────────────────────────────
/// Any component that maps raw sentences to predicted levels.
///
/// Implementations must return exactly one level per input, in
/// input order, so the output can be scored index by index.
pub trait LevelPredictor {
    fn predict_levels(&self, sentences: &[String]) -> Result<Vec<Level>>;
}
