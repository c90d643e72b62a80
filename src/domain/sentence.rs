// ============================================================
// Layer 3 - Sentence Domain Types
// ============================================================
// A Sentence is one row of text to classify. A LabeledSentence
// additionally carries its reference level, as found in the
// training and held-out test sets.
//
// The id is optional: public datasets usually ship one, but a
// plain list of sentences should work too. Where an id is
// needed for output, the row number stands in.

use serde::{Deserialize, Serialize};

use crate::domain::level::Level;

/// A sentence awaiting a level prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub id:   Option<u64>,
    pub text: String,
}

impl Sentence {
    pub fn new(id: Option<u64>, text: impl Into<String>) -> Self {
        Self { id, text: text.into() }
    }
}

/// A sentence with its reference level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSentence {
    pub id:    Option<u64>,
    pub text:  String,
    pub level: Level,
}

impl LabeledSentence {
    pub fn new(id: Option<u64>, text: impl Into<String>, level: Level) -> Self {
        Self { id, text: text.into(), level }
    }
}
