// ============================================================
// Layer 4 - Label Encoder
// ============================================================
// The classifier outputs a class index; the dataset speaks in
// level symbols. This maps between the two.
//
// Classes are assigned in rank order (A1 -> 0 ... C2 -> 5), so
// the class index IS the rank. That keeps the ordinal structure
// intact all the way through the model: a prediction of class 3
// for a true class 4 is "one level off", which is exactly what
// the fuzzy accuracy needs to see.
//
// A fitted encoder (sorting whatever labels appear in the data)
// would give the same mapping when all six levels are present,
// but would silently shift indices when one is missing. The
// vocabulary is therefore fixed.

use crate::domain::{error::EvalError, level::Level, sentence::LabeledSentence};

#[derive(Debug, Clone, Copy, Default)]
pub struct LabelEncoder;

impl LabelEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn num_classes(&self) -> usize {
        Level::COUNT
    }

    pub fn encode(&self, level: Level) -> usize {
        level.rank()
    }

    pub fn decode(&self, class: usize) -> Result<Level, EvalError> {
        Level::from_rank(class).ok_or_else(|| EvalError::InvalidLevel(class.to_string()))
    }

    /// Number of sentences per class, in class order
    pub fn class_counts(&self, sentences: &[LabeledSentence]) -> [usize; Level::COUNT] {
        let mut counts = [0usize; Level::COUNT];
        for s in sentences {
            counts[self.encode(s.level)] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_follow_rank() {
        let enc = LabelEncoder::new();
        for level in Level::ALL {
            assert_eq!(enc.decode(enc.encode(level)), Ok(level));
        }
        assert_eq!(enc.encode(Level::B2), 3);
        assert_eq!(enc.num_classes(), 6);
    }

    #[test]
    fn test_decode_out_of_range() {
        assert!(matches!(
            LabelEncoder::new().decode(6),
            Err(EvalError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_class_counts() {
        let data = vec![
            LabeledSentence::new(None, "a", Level::A1),
            LabeledSentence::new(None, "b", Level::C2),
            LabeledSentence::new(None, "c", Level::C2),
        ];
        assert_eq!(LabelEncoder::new().class_counts(&data), [1, 0, 0, 0, 0, 2]);
    }
}
