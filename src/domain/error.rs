// ============================================================
// Layer 3 - Evaluation Errors
// ============================================================
// The evaluator has exactly two ways to fail, and callers need
// to tell them apart (a bad label file vs. misaligned inputs),
// so these are a typed enum rather than anyhow strings.
//
// thiserror generates Display and std::error::Error, which lets
// the application layer propagate an EvalError with `?` into
// anyhow::Result without any manual conversion.
//
// Reference: Rust Book §9 (Error Handling)

use thiserror::Error;

/// Errors raised while parsing levels or scoring predictions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Sequences differ in length, or are empty.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A label is not one of A1, A2, B1, B2, C1, C2.
    #[error("invalid level '{0}': expected one of A1, A2, B1, B2, C1, C2")]
    InvalidLevel(String),
}

impl EvalError {
    /// Length mismatch between predicted and true sequences
    pub fn length_mismatch(predicted: usize, truth: usize) -> Self {
        Self::InvalidInput(format!(
            "predicted has {predicted} labels but truth has {truth}"
        ))
    }

    /// Nothing to evaluate
    pub fn empty() -> Self {
        Self::InvalidInput("cannot evaluate an empty prediction set".to_string())
    }
}
