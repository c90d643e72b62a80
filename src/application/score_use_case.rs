// ============================================================
// Layer 2 - ScoreUseCase
// ============================================================
// Scores an existing predictions file against a reference file,
// no model involved. Both files only need a `difficulty` column
// (.csv or .jsonl); rows are matched by position, not by id.
//
// Labels go to the evaluator as raw strings so that an unknown
// level in either file is reported as InvalidLevel, and differing
// row counts as InvalidInput.

use anyhow::{Context, Result};
use std::path::Path;

use crate::data::loader::DatasetLoader;
use crate::domain::evaluation::{evaluate_labels, OrdinalAccuracy};

pub struct ScoreUseCase;

impl ScoreUseCase {
    pub fn execute(predictions: &Path, truth: &Path) -> Result<OrdinalAccuracy> {
        let predicted = DatasetLoader::new(predictions).load_label_column()?;
        let reference = DatasetLoader::new(truth).load_label_column()?;
        tracing::info!(
            "Scoring {} predictions against {} reference labels",
            predicted.len(),
            reference.len()
        );

        let accuracy = evaluate_labels(&predicted, &reference).with_context(|| {
            format!(
                "Cannot score '{}' against '{}'",
                predictions.display(),
                truth.display()
            )
        })?;
        Ok(accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::EvalError;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_scores_worked_example_from_files() {
        let dir   = TempDir::new().unwrap();
        let preds = write(&dir, "p.csv", "id,difficulty\n0,A1\n1,A2\n2,B1\n3,B2\n4,C1\n5,C2\n");
        let truth = write(
            &dir,
            "t.jsonl",
            "{\"sentence\": \"a\", \"difficulty\": \"A2\"}\n\
             {\"sentence\": \"b\", \"difficulty\": \"B1\"}\n\
             {\"sentence\": \"c\", \"difficulty\": \"B1\"}\n\
             {\"sentence\": \"d\", \"difficulty\": \"B2\"}\n\
             {\"sentence\": \"e\", \"difficulty\": \"B2\"}\n\
             {\"sentence\": \"f\", \"difficulty\": \"C2\"}\n",
        );

        let acc = ScoreUseCase::execute(&preds, &truth).unwrap();
        assert_eq!((acc.exact_hits, acc.coarse_hits, acc.fuzzy_hits), (3, 4, 5));
        assert_eq!(acc.total, 6);
    }

    #[test]
    fn test_unknown_label_is_invalid_level() {
        let dir   = TempDir::new().unwrap();
        let preds = write(&dir, "p.csv", "difficulty\nA1\nD1\n");
        let truth = write(&dir, "t.csv", "difficulty\nA1\nA2\n");

        let err = ScoreUseCase::execute(&preds, &truth).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EvalError>(),
            Some(&EvalError::InvalidLevel("D1".to_string()))
        );
    }

    #[test]
    fn test_row_count_mismatch_is_invalid_input() {
        let dir   = TempDir::new().unwrap();
        let preds = write(&dir, "p.csv", "difficulty\nA1\n");
        let truth = write(&dir, "t.csv", "difficulty\nA1\nA2\n");

        let err = ScoreUseCase::execute(&preds, &truth).unwrap_err();
        assert!(matches!(err.downcast_ref::<EvalError>(), Some(EvalError::InvalidInput(_))));
    }
}
