// ============================================================
// Layer 2 - EvaluateUseCase
// ============================================================
// Measures a trained model against a labelled file:
//
//   Step 1: Load labelled sentences   (Layer 4 - data)
//   Step 2: Clean the text            (Layer 4 - data)
//   Step 3: Predict levels            (Layer 5 - ml)
//   Step 4: Exact / coarse / fuzzy    (Layer 3 - domain)
//           accuracy + confusion
//   Step 5: Optional JSON report      (this file)
//
// The predictor is a trait object so the workflow itself can be
// tested without a checkpoint on disk.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path};

use crate::data::{loader::DatasetLoader, preprocessor::Preprocessor};
use crate::domain::{
    evaluation::{evaluate, LevelConfusion, OrdinalAccuracy},
    level::Level,
    traits::{LevelPredictor, SentenceSource},
};
use crate::ml::{device::DeviceKind, inferencer::DeviceInferencer};

/// Everything `evaluate` reports about one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy:  OrdinalAccuracy,
    pub confusion: LevelConfusion,
}

impl EvaluationReport {
    /// Write the report as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write report to '{}'", path.display()))
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.accuracy)?;
        writeln!(f)?;
        writeln!(f, "Confusion matrix (rows = true level)")?;
        writeln!(f, "{}", self.confusion)?;
        writeln!(f)?;
        write!(f, "Recall per level:")?;
        for level in Level::ALL {
            match self.confusion.recall(level) {
                Some(r) => write!(f, "  {} {:.1}%", level, r * 100.0)?,
                None    => write!(f, "  {} -", level)?,
            }
        }
        Ok(())
    }
}

pub struct EvaluateUseCase {
    predictor: Box<dyn LevelPredictor>,
}

impl EvaluateUseCase {
    /// Load the trained model from `checkpoint_dir`.
    pub fn new(checkpoint_dir: &str, device: Option<DeviceKind>) -> Result<Self> {
        let inferencer = DeviceInferencer::load(checkpoint_dir, device)?;
        Ok(Self::with_predictor(Box::new(inferencer)))
    }

    pub fn with_predictor(predictor: Box<dyn LevelPredictor>) -> Self {
        Self { predictor }
    }

    /// Predict every sentence in `data_path` and score against its labels.
    pub fn execute(&self, data_path: &Path) -> Result<EvaluationReport> {
        let labelled = DatasetLoader::new(data_path).load_labeled()?;
        if labelled.is_empty() {
            bail!("No labelled sentences found in '{}'", data_path.display());
        }

        let preprocessor = Preprocessor::new();
        let texts = preprocessor.clean_all(labelled.iter().map(|s| s.text.as_str()));
        let truth: Vec<Level> = labelled.iter().map(|s| s.level).collect();

        tracing::info!("Predicting {} sentences", texts.len());
        let predicted = self.predictor.predict_levels(&texts)?;

        let accuracy  = evaluate(&predicted, &truth)?;
        let confusion = LevelConfusion::from_levels(&predicted, &truth)?;
        tracing::debug!(
            "exact={:.4} coarse={:.4} fuzzy={:.4}",
            accuracy.exact,
            accuracy.coarse,
            accuracy.fuzzy
        );

        Ok(EvaluationReport { accuracy, confusion })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::EvalError;
    use tempfile::TempDir;

    /// Always predicts the same level
    struct FixedPredictor(Level);

    impl LevelPredictor for FixedPredictor {
        fn predict_levels(&self, sentences: &[String]) -> Result<Vec<Level>> {
            Ok(vec![self.0; sentences.len()])
        }
    }

    /// Drops the last prediction, like a buggy model wrapper would
    struct ShortPredictor;

    impl LevelPredictor for ShortPredictor {
        fn predict_levels(&self, sentences: &[String]) -> Result<Vec<Level>> {
            Ok(vec![Level::A1; sentences.len().saturating_sub(1)])
        }
    }

    fn labelled_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("dev.csv");
        fs::write(
            &path,
            "sentence,difficulty\nUn.,A1\nDeux.,A2\nTrois.,B1\nQuatre.,C2\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_scores_a_constant_predictor() {
        let dir    = TempDir::new().unwrap();
        let report = EvaluateUseCase::with_predictor(Box::new(FixedPredictor(Level::A2)))
            .execute(&labelled_file(&dir))
            .unwrap();

        // truth A1 A2 B1 C2, always A2
        assert_eq!(report.accuracy.exact_hits, 1);
        assert_eq!(report.accuracy.coarse_hits, 2);
        assert_eq!(report.accuracy.fuzzy_hits, 3);
        assert_eq!(report.confusion.count(Level::C2, Level::A2), 1);
        assert_eq!(report.confusion.recall(Level::A2), Some(1.0));
        assert_eq!(report.confusion.recall(Level::B2), None);
    }

    #[test]
    fn test_misaligned_predictions_surface_invalid_input() {
        let dir = TempDir::new().unwrap();
        let err = EvaluateUseCase::with_predictor(Box::new(ShortPredictor))
            .execute(&labelled_file(&dir))
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<EvalError>(), Some(EvalError::InvalidInput(_))));
    }

    #[test]
    fn test_report_json_and_display() {
        let dir    = TempDir::new().unwrap();
        let report = EvaluateUseCase::with_predictor(Box::new(FixedPredictor(Level::B1)))
            .execute(&labelled_file(&dir))
            .unwrap();

        let path = dir.path().join("report.json");
        report.save_json(&path).unwrap();
        let back: EvaluationReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, report);

        let text = report.to_string();
        assert!(text.contains("exact accuracy"));
        assert!(text.contains("Recall per level"));
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "sentence,difficulty\n").unwrap();

        let result = EvaluateUseCase::with_predictor(Box::new(FixedPredictor(Level::A1))).execute(&path);
        assert!(result.is_err());
    }
}
