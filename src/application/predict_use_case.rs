// ============================================================
// Layer 2 - PredictUseCase
// ============================================================
// Labels an unlabelled file with the trained model:
//
//   Step 1: Load sentences            (Layer 4 - data)
//   Step 2: Clean the text            (Layer 4 - data)
//   Step 3: Load model + tokenizer    (Layer 5 - ml, Layer 6 - infra)
//   Step 4: Predict a level for each  (Layer 5 - ml)
//   Step 5: Write id,difficulty CSV   (this file)
//
// The output has the same shape as the training file's label
// columns, so it can be fed straight back into `score`.
// Ids are all-or-none: with no id column, sentences are numbered
// by their position in the input (0-based, skipped empty rows not
// counted). A file where only some rows carry an id is rejected,
// since a row number could collide with a real id.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::data::{loader::DatasetLoader, preprocessor::Preprocessor};
use crate::domain::{
    level::Level,
    sentence::Sentence,
    traits::LevelPredictor,
};
use crate::ml::{device::DeviceKind, inferencer::DeviceInferencer};

#[derive(Debug, Serialize)]
struct PredictionRow {
    id:         u64,
    difficulty: Level,
}

pub struct PredictUseCase {
    predictor: Box<dyn LevelPredictor>,
}

impl PredictUseCase {
    /// Load the trained model from `checkpoint_dir`.
    pub fn new(checkpoint_dir: &str, device: Option<DeviceKind>) -> Result<Self> {
        let inferencer = DeviceInferencer::load(checkpoint_dir, device)?;
        Ok(Self::with_predictor(Box::new(inferencer)))
    }

    /// Use any predictor, e.g. a fixed one in tests
    pub fn with_predictor(predictor: Box<dyn LevelPredictor>) -> Self {
        Self { predictor }
    }

    /// Predict every sentence in `input` and write the labels to `output`.
    /// Returns how many sentences were assigned to each level.
    pub fn execute(&self, input: &Path, output: &Path) -> Result<[usize; Level::COUNT]> {
        let sentences = DatasetLoader::new(input).load_unlabeled()?;
        let ids       = output_ids(&sentences)
            .with_context(|| format!("Cannot assign output ids for '{}'", input.display()))?;

        let preprocessor = Preprocessor::new();
        let texts = preprocessor.clean_all(sentences.iter().map(|s| s.text.as_str()));

        let levels = self.predictor.predict_levels(&texts)?;
        write_predictions(output, &ids, &levels)?;

        let histogram = level_histogram(&levels);
        for (level, count) in Level::ALL.iter().zip(histogram) {
            tracing::info!("  predicted {}: {}", level, count);
        }
        tracing::info!("Wrote {} predictions to '{}'", levels.len(), output.display());
        Ok(histogram)
    }
}

/// The file's own ids, or row numbers when the file has none.
fn output_ids(sentences: &[Sentence]) -> Result<Vec<u64>> {
    let with_id = sentences.iter().filter(|s| s.id.is_some()).count();

    if with_id == 0 {
        return Ok((0..sentences.len() as u64).collect());
    }
    if with_id < sentences.len() {
        bail!(
            "{} of {} sentences have an id; give every row an id or none",
            with_id,
            sentences.len()
        );
    }
    Ok(sentences.iter().filter_map(|s| s.id).collect())
}

fn write_predictions(output: &Path, ids: &[u64], levels: &[Level]) -> Result<()> {
    anyhow::ensure!(
        ids.len() == levels.len(),
        "Predictor returned {} levels for {} sentences",
        levels.len(),
        ids.len()
    );

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("Cannot create '{}'", output.display()))?;

    for (&id, &level) in ids.iter().zip(levels) {
        writer.serialize(PredictionRow { id, difficulty: level })?;
    }
    writer.flush()
        .with_context(|| format!("Cannot write '{}'", output.display()))?;
    Ok(())
}

fn level_histogram(levels: &[Level]) -> [usize; Level::COUNT] {
    let mut counts = [0usize; Level::COUNT];
    for level in levels {
        counts[level.rank()] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Predicts A1 for short sentences and C2 for long ones
    struct LengthPredictor;

    impl LevelPredictor for LengthPredictor {
        fn predict_levels(&self, sentences: &[String]) -> Result<Vec<Level>> {
            Ok(sentences
                .iter()
                .map(|s| if s.split_whitespace().count() < 4 { Level::A1 } else { Level::C2 })
                .collect())
        }
    }

    #[test]
    fn test_writes_id_difficulty_csv() {
        let dir    = TempDir::new().unwrap();
        let input  = dir.path().join("test.csv");
        let output = dir.path().join("out").join("predictions.csv");
        fs::write(
            &input,
            "id,sentence\n10,Bonjour.\n11,\"Nous partirons demain, si possible, vers Lyon.\"\n",
        )
        .unwrap();

        let histogram = PredictUseCase::with_predictor(Box::new(LengthPredictor))
            .execute(&input, &output)
            .unwrap();

        assert_eq!(histogram, [1, 0, 0, 0, 0, 1]);
        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written, "id,difficulty\n10,A1\n11,C2\n");
    }

    #[test]
    fn test_missing_ids_use_row_number() {
        let dir    = TempDir::new().unwrap();
        let input  = dir.path().join("test.jsonl");
        let output = dir.path().join("predictions.csv");
        fs::write(&input, "{\"sentence\": \"Oui.\"}\n{\"sentence\": \"Non.\"}\n").unwrap();

        PredictUseCase::with_predictor(Box::new(LengthPredictor))
            .execute(&input, &output)
            .unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written, "id,difficulty\n0,A1\n1,A1\n");
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let dir    = TempDir::new().unwrap();
        let result = write_predictions(&dir.path().join("p.csv"), &[0, 1], &[Level::B1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_ids_are_rejected() {
        let dir    = TempDir::new().unwrap();
        let input  = dir.path().join("test.jsonl");
        let output = dir.path().join("predictions.csv");
        // Row 0 has no id, and its row number would collide with the id 0 below
        fs::write(
            &input,
            "{\"sentence\": \"Oui.\"}\n{\"id\": 0, \"sentence\": \"Non.\"}\n",
        )
        .unwrap();

        let err = PredictUseCase::with_predictor(Box::new(LengthPredictor))
            .execute(&input, &output)
            .unwrap_err();
        assert!(format!("{err:#}").contains("1 of 2 sentences have an id"));
        assert!(!output.exists());
    }

    #[test]
    fn test_output_ids_all_or_none() {
        let none = [Sentence::new(None, "a"), Sentence::new(None, "b")];
        assert_eq!(output_ids(&none).unwrap(), vec![0, 1]);

        let all = [Sentence::new(Some(7), "a"), Sentence::new(Some(3), "b")];
        assert_eq!(output_ids(&all).unwrap(), vec![7, 3]);

        let mixed = [Sentence::new(Some(1), "a"), Sentence::new(None, "b")];
        assert!(output_ids(&mixed).is_err());
    }

    #[test]
    fn test_histogram_counts_each_level() {
        let counts = level_histogram(&[Level::B2, Level::B2, Level::C1]);
        assert_eq!(counts, [0, 0, 0, 2, 1, 0]);
    }
}
