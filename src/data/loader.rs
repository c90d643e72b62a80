// ============================================================
// Layer 4 - Dataset Loader
// ============================================================
// Loads sentences (and, for training/evaluation, their levels)
// from disk. Two formats are accepted, picked by extension:
//
//   .csv    header row, comma separated, quoted as needed
//             id,sentence,difficulty
//             0,"Les coûts kilométriques réels peuvent diverger sensiblement",C1
//
//   .jsonl  one JSON object per line, same field names
//             {"id": 0, "sentence": "Bonjour !", "difficulty": "A1"}
//
// `id` is optional in both. `difficulty` is required only when
// loading labelled data; for prediction it is ignored.
//
// Sentences routinely contain commas and quotes, so CSV goes
// through the `csv` crate rather than a naive split(',').
//
// Bad rows:
//   - an empty sentence is skipped with a warning
//   - an unknown level fails the whole load, naming the row,
//     because silently dropping labels would skew evaluation
//
// Reference: csv crate documentation (serde deserialisation)
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Deserialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::{
    level::Level,
    sentence::{LabeledSentence, Sentence},
    traits::SentenceSource,
};

/// One row as it appears on disk, before validation
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    id: Option<u64>,
    sentence: String,
    #[serde(default)]
    difficulty: Option<String>,
}

/// A row from a file where only the label matters (predictions or
/// a reference answer sheet)
#[derive(Debug, Deserialize)]
struct LabelRow {
    #[serde(default)]
    difficulty: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    JsonLines,
}

/// Loads sentences from a .csv or .jsonl file.
pub struct DatasetLoader {
    path: PathBuf,
}

impl DatasetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load every non-empty sentence, ignoring any labels.
    pub fn load_unlabeled(&self) -> Result<Vec<Sentence>> {
        let rows = self.read_rows()?;
        let sentences: Vec<Sentence> = rows
            .into_iter()
            .filter_map(|(_, row)| {
                let text = row.sentence.trim().to_string();
                (!text.is_empty()).then(|| Sentence::new(row.id, text))
            })
            .collect();

        tracing::info!("Loaded {} sentences from '{}'", sentences.len(), self.path.display());
        Ok(sentences)
    }

    /// Read the `difficulty` column as raw strings, in file order.
    ///
    /// Labels are NOT parsed here: scoring wants an unknown symbol to
    /// surface as InvalidLevel from the evaluator, not as a load error.
    pub fn load_label_column(&self) -> Result<Vec<String>> {
        let rows: Vec<(usize, LabelRow)> = self.read_any()?;
        rows.into_iter()
            .map(|(line, row)| {
                row.difficulty.with_context(|| {
                    format!("Row {} of '{}' has no 'difficulty' value", line, self.path.display())
                })
            })
            .collect()
    }

    fn read_any<T: DeserializeOwned>(&self) -> Result<Vec<(usize, T)>> {
        if !self.path.exists() {
            bail!("Dataset file '{}' does not exist", self.path.display());
        }
        match detect_format(&self.path)? {
            Format::Csv       => read_csv(&self.path),
            Format::JsonLines => read_jsonl(&self.path),
        }
    }

    fn read_rows(&self) -> Result<Vec<(usize, RawRow)>> {
        let rows: Vec<(usize, RawRow)> = self.read_any()?;

        let skipped = rows.iter().filter(|(_, r)| r.sentence.trim().is_empty()).count();
        if skipped > 0 {
            tracing::warn!("Skipping {} rows with an empty sentence", skipped);
        }
        Ok(rows)
    }
}

impl SentenceSource for DatasetLoader {
    fn load_labeled(&self) -> Result<Vec<LabeledSentence>> {
        let rows = self.read_rows()?;
        let mut sentences = Vec::with_capacity(rows.len());

        for (line, row) in rows {
            let text = row.sentence.trim();
            if text.is_empty() {
                continue;
            }

            let label = row.difficulty.as_deref().with_context(|| {
                format!(
                    "Row {} of '{}' has no 'difficulty' column value",
                    line,
                    self.path.display()
                )
            })?;
            let level: Level = label.parse().with_context(|| {
                format!("Row {} of '{}'", line, self.path.display())
            })?;

            sentences.push(LabeledSentence::new(row.id, text, level));
        }

        tracing::info!(
            "Loaded {} labelled sentences from '{}'",
            sentences.len(),
            self.path.display()
        );
        Ok(sentences)
    }
}

fn detect_format(path: &Path) -> Result<Format> {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("csv")            => Ok(Format::Csv),
        Some("jsonl" | "json") => Ok(Format::JsonLines),
        _ => bail!(
            "Unsupported dataset format for '{}': expected .csv or .jsonl",
            path.display()
        ),
    }
}

/// Rows are numbered from 1 for the first data line (header excluded).
fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<(usize, T)>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;

    let mut rows = Vec::new();
    for (i, record) in reader.deserialize::<T>().enumerate() {
        let row = record.with_context(|| format!("Malformed CSV row {} in '{}'", i + 1, path.display()))?;
        rows.push((i + 1, row));
    }
    Ok(rows)
}

/// Rows are numbered by physical line; blank lines are ignored.
fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<(usize, T)>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let mut rows = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row: T = serde_json::from_str(line)
            .with_context(|| format!("Malformed JSON on line {} of '{}'", i + 1, path.display()))?;
        rows.push((i + 1, row));
    }
    Ok(rows)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::EvalError;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_loads_labelled_csv_with_quoted_commas() {
        let dir  = TempDir::new().unwrap();
        let path = write(
            &dir,
            "train.csv",
            "id,sentence,difficulty\n\
             0,\"Bonjour, je m'appelle Marie.\",A1\n\
             1,Le chat dort.,a2\n",
        );

        let rows = DatasetLoader::new(path).load_labeled().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "Bonjour, je m'appelle Marie.");
        assert_eq!(rows[0].level, Level::A1);
        assert_eq!(rows[1].id, Some(1));
        assert_eq!(rows[1].level, Level::A2);
    }

    #[test]
    fn test_id_column_is_optional() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "t.csv", "sentence,difficulty\nIl pleut.,A1\n");

        let rows = DatasetLoader::new(path).load_labeled().unwrap();
        assert_eq!(rows[0].id, None);
    }

    #[test]
    fn test_unknown_level_names_the_row() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "t.csv", "sentence,difficulty\nUn.,A1\nDeux.,D1\n");

        let err = DatasetLoader::new(path).load_labeled().unwrap_err();
        assert!(err.to_string().contains("Row 2"));
        let cause = err.downcast_ref::<EvalError>().unwrap();
        assert_eq!(cause, &EvalError::InvalidLevel("D1".to_string()));
    }

    #[test]
    fn test_empty_sentences_are_skipped() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "t.csv", "sentence,difficulty\n\"  \",A1\nOui.,B1\n");

        let rows = DatasetLoader::new(path).load_labeled().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].level, Level::B1);
    }

    #[test]
    fn test_unlabelled_load_ignores_difficulty() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "test.csv", "id,sentence\n7,Merci beaucoup.\n");

        let rows = DatasetLoader::new(path).load_unlabeled().unwrap();
        assert_eq!(rows, vec![Sentence::new(Some(7), "Merci beaucoup.")]);
    }

    #[test]
    fn test_loads_jsonl() {
        let dir  = TempDir::new().unwrap();
        let path = write(
            &dir,
            "t.jsonl",
            "{\"id\": 3, \"sentence\": \"Salut\", \"difficulty\": \"C2\"}\n\n\
             {\"sentence\": \"Encore\", \"difficulty\": \"B2\"}\n",
        );

        let rows = DatasetLoader::new(path).load_labeled().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].level, Level::C2);
        assert_eq!(rows[1].id, None);
    }

    #[test]
    fn test_label_column_keeps_raw_strings() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "preds.csv", "id,difficulty\n0,A1\n1,D1\n");

        let labels = DatasetLoader::new(path).load_label_column().unwrap();
        assert_eq!(labels, vec!["A1", "D1"]);
    }

    #[test]
    fn test_label_column_requires_difficulty() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "preds.csv", "id,sentence\n0,Oui\n");
        assert!(DatasetLoader::new(path).load_label_column().is_err());
    }

    #[test]
    fn test_missing_file_and_unknown_extension_fail() {
        let dir = TempDir::new().unwrap();
        assert!(DatasetLoader::new(dir.path().join("nope.csv")).load_labeled().is_err());

        let path = write(&dir, "t.txt", "whatever");
        assert!(DatasetLoader::new(path).load_unlabeled().is_err());
    }
}
