// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Records per-epoch training metrics to a CSV file so learning
// curves can be plotted after the run.
//
// Metrics recorded per epoch:
//   - epoch:       the epoch number (1, 2, 3, ...)
//   - train_loss:  mean cross-entropy over training batches
//   - val_loss:    mean cross-entropy over validation batches
//   - exact_acc:   validation sentences at the right level
//   - coarse_acc:  ... in the right A / B / C band
//   - fuzzy_acc:   ... at most one level off
//
// Output file: {checkpoint_dir}/metrics.csv
//
//   epoch,train_loss,val_loss,exact_acc,coarse_acc,fuzzy_acc
//   1,1.702311,1.655020,0.312500,0.604167,0.687500
//   2,1.421870,1.498812,0.395833,0.666667,0.770833
//
// With no validation set the validation columns are NaN.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

use crate::domain::evaluation::OrdinalAccuracy;

const HEADER: &str = "epoch,train_loss,val_loss,exact_acc,coarse_acc,fuzzy_acc";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
    /// None when there was nothing to validate on
    pub accuracy:   Option<OrdinalAccuracy>,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        val_loss:   f64,
        accuracy:   Option<OrdinalAccuracy>,
    ) -> Self {
        Self { epoch, train_loss, val_loss, accuracy }
    }

    /// True if this epoch's exact accuracy beats `best`
    /// (ties keep the earlier epoch)
    pub fn is_improvement(&self, best: Option<f64>) -> bool {
        match (self.accuracy, best) {
            (Some(acc), Some(best)) => acc.exact > best,
            (Some(_), None)         => true,
            (None, _)               => false,
        }
    }

    fn csv_row(&self) -> String {
        let (exact, coarse, fuzzy) = self
            .accuracy
            .map_or((f64::NAN, f64::NAN, f64::NAN), |a| (a.exact, a.coarse, a.fuzzy));
        format!(
            "{},{:.6},{:.6},{:.6},{:.6},{:.6}",
            self.epoch, self.train_loss, self.val_loss, exact, coarse, fuzzy,
        )
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs append to the same log.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{}", m.csv_row())?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{evaluation::evaluate, level::Level};
    use tempfile::TempDir;

    fn accuracy() -> OrdinalAccuracy {
        evaluate(&[Level::A1, Level::B1], &[Level::A1, Level::B2]).unwrap()
    }

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 1.5, 1.4, Some(accuracy())); // exact = 0.5
        assert!(m.is_improvement(None));
        assert!(m.is_improvement(Some(0.4)));
        assert!(!m.is_improvement(Some(0.5)));

        let no_val = EpochMetrics::new(1, 1.0, f64::NAN, None);
        assert!(!no_val.is_improvement(None));
    }

    #[test]
    fn test_rows_are_appended_under_one_header() {
        let dir = TempDir::new().unwrap();
        let logger = MetricsLogger::new(dir.path().to_string_lossy()).unwrap();
        logger.log(&EpochMetrics::new(1, 1.7, 1.6, Some(accuracy()))).unwrap();

        // Reopening must not write a second header
        let logger = MetricsLogger::new(dir.path().to_string_lossy()).unwrap();
        logger.log(&EpochMetrics::new(2, 1.2, f64::NAN, None)).unwrap();

        let content = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "1,1.700000,1.600000,0.500000,1.000000,1.000000");
        assert!(lines[2].starts_with("2,1.200000,NaN"));
        assert_eq!(lines.len(), 3);
    }
}
