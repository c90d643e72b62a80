// ============================================================
// Layer 3 - Ordinal Accuracy Evaluator
// ============================================================
// Scores predicted levels against true levels at three
// granularities:
//
//   exact  - predicted level == true level
//   coarse - predicted group == true group   (A / B / C band)
//   fuzzy  - |predicted rank - true rank| <= 1
//
// Worked example:
//   predicted: A1 A2 B1 B2 C1 C2
//   truth:     A2 B1 B1 B2 B2 C2
//   exact  = 3/6 (B1, B2, C2)
//   coarse = 4/6 (A1~A2, B1, B2, C2)
//   fuzzy  = 5/6 (all but C1 vs B2, which is 2 apart)
//
// Coarse and fuzzy are NOT nested. A2 vs B1 is one rank apart
// (fuzzy hit) but crosses a group boundary (coarse miss). Both
// are therefore counted independently in the same pass; neither
// is derived from the other. Exact hits are always hits for both.
//
// Empty input is rejected with InvalidInput rather than returning
// NaN or a sentinel: an accuracy over zero examples means the
// caller wired something up wrong, and it should hear about it.
//
// Reference: Rust Book §13 (Iterators)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{error::EvalError, level::Level};

/// Hit counts and accuracies for one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrdinalAccuracy {
    /// Fraction of exact level matches, in [0, 1]
    pub exact: f64,
    /// Fraction of matching groups, in [0, 1]
    pub coarse: f64,
    /// Fraction within one rank, in [0, 1]
    pub fuzzy: f64,

    pub exact_hits:  usize,
    pub coarse_hits: usize,
    pub fuzzy_hits:  usize,
    /// Number of evaluated pairs (always > 0)
    pub total: usize,
}

impl OrdinalAccuracy {
    fn from_counts(exact_hits: usize, coarse_hits: usize, fuzzy_hits: usize, total: usize) -> Self {
        let n = total as f64;
        Self {
            exact:  exact_hits as f64 / n,
            coarse: coarse_hits as f64 / n,
            fuzzy:  fuzzy_hits as f64 / n,
            exact_hits,
            coarse_hits,
            fuzzy_hits,
            total,
        }
    }
}

impl fmt::Display for OrdinalAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evaluated {} sentences", self.total)?;
        writeln!(
            f,
            "  exact accuracy   {:>6.2}%  ({}/{})",
            self.exact * 100.0,
            self.exact_hits,
            self.total
        )?;
        writeln!(
            f,
            "  coarse accuracy  {:>6.2}%  ({}/{})",
            self.coarse * 100.0,
            self.coarse_hits,
            self.total
        )?;
        write!(
            f,
            "  fuzzy accuracy   {:>6.2}%  ({}/{})",
            self.fuzzy * 100.0,
            self.fuzzy_hits,
            self.total
        )
    }
}

/// Score `predicted` against `truth`, position by position.
///
/// Fails with `InvalidInput` if the lengths differ or both are empty.
/// Never truncates to the shorter sequence.
pub fn evaluate(predicted: &[Level], truth: &[Level]) -> Result<OrdinalAccuracy, EvalError> {
    check_aligned(predicted.len(), truth.len())?;

    let mut exact_hits  = 0usize;
    let mut coarse_hits = 0usize;
    let mut fuzzy_hits  = 0usize;

    for (&p, &t) in predicted.iter().zip(truth) {
        if p == t {
            exact_hits += 1;
        }
        if p.group() == t.group() {
            coarse_hits += 1;
        }
        if p.distance(t) <= 1 {
            fuzzy_hits += 1;
        }
    }

    Ok(OrdinalAccuracy::from_counts(exact_hits, coarse_hits, fuzzy_hits, predicted.len()))
}

/// Like `evaluate`, for raw label strings ("A1".."C2").
///
/// Length is checked first; then every label is parsed and the first
/// unknown one raises `InvalidLevel`.
pub fn evaluate_labels<S: AsRef<str>>(
    predicted: &[S],
    truth:     &[S],
) -> Result<OrdinalAccuracy, EvalError> {
    check_aligned(predicted.len(), truth.len())?;
    let predicted = parse_all(predicted)?;
    let truth     = parse_all(truth)?;
    evaluate(&predicted, &truth)
}

/// Like `evaluate`, for class indices as produced by the classifier.
/// An index outside 0..=5 raises `InvalidLevel`.
pub fn evaluate_ranks(predicted: &[usize], truth: &[usize]) -> Result<OrdinalAccuracy, EvalError> {
    check_aligned(predicted.len(), truth.len())?;
    let predicted = levels_from_ranks(predicted)?;
    let truth     = levels_from_ranks(truth)?;
    evaluate(&predicted, &truth)
}

fn check_aligned(predicted: usize, truth: usize) -> Result<(), EvalError> {
    if predicted != truth {
        return Err(EvalError::length_mismatch(predicted, truth));
    }
    if predicted == 0 {
        return Err(EvalError::empty());
    }
    Ok(())
}

fn parse_all<S: AsRef<str>>(labels: &[S]) -> Result<Vec<Level>, EvalError> {
    labels.iter().map(|s| s.as_ref().parse()).collect()
}

fn levels_from_ranks(ranks: &[usize]) -> Result<Vec<Level>, EvalError> {
    ranks
        .iter()
        .map(|&r| Level::from_rank(r).ok_or_else(|| EvalError::InvalidLevel(r.to_string())))
        .collect()
}

// ─── Confusion Matrix ─────────────────────────────────────────────────────────
/// 6x6 count matrix, `counts[true rank][predicted rank]`.
///
/// Shows *where* the classifier goes wrong, which the three scalar
/// accuracies hide (e.g. B2 systematically read as C1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfusion {
    counts: [[usize; Level::COUNT]; Level::COUNT],
}

impl LevelConfusion {
    /// Build from aligned sequences; same validation as `evaluate`.
    pub fn from_levels(predicted: &[Level], truth: &[Level]) -> Result<Self, EvalError> {
        check_aligned(predicted.len(), truth.len())?;
        let mut counts = [[0usize; Level::COUNT]; Level::COUNT];
        for (&p, &t) in predicted.iter().zip(truth) {
            counts[t.rank()][p.rank()] += 1;
        }
        Ok(Self { counts })
    }

    /// How often `truth` was predicted as `predicted`
    pub fn count(&self, truth: Level, predicted: Level) -> usize {
        self.counts[truth.rank()][predicted.rank()]
    }

    /// Number of examples whose true level is `truth`
    pub fn support(&self, truth: Level) -> usize {
        self.counts[truth.rank()].iter().sum()
    }

    /// Fraction of `truth` examples predicted exactly, None if unsupported
    pub fn recall(&self, truth: Level) -> Option<f64> {
        let support = self.support(truth);
        (support > 0).then(|| self.count(truth, truth) as f64 / support as f64)
    }
}

impl fmt::Display for LevelConfusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "true\\pred")?;
        for level in Level::ALL {
            write!(f, "{:>6}", level)?;
        }
        for truth in Level::ALL {
            writeln!(f)?;
            write!(f, "{:>9}", truth)?;
            for predicted in Level::ALL {
                write!(f, "{:>6}", self.count(truth, predicted))?;
            }
        }
        Ok(())
    }
}
