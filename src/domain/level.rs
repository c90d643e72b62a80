// ============================================================
// Layer 3 - Level and Group Domain Types
// ============================================================
// A Level is one of the six CEFR proficiency tiers a sentence
// can be assigned:
//
//   rank:   0    1    2    3    4    5
//   level:  A1   A2   B1   B2   C1   C2
//   group:  |Beginner| |Intermed.| |Advanced|
//
// The ordering is part of the type: levels are a closed enum
// with an attached integer rank, so nobody has to rely on the
// lexical order of strings ("B1" < "B2" happens to work, but
// that is an accident, not a contract).
//
// A Group is the coarser three-band partition. Each group holds
// exactly two adjacent levels, so group membership is simply
// `rank / 2`. Computing it arithmetically keeps the "two per
// group" invariant visible in one line.
//
// Reference: Rust Book §6 (Enums and Pattern Matching)
//            CEFR - Common European Framework of Reference

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::EvalError;

/// One of the six ordered proficiency levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Level {
    /// Every level in rank order
    pub const ALL: [Level; 6] = [
        Level::A1,
        Level::A2,
        Level::B1,
        Level::B2,
        Level::C1,
        Level::C2,
    ];

    /// Number of distinct levels (the classifier's output size)
    pub const COUNT: usize = Self::ALL.len();

    /// Ordinal position, 0 for A1 up to 5 for C2
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Inverse of `rank()`. Returns None for anything above 5.
    pub fn from_rank(rank: usize) -> Option<Level> {
        Self::ALL.get(rank).copied()
    }

    /// The coarse band this level belongs to
    pub fn group(self) -> Group {
        Group::of_rank(self.rank())
    }

    /// Absolute rank difference between two levels
    pub fn distance(self, other: Level) -> usize {
        self.rank().abs_diff(other.rank())
    }

    /// Upper-case symbol, e.g. "B2"
    pub fn as_str(self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
            Level::C2 => "C2",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Parses "A1".."C2". Case and surrounding whitespace are ignored
/// because hand-edited label files are rarely consistent about either.
impl FromStr for Level {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = s.trim();
        Level::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(symbol))
            .ok_or_else(|| EvalError::InvalidLevel(symbol.to_string()))
    }
}

impl TryFrom<String> for Level {
    type Error = EvalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}

// ─── Group ────────────────────────────────────────────────────────────────────
/// Three coarse bands, two adjacent levels each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Group {
    /// A1, A2
    Beginner,
    /// B1, B2
    Intermediate,
    /// C1, C2
    Advanced,
}

impl Group {
    /// Group of a level rank. Ranks above 5 saturate to Advanced;
    /// callers validate ranks before they get here.
    pub fn of_rank(rank: usize) -> Group {
        match rank / 2 {
            0 => Group::Beginner,
            1 => Group::Intermediate,
            _ => Group::Advanced,
        }
    }
}
