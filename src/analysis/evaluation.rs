//! Evaluation of predicted keys against reference labels
//!
//! Predictions are classified into the usual key-estimation error classes,
//! checked in this order (first match wins):
//!
//! 1. **Exact**: same tonic and mode
//! 2. **Parallel**: same tonic, different mode (C vs Cm)
//! 3. **Relative**: shared key signature (Am predicted for C, or C for Am)
//! 4. **Fifth**: same mode, tonic a fifth above or below (G or F for C)
//! 5. **Unrelated**: anything else

use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::Key;

/// Pitch-class distance from `target` up to `predicted`
///
/// `(pc(predicted) - pc(target) + 12) mod 12`; with `with_offset`, 12 is added
/// when the modes differ, giving a 0-23 distance that also encodes mode.
pub fn distance(predicted: Key, target: Key, with_offset: bool) -> usize {
    let d = (predicted.pitch_class() + 12 - target.pitch_class()) as usize % 12;
    if with_offset && predicted.is_minor() != target.is_minor() {
        d + 12
    } else {
        d
    }
}

/// Same tonic, different mode
pub fn is_parallel(predicted: Key, target: Key) -> bool {
    distance(predicted, target, false) == 0 && predicted != target
}

/// Relative major/minor of each other
pub fn is_relative(predicted: Key, target: Key) -> bool {
    let d = distance(predicted, target, false);
    match (predicted.is_minor(), target.is_minor()) {
        (true, false) => d == 9,
        (false, true) => d == 3,
        _ => false,
    }
}

/// Same mode, tonics a fifth apart
pub fn is_out_by_a_fifth(predicted: Key, target: Key) -> bool {
    let d = distance(predicted, target, false);
    predicted.is_minor() == target.is_minor() && (d == 5 || d == 7)
}

/// Error class of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchCategory {
    /// Correct key
    Exact,
    /// Correct tonic, wrong mode
    Parallel,
    /// Relative major/minor
    Relative,
    /// Tonic off by a fifth, same mode
    Fifth,
    /// Any other error
    Unrelated,
}

impl MatchCategory {
    /// Short lowercase label
    pub fn label(&self) -> &'static str {
        match self {
            MatchCategory::Exact => "exact",
            MatchCategory::Parallel => "parallel",
            MatchCategory::Relative => "relative",
            MatchCategory::Fifth => "fifth",
            MatchCategory::Unrelated => "unrelated",
        }
    }
}

/// Classify a prediction
///
/// # Example
///
/// ```
/// use tonal_dsp::analysis::evaluation::{classify, MatchCategory};
/// use tonal_dsp::Key;
///
/// assert_eq!(classify(Key::Minor(0), Key::Major(0)), MatchCategory::Parallel);
/// assert_eq!(classify(Key::Minor(9), Key::Major(0)), MatchCategory::Relative);
/// assert_eq!(classify(Key::Major(7), Key::Major(0)), MatchCategory::Fifth);
/// ```
pub fn classify(predicted: Key, target: Key) -> MatchCategory {
    if predicted == target {
        MatchCategory::Exact
    } else if is_parallel(predicted, target) {
        MatchCategory::Parallel
    } else if is_relative(predicted, target) {
        MatchCategory::Relative
    } else if is_out_by_a_fifth(predicted, target) {
        MatchCategory::Fifth
    } else {
        MatchCategory::Unrelated
    }
}

/// Running tally of prediction outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationCounters {
    /// Exact matches
    pub exact: usize,
    /// Parallel-key errors
    pub parallel: usize,
    /// Relative-key errors
    pub relative: usize,
    /// Fifth errors
    pub fifth: usize,
    /// Unrelated errors
    pub unrelated: usize,
    /// Predictions per pitch-class distance (0-11)
    pub distances: [usize; 12],
}

impl EvaluationCounters {
    /// Empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prediction and return its category
    pub fn record(&mut self, predicted: Key, target: Key) -> MatchCategory {
        let category = classify(predicted, target);
        match category {
            MatchCategory::Exact => self.exact += 1,
            MatchCategory::Parallel => self.parallel += 1,
            MatchCategory::Relative => self.relative += 1,
            MatchCategory::Fifth => self.fifth += 1,
            MatchCategory::Unrelated => self.unrelated += 1,
        }
        self.distances[distance(predicted, target, false)] += 1;
        category
    }

    /// Number of recorded predictions
    pub fn total(&self) -> usize {
        self.exact + self.parallel + self.relative + self.fifth + self.unrelated
    }

    /// Count for one category
    pub fn count(&self, category: MatchCategory) -> usize {
        match category {
            MatchCategory::Exact => self.exact,
            MatchCategory::Parallel => self.parallel,
            MatchCategory::Relative => self.relative,
            MatchCategory::Fifth => self.fifth,
            MatchCategory::Unrelated => self.unrelated,
        }
    }

    /// Fraction of exact matches (0.0 when empty)
    pub fn accuracy(&self) -> f32 {
        match self.total() {
            0 => 0.0,
            n => self.exact as f32 / n as f32,
        }
    }

    /// Add another tally into this one
    pub fn merge(&mut self, other: &EvaluationCounters) {
        self.exact += other.exact;
        self.parallel += other.parallel;
        self.relative += other.relative;
        self.fifth += other.fifth;
        self.unrelated += other.unrelated;
        for (d, o) in self.distances.iter_mut().zip(&other.distances) {
            *d += o;
        }
    }
}

impl fmt::Display for EvaluationCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Exact     : {}", self.exact)?;
        writeln!(f, "Fifth     : {}", self.fifth)?;
        writeln!(f, "Parallel  : {}", self.parallel)?;
        writeln!(f, "Relative  : {}", self.relative)?;
        writeln!(f, "Unrelated : {}", self.unrelated)?;
        writeln!(f, "Total     : {}", self.total())?;
        writeln!(f, "Accuracy  : {:.1}%", self.accuracy() * 100.0)?;
        write!(f, "Distances : {:?}", self.distances)
    }
}
