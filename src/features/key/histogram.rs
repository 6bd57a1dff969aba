//! Key vote histogram
//!
//! Every voting frame adds its weight to the bin of its best-matching key.
//! The track key is the first maximum of the 24 bins under ascending ordinal
//! order (C major .. B major, then C minor .. B minor).

use serde::{Deserialize, Serialize};

use crate::analysis::result::Key;
use crate::config::VoteWeighting;
use crate::error::AnalysisError;

/// Per-track vote accumulator, one bin per key ordinal
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KeyHistogram {
    counts: [f64; 24],
    votes: usize,
}

impl KeyHistogram {
    /// Empty histogram
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to the bin of `key`
    pub fn vote(&mut self, key: Key, weight: f64) {
        self.counts[key.index()] += weight;
        self.votes += 1;
    }

    /// Bin values indexed by key ordinal
    pub fn counts(&self) -> &[f64; 24] {
        &self.counts
    }

    /// Number of votes cast
    pub fn votes(&self) -> usize {
        self.votes
    }

    /// Sum of all vote weights
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// True when no frame has voted
    pub fn is_empty(&self) -> bool {
        self.votes == 0
    }

    /// Key with the largest accumulated weight
    ///
    /// Ties resolve to the lower ordinal.
    ///
    /// # Errors
    ///
    /// `DegenerateInput` when no frame has voted.
    pub fn decide(&self) -> Result<Key, AnalysisError> {
        if self.is_empty() {
            return Err(AnalysisError::DegenerateInput(
                "No frame cast a key vote".to_string(),
            ));
        }
        Ok(Key::from_index(argmax(&self.counts)))
    }

    /// Margin of the winning bin over the runner-up, relative to the total
    ///
    /// 0.0 for an empty histogram; 1.0 when all weight is in one bin.
    pub fn confidence(&self) -> f32 {
        self.confidence_for(Key::from_index(argmax(&self.counts)))
    }

    /// Margin of `key`'s bin over the strongest other bin, relative to the total
    ///
    /// Used when the reported key is not the histogram winner (bigram
    /// decisions). 0.0 when `key` does not lead the vote.
    pub fn confidence_for(&self, key: Key) -> f32 {
        let total = self.total();
        if self.is_empty() || total <= 0.0 {
            return 0.0;
        }
        let chosen = key.index();
        let runner_up = self
            .counts
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != chosen)
            .map(|(_, &c)| c)
            .fold(f64::NEG_INFINITY, f64::max);
        ((self.counts[chosen] - runner_up) / total).clamp(0.0, 1.0) as f32
    }
}

/// Weight of a frame's vote
///
/// Returns `None` when the frame must not vote: under `LogEnergy`, frames whose
/// `ln(energy)` is non-finite or non-positive (energy <= 1).
pub fn vote_weight(weighting: VoteWeighting, short_term_energy: f32) -> Option<f64> {
    match weighting {
        VoteWeighting::Unit => Some(1.0),
        VoteWeighting::LogEnergy => {
            let w = (short_term_energy as f64).ln();
            (w.is_finite() && w > 0.0).then_some(w)
        }
    }
}

/// Index of the first maximum
pub(crate) fn argmax(values: &[f64; 24]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_majority() {
        let mut hist = KeyHistogram::new();
        hist.vote(Key::Minor(9), 1.0);
        hist.vote(Key::Minor(9), 1.0);
        hist.vote(Key::Major(0), 1.0);
        assert_eq!(hist.decide().unwrap(), Key::Minor(9));
        assert_eq!(hist.votes(), 3);
        assert!((hist.total() - 3.0).abs() < 1e-12);
        assert!((hist.confidence() - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_for_other_key() {
        let mut hist = KeyHistogram::new();
        hist.vote(Key::Minor(9), 3.0);
        hist.vote(Key::Major(0), 1.0);
        assert!((hist.confidence_for(Key::Minor(9)) - 0.5).abs() < 1e-6);
        assert_eq!(hist.confidence_for(Key::Minor(9)), hist.confidence());
        // A key that trails the vote has no margin
        assert_eq!(hist.confidence_for(Key::Major(0)), 0.0);
        assert_eq!(hist.confidence_for(Key::Major(5)), 0.0);
        assert_eq!(KeyHistogram::new().confidence_for(Key::Major(0)), 0.0);
    }

    #[test]
    fn test_tie_goes_to_lower_ordinal() {
        let mut hist = KeyHistogram::new();
        hist.vote(Key::Minor(0), 2.0);
        hist.vote(Key::Major(7), 2.0);
        assert_eq!(hist.decide().unwrap(), Key::Major(7));
        assert_eq!(hist.confidence(), 0.0);
    }

    #[test]
    fn test_empty_histogram() {
        let hist = KeyHistogram::new();
        assert!(hist.is_empty());
        assert!(matches!(hist.decide(), Err(AnalysisError::DegenerateInput(_))));
        assert_eq!(hist.confidence(), 0.0);
    }

    #[test]
    fn test_single_key_full_confidence() {
        let mut hist = KeyHistogram::new();
        hist.vote(Key::Major(4), 1.5);
        assert_eq!(hist.counts()[4], 1.5);
        assert_eq!(hist.confidence(), 1.0);
    }

    #[test]
    fn test_vote_weight() {
        assert_eq!(vote_weight(VoteWeighting::Unit, 0.0), Some(1.0));
        let w = vote_weight(VoteWeighting::LogEnergy, std::f32::consts::E.powi(2)).unwrap();
        assert!((w - 2.0).abs() < 1e-5);
        assert_eq!(vote_weight(VoteWeighting::LogEnergy, 0.0), None);
        assert_eq!(vote_weight(VoteWeighting::LogEnergy, 0.5), None);
        assert_eq!(vote_weight(VoteWeighting::LogEnergy, 1.0), None);
        assert_eq!(vote_weight(VoteWeighting::LogEnergy, f32::NAN), None);
    }
}
