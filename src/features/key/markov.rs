//! Bigram key scoring
//!
//! Alternative to histogram voting that looks at the order of per-frame
//! matches. The sequence of frame keys is treated as a chain of harmonic
//! functions: for every candidate tonic the sequence is transposed so the
//! candidate sits at ordinal 0, and each change of frame key is
//! scored with the log probability of that scale-degree transition in
//! Bach chorales. Staying on the candidate key earns a small bonus.
//!
//! Transposition is a rotation of the 24 ordinals, so candidates from 12 up
//! read major observations through the minor table and vice versa.
//!
//! The 24x24 transition matrix places the 7x7 major table on the diatonic
//! degrees of C major (ordinals 0, 2, 4, 5, 7, 9, 11) and the minor table on
//! those of C minor (12, 14, 15, 17, 19, 20, 22). Every other transition,
//! and every zero entry, gets `NO_TRANSITION`.

use crate::analysis::result::Key;
use crate::error::AnalysisError;

/// Probability assigned to transitions absent from the tables
pub const NO_TRANSITION: f64 = 0.001;

/// Log bonus for each frame whose key equals the candidate
pub const TONIC_BONUS: f64 = 0.000_009_999_95; // ln(1.00001)

/// Degree-to-degree transition probabilities in major keys
pub const BACH_MAJOR: [[f64; 7]; 7] = [
    [0.00, 0.15, 0.01, 0.28, 0.41, 0.09, 0.06],
    [0.01, 0.00, 0.00, 0.00, 0.71, 0.01, 0.25],
    [0.03, 0.03, 0.00, 0.52, 0.06, 0.32, 0.02],
    [0.22, 0.13, 0.00, 0.00, 0.39, 0.02, 0.23],
    [0.82, 0.01, 0.00, 0.07, 0.00, 0.09, 0.00],
    [0.15, 0.29, 0.05, 0.11, 0.32, 0.00, 0.09],
    [0.91, 0.00, 0.01, 0.02, 0.04, 0.03, 0.00],
];

/// Degree-to-degree transition probabilities in minor keys
pub const BACH_MINOR: [[f64; 7]; 7] = [
    [0.00, 0.18, 0.01, 0.20, 0.41, 0.09, 0.12],
    [0.01, 0.00, 0.03, 0.00, 0.89, 0.00, 0.07],
    [0.06, 0.06, 0.00, 0.25, 0.19, 0.31, 0.13],
    [0.22, 0.14, 0.00, 0.00, 0.48, 0.00, 0.15],
    [0.80, 0.00, 0.02, 0.06, 0.00, 0.10, 0.02],
    [0.03, 0.54, 0.03, 0.14, 0.19, 0.00, 0.08],
    [0.81, 0.00, 0.01, 0.03, 0.15, 0.00, 0.00],
];

const MAJOR_DEGREES: [usize; 7] = [0, 2, 4, 5, 7, 9, 11];
const MINOR_DEGREES: [usize; 7] = [12, 14, 15, 17, 19, 20, 22];

/// Log transition matrix over key ordinals
#[derive(Debug, Clone, PartialEq)]
pub struct BigramModel {
    log_probs: [[f64; 24]; 24],
}

impl BigramModel {
    /// Model built from the Bach chorale tables
    pub fn bach() -> Self {
        let mut probs = [[NO_TRANSITION; 24]; 24];
        for (table, degrees) in [(&BACH_MAJOR, &MAJOR_DEGREES), (&BACH_MINOR, &MINOR_DEGREES)] {
            for (i, &from) in degrees.iter().enumerate() {
                for (j, &to) in degrees.iter().enumerate() {
                    let p = table[i][j];
                    probs[from][to] = if p > 0.0 { p } else { NO_TRANSITION };
                }
            }
        }

        let mut log_probs = [[0.0f64; 24]; 24];
        for (row, prob_row) in log_probs.iter_mut().zip(&probs) {
            for (lp, &p) in row.iter_mut().zip(prob_row) {
                *lp = p.ln();
            }
        }
        Self { log_probs }
    }

    /// Log probability of moving from ordinal `from` to ordinal `to`
    pub fn log_transition(&self, from: usize, to: usize) -> f64 {
        self.log_probs[from % 24][to % 24]
    }

    /// Log-likelihood of the observation sequence for every candidate key
    ///
    /// Index `k` of the result is the score of the key with ordinal `k`.
    pub fn scores(&self, observations: &[Key]) -> [f64; 24] {
        let mut scores = [0.0f64; 24];
        for (k, score) in scores.iter_mut().enumerate() {
            let mut loglik = 0.0;
            for pair in observations.windows(2) {
                let a = (pair[0].index() + 24 - k) % 24;
                let b = (pair[1].index() + 24 - k) % 24;
                if a != b {
                    loglik += self.log_probs[a][b];
                }
            }
            let on_tonic = observations.iter().filter(|o| o.index() == k).count();
            loglik += on_tonic as f64 * TONIC_BONUS;
            *score = loglik;
        }
        scores
    }

    /// Most likely key of the sequence (first maximum on ties)
    ///
    /// # Errors
    ///
    /// `DegenerateInput` for an empty sequence.
    pub fn decide(&self, observations: &[Key]) -> Result<Key, AnalysisError> {
        if observations.is_empty() {
            return Err(AnalysisError::DegenerateInput(
                "No frame observations to score".to_string(),
            ));
        }
        let scores = self.scores(observations);
        let best = super::histogram::argmax(&scores);
        log::debug!(
            "Bigram decision over {} observations: {} (score {:.3})",
            observations.len(),
            Key::from_index(best).name(),
            scores[best]
        );
        Ok(Key::from_index(best))
    }
}

impl Default for BigramModel {
    fn default() -> Self {
        Self::bach()
    }
}
