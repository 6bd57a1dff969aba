//! Per-frame key profile matching
//!
//! Correlates a chroma vector with the 24 rotated key profiles and keeps the
//! best one. The scan runs over major rotations 0-11 and then minor rotations
//! 0-11 with a strict `>` comparison, so ties go to the first maximum: major
//! before minor, lower rotation first.
//!
//! Chroma index 0 holds the pitch class of the lowest analysed MIDI note, so
//! a rotation is named `(min_midi_note + tonic_offset + rotation) mod 12`.

use super::templates::KeyProfiles;
use crate::analysis::result::Key;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// Variance at or below this fraction of a vector's energy is treated as constant
const EPSILON: f64 = 1e-12;

/// Best profile match for one chroma vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileMatch {
    /// Matched key (tonic pitch class and mode)
    pub key: Key,
    /// Profile rotation that matched (0-11)
    pub rotation: usize,
    /// Pearson correlation of the match
    pub correlation: f32,
}

/// Pearson correlation coefficient
///
/// Returns `None` when either vector has zero variance or the lengths differ.
/// The variance test is relative to the vector's energy, so scaling either
/// input by a positive factor never changes the result.
pub fn pearson(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().map(|&x| x as f64).sum::<f64>() / n;
    let mean_b = b.iter().map(|&x| x as f64).sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0f64, 0.0f64, 0.0f64);
    let (mut energy_a, mut energy_b) = (0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
        energy_a += x as f64 * x as f64;
        energy_b += y as f64 * y as f64;
    }

    if var_a <= EPSILON * energy_a || var_b <= EPSILON * energy_b {
        return None;
    }
    let r = cov / (var_a * var_b).sqrt();
    r.is_finite().then_some(r)
}

/// Correlates chroma vectors against rotated key profiles
#[derive(Debug, Clone)]
pub struct ProfileMatcher {
    profiles: KeyProfiles,
    tonic_base: i32,
}

impl ProfileMatcher {
    /// Create a matcher
    ///
    /// # Arguments
    ///
    /// * `profiles` - Rotated reference profiles
    /// * `min_midi_note` - MIDI note of chroma index 0
    /// * `tonic_offset` - Calibration offset added when naming a rotation
    pub fn new(profiles: KeyProfiles, min_midi_note: u8, tonic_offset: i32) -> Self {
        Self {
            profiles,
            tonic_base: min_midi_note as i32 + tonic_offset,
        }
    }

    /// Matcher for a configuration
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            KeyProfiles::new(config.key_profile),
            config.min_midi_note,
            config.tonic_offset,
        )
    }

    /// Reference profiles
    pub fn profiles(&self) -> &KeyProfiles {
        &self.profiles
    }

    /// Pitch class named by a profile rotation
    pub fn rotation_pitch_class(&self, rotation: usize) -> u32 {
        (self.tonic_base + rotation as i32).rem_euclid(12) as u32
    }

    /// Correlation with all 24 rotations: majors 0-11 then minors 0-11
    ///
    /// # Errors
    ///
    /// `DegenerateInput` if the chroma vector is constant or not finite.
    pub fn correlations(&self, chroma: &[f32; 12]) -> Result<[f32; 24], AnalysisError> {
        if chroma.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::DegenerateInput(
                "Chroma vector contains non-finite values".to_string(),
            ));
        }

        let mut scores = [0.0f32; 24];
        let rows = self.profiles.major.iter().chain(self.profiles.minor.iter());
        for (score, row) in scores.iter_mut().zip(rows) {
            *score = pearson(chroma, row).ok_or_else(|| {
                AnalysisError::DegenerateInput(
                    "Chroma vector has zero variance, correlation undefined".to_string(),
                )
            })? as f32;
        }
        Ok(scores)
    }

    /// Best-matching key of a chroma vector
    ///
    /// # Errors
    ///
    /// `DegenerateInput` if the chroma vector is constant or not finite; the
    /// caller should drop the frame's vote.
    pub fn best_match(&self, chroma: &[f32; 12]) -> Result<ProfileMatch, AnalysisError> {
        let scores = self.correlations(chroma)?;

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = i;
            }
        }

        let rotation = best % 12;
        let pitch_class = self.rotation_pitch_class(rotation);
        let key = if best < 12 {
            Key::Major(pitch_class)
        } else {
            Key::Minor(pitch_class)
        };

        Ok(ProfileMatch {
            key,
            rotation,
            correlation: scores[best],
        })
    }
}

impl Default for ProfileMatcher {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}
