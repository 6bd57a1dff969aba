//! Reference key profiles
//!
//! A profile is a 12-element weighting of pitch classes relative to the
//! tonic. Each profile is expanded into a 12x12 matrix whose row `i` is the
//! profile rolled right by `i`, i.e. the profile for a tonic at chroma index `i`.
//!
//! # References
//!
//! Krumhansl, C. L., & Kessler, E. J. (1982). Tracing the Dynamic Changes in Perceived
//! Tonal Organization in a Spatial Representation of Musical Keys. *Psychological Review*,
//! 89(4), 334-368.
//!
//! Sha'ath, I. (2011). Estimation of key in digital music recordings. MSc thesis,
//! Birkbeck College, University of London.

use crate::config::ProfileSet;

/// Krumhansl-Kessler major profile
pub const KRUMHANSL_MAJOR: [f32; 12] = [6.4, 2.2, 3.5, 2.3, 4.4, 4.1, 2.5, 5.2, 2.4, 3.7, 2.3, 2.9];

/// Krumhansl-Kessler minor profile
pub const KRUMHANSL_MINOR: [f32; 12] = [6.4, 2.8, 3.6, 5.4, 2.7, 3.6, 2.6, 4.8, 4.0, 2.7, 3.3, 3.2];

/// Sha'ath major profile
pub const SHAATH_MAJOR: [f32; 12] = [6.6, 2.0, 3.5, 2.2, 4.6, 4.0, 2.5, 5.2, 2.4, 3.8, 2.3, 3.4];

/// Sha'ath minor profile
pub const SHAATH_MINOR: [f32; 12] = [6.5, 2.8, 3.5, 5.4, 2.7, 3.5, 2.5, 5.1, 4.0, 2.7, 4.3, 3.2];

/// Roll a profile right by `shift` positions
pub fn rotate(profile: &[f32; 12], shift: usize) -> [f32; 12] {
    let mut out = [0.0f32; 12];
    for (i, &v) in profile.iter().enumerate() {
        out[(i + shift) % 12] = v;
    }
    out
}

/// Rotation matrix of a profile: row `i` = profile rolled by `i`
pub fn profile_matrix(profile: &[f32; 12]) -> [[f32; 12]; 12] {
    let mut matrix = [[0.0f32; 12]; 12];
    for (i, row) in matrix.iter_mut().enumerate() {
        *row = rotate(profile, i);
    }
    matrix
}

/// Rotated major and minor profiles
#[derive(Debug, Clone, PartialEq)]
pub struct KeyProfiles {
    /// Major rotations, row `i` = tonic at chroma index `i`
    pub major: [[f32; 12]; 12],

    /// Minor rotations, row `i` = tonic at chroma index `i`
    pub minor: [[f32; 12]; 12],
}

impl KeyProfiles {
    /// Build the rotation matrices of a profile set
    pub fn new(set: ProfileSet) -> Self {
        let (major, minor) = match set {
            ProfileSet::Shaath => (&SHAATH_MAJOR, &SHAATH_MINOR),
            ProfileSet::Krumhansl => (&KRUMHANSL_MAJOR, &KRUMHANSL_MINOR),
        };
        Self {
            major: profile_matrix(major),
            minor: profile_matrix(minor),
        }
    }

    /// Major profile for a tonic at chroma index `rotation`
    pub fn major_row(&self, rotation: usize) -> &[f32; 12] {
        &self.major[rotation % 12]
    }

    /// Minor profile for a tonic at chroma index `rotation`
    pub fn minor_row(&self, rotation: usize) -> &[f32; 12] {
        &self.minor[rotation % 12]
    }
}

impl Default for KeyProfiles {
    fn default() -> Self {
        Self::new(ProfileSet::Shaath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_moves_tonic() {
        let profiles = KeyProfiles::new(ProfileSet::Krumhansl);
        for i in 0..12 {
            assert_eq!(profiles.major_row(i)[i], KRUMHANSL_MAJOR[0]);
            assert_eq!(profiles.minor_row(i)[i], KRUMHANSL_MINOR[0]);
            // Dominant sits seven semitones above the tonic
            assert_eq!(profiles.major_row(i)[(i + 7) % 12], KRUMHANSL_MAJOR[7]);
        }
    }

    #[test]
    fn test_row_zero_is_reference() {
        let profiles = KeyProfiles::default();
        assert_eq!(profiles.major[0], SHAATH_MAJOR);
        assert_eq!(profiles.minor[0], SHAATH_MINOR);
    }

    #[test]
    fn test_rotate_full_cycle() {
        assert_eq!(rotate(&SHAATH_MINOR, 12), SHAATH_MINOR);
        assert_eq!(rotate(&rotate(&SHAATH_MINOR, 5), 7), SHAATH_MINOR);
    }
}
