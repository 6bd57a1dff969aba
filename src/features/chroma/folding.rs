//! Octave folding of note spectra into chroma vectors
//!
//! The note vector is viewed as an `n_octaves x 12` matrix (row-major by
//! octave). Each pitch-class column is reduced to
//! `weight * max(column) + (1 - weight) * sum(column)`, which rewards a pitch
//! class with one strong octave while still counting energy spread across
//! octaves.

use crate::error::AnalysisError;

/// 12-element pitch-class vector, index 0 = lowest analysed note's class
pub type ChromaVector = [f32; 12];

/// Fold a note spectrum into a chroma vector
///
/// # Arguments
///
/// * `spectrum` - `n_octaves * 12` note values, octave-major
/// * `n_octaves` - Number of octaves in `spectrum`
/// * `weight` - Blend between column max (`weight`) and column sum (`1 - weight`)
///
/// # Errors
///
/// `InvalidInput` if `n_octaves` is zero or the length is not `n_octaves * 12`.
///
/// # Example
///
/// ```
/// use tonal_dsp::features::chroma::fold_octaves;
///
/// let mut spectrum = vec![0.0f32; 72];
/// for octave in 0..6 {
///     spectrum[octave * 12] = 1.0;
/// }
/// let chroma = fold_octaves(&spectrum, 6, 0.8)?;
/// assert!((chroma[0] - 2.0).abs() < 1e-6);
/// # Ok::<(), tonal_dsp::AnalysisError>(())
/// ```
pub fn fold_octaves(
    spectrum: &[f32],
    n_octaves: usize,
    weight: f32,
) -> Result<ChromaVector, AnalysisError> {
    if n_octaves == 0 || spectrum.len() != n_octaves * 12 {
        return Err(AnalysisError::InvalidInput(format!(
            "Spectrum has {} values, expected {} octaves x 12",
            spectrum.len(),
            n_octaves
        )));
    }

    let mut max = [f32::NEG_INFINITY; 12];
    let mut sum = [0.0f32; 12];
    for octave in spectrum.chunks_exact(12) {
        for (pc, &v) in octave.iter().enumerate() {
            max[pc] = max[pc].max(v);
            sum[pc] += v;
        }
    }

    let mut chroma = [0.0f32; 12];
    for pc in 0..12 {
        chroma[pc] = weight * max[pc] + (1.0 - weight) * sum[pc];
    }
    Ok(chroma)
}
