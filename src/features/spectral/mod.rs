//! Spectral estimation modules
//!
//! Two interchangeable strategies produce one value per analysed note
//! (`octave_count * 12` values per frame):
//! - Constant-Q binning of an FFT magnitude spectrum
//! - Lomb-Scargle periodogram evaluated at note frequencies
//!
//! Downstream chroma folding does not depend on which one is used.

pub mod cqt;
pub mod lomb_scargle;
pub mod notes;

pub use cqt::{build_spectral_windows, CqtEstimator, SpectralWindow};
pub use lomb_scargle::LombScargleEstimator;
pub use notes::{midi_to_hz, NoteFrequencySet};

use crate::config::{AnalysisConfig, SpectralMethod};
use crate::error::AnalysisError;

/// Configured spectral estimator
#[derive(Debug, Clone)]
pub enum SpectralEstimator {
    /// FFT + constant-Q windows
    Cqt(CqtEstimator),
    /// Lomb-Scargle periodogram
    LombScargle(LombScargleEstimator),
}

impl SpectralEstimator {
    /// Build the estimator selected by `config.spectral_method`
    ///
    /// This is the expensive setup step (FFT planning, window tables or
    /// periodogram bases); do it once per session.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let notes = NoteFrequencySet::new(config.min_midi_note, config.max_midi_note)?;
        match config.spectral_method {
            SpectralMethod::Cqt => Ok(SpectralEstimator::Cqt(CqtEstimator::new(
                &notes,
                config.window_size,
                config.target_sample_rate,
                config.cqt_bandwidth,
            )?)),
            SpectralMethod::LombScargle => Ok(SpectralEstimator::LombScargle(
                LombScargleEstimator::new(&notes, config.window_size, config.target_sample_rate)?,
            )),
        }
    }

    /// Spectral values of one windowed frame
    pub fn estimate(&self, frame: &[f32]) -> Result<Vec<f32>, AnalysisError> {
        match self {
            SpectralEstimator::Cqt(est) => est.estimate(frame),
            SpectralEstimator::LombScargle(est) => est.estimate(frame),
        }
    }

    /// Number of values per frame
    pub fn output_len(&self) -> usize {
        match self {
            SpectralEstimator::Cqt(est) => est.output_len(),
            SpectralEstimator::LombScargle(est) => est.output_len(),
        }
    }

    /// Strategy in use
    pub fn method(&self) -> SpectralMethod {
        match self {
            SpectralEstimator::Cqt(_) => SpectralMethod::Cqt,
            SpectralEstimator::LombScargle(_) => SpectralMethod::LombScargle,
        }
    }
}
