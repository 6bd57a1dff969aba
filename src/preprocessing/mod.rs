//! Audio preprocessing modules
//!
//! Prepares decoded audio for spectral analysis:
//! - Channel mixing (multi-channel to mono)
//! - Butterworth low-pass (anti-aliasing)
//! - Downsampling to the analysis rate

pub mod channel_mixer;
pub mod lowpass;
pub mod resample;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::io::AudioSignal;

/// Run the full preprocessing chain on a decoded signal
///
/// Mixes to mono, low-passes at `lowpass_cutoff_hz` and downsamples from the
/// signal's rate to `target_sample_rate`.
pub fn preprocess(signal: AudioSignal, config: &AnalysisConfig) -> Result<Vec<f32>, AnalysisError> {
    let sample_rate = signal.sample_rate();
    let mono = channel_mixer::mix_to_mono(signal);
    let filtered = lowpass::lowpass(
        &mono,
        config.lowpass_cutoff_hz,
        config.lowpass_order,
        sample_rate,
    )?;
    resample::downsample(&filtered, sample_rate, config.target_sample_rate)
}
