//! Configuration parameters for key analysis
//!
//! All pipeline constants live in a single [`AnalysisConfig`]. The defaults
//! reproduce the reference setup: 44.1 kHz stereo input, 5th-order low-pass,
//! downsampling to 4410 Hz, non-overlapping 16384-sample Blackman frames and
//! six octaves of notes from MIDI 9 (A) up to MIDI 81.
//!
//! Invariants are checked once by [`AnalysisConfig::validate`]; every code
//! path that turns a config into a usable session (`from_toml_str`,
//! `from_file`, [`crate::KeyDetector::new`]) goes through it.
//!
//! # Example
//!
//! ```
//! use tonal_dsp::config::{AnalysisConfig, SpectralMethod};
//!
//! let config = AnalysisConfig::from_toml_str(r#"
//!     spectral_method = "lomb_scargle"
//!     hop_size = 8192
//! "#)?;
//! assert_eq!(config.spectral_method, SpectralMethod::LombScargle);
//! # Ok::<(), tonal_dsp::AnalysisError>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::features::spectral::notes::midi_to_hz;

/// Spectral estimation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectralMethod {
    /// FFT magnitude binned through per-note constant-Q windows
    Cqt,
    /// Lomb-Scargle periodogram evaluated at note frequencies
    LombScargle,
}

/// Weight of a single frame's vote in the key histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteWeighting {
    /// Every voting frame adds 1
    Unit,
    /// Every voting frame adds `ln(short-term energy)`
    LogEnergy,
}

/// Reference key profiles used for correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSet {
    /// Shaath (KeyFinder) profiles
    Shaath,
    /// Krumhansl-Kessler probe-tone profiles
    Krumhansl,
}

/// How per-frame matches are reduced to a track key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMethod {
    /// Argmax of the 24-bin vote histogram
    Histogram,
    /// Bigram (Markov chain) likelihood of the frame key sequence
    Bigram,
}

/// Analysis window applied to every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFunction {
    /// Blackman window
    Blackman,
    /// Hann window
    Hann,
    /// No windowing
    Rectangular,
}

/// Analysis configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Input
    /// Expected sample rate of decoded files in Hz (default: 44100)
    pub source_sample_rate: u32,

    /// Expected channel count of decoded files (default: 2)
    pub channel_count: u16,

    // Preprocessing
    /// Butterworth low-pass order (default: 5)
    pub lowpass_order: usize,

    /// Low-pass cutoff in Hz, must be below the source Nyquist (default: 2205.0)
    pub lowpass_cutoff_hz: f32,

    /// Sample rate after downsampling in Hz (default: 4410)
    pub target_sample_rate: u32,

    // Framing
    /// Frame length in target-rate samples (default: 16384)
    pub window_size: usize,

    /// Distance between frame starts (default: 16384, no overlap)
    pub hop_size: usize,

    /// Window applied before spectral estimation (default: Blackman)
    pub window_function: WindowFunction,

    /// Compute the zero-crossing diagnostic per frame (default: true)
    pub compute_zero_crossings: bool,

    // Spectral estimation
    /// Lowest analysed MIDI note, inclusive (default: 9)
    pub min_midi_note: u8,

    /// Highest analysed MIDI note, exclusive (default: 81)
    pub max_midi_note: u8,

    /// Octaves spanned by the note range; must equal the span / 12 (default: 6)
    pub octave_count: usize,

    /// Spectral estimation strategy (default: Cqt)
    pub spectral_method: SpectralMethod,

    /// Constant-Q window bandwidth as a fraction of a semitone (default: 0.8)
    pub cqt_bandwidth: f32,

    // Chroma
    /// Blend between octave max and octave sum when folding (default: 0.8)
    pub chroma_blend_weight: f32,

    // Key decision
    /// Reference key profiles (default: Shaath)
    pub key_profile: ProfileSet,

    /// Calibration offset added to `min_midi_note + rotation` when naming the
    /// tonic of a matched rotation (default: 0)
    pub tonic_offset: i32,

    /// Frames whose best correlation is below this value do not vote (default: 0.0)
    pub min_vote_correlation: f32,

    /// Histogram vote weighting (default: Unit)
    pub vote_weighting: VoteWeighting,

    /// Track-level decision (default: Histogram)
    pub decision: DecisionMethod,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source_sample_rate: 44100,
            channel_count: 2,
            lowpass_order: 5,
            lowpass_cutoff_hz: 2205.0,
            target_sample_rate: 4410,
            window_size: 16384,
            hop_size: 16384,
            window_function: WindowFunction::Blackman,
            compute_zero_crossings: true,
            min_midi_note: 9,
            max_midi_note: 81,
            octave_count: 6,
            spectral_method: SpectralMethod::Cqt,
            cqt_bandwidth: 0.8,
            chroma_blend_weight: 0.8,
            key_profile: ProfileSet::Shaath,
            tonic_offset: 0,
            min_vote_correlation: 0.0,
            vote_weighting: VoteWeighting::Unit,
            decision: DecisionMethod::Histogram,
        }
    }
}

impl AnalysisConfig {
    /// Parse a TOML document (missing keys take their defaults) and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = toml::from_str(text)
            .map_err(|e| AnalysisError::ConfigurationError(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AnalysisError::IoFailure {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Number of analysed notes (`octave_count * 12`).
    pub fn note_count(&self) -> usize {
        self.octave_count * 12
    }

    /// Check every configuration invariant.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ConfigurationError` describing the first
    /// violated invariant.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let fail = |msg: String| Err(AnalysisError::ConfigurationError(msg));

        if self.max_midi_note <= self.min_midi_note {
            return fail(format!(
                "max_midi_note ({}) must be greater than min_midi_note ({})",
                self.max_midi_note, self.min_midi_note
            ));
        }
        let span = (self.max_midi_note - self.min_midi_note) as usize;
        if span % 12 != 0 {
            return fail(format!(
                "MIDI span {} ({}..{}) is not a whole number of octaves",
                span, self.min_midi_note, self.max_midi_note
            ));
        }
        if self.octave_count != span / 12 {
            return fail(format!(
                "octave_count ({}) does not match MIDI span {} / 12 = {}",
                self.octave_count,
                span,
                span / 12
            ));
        }

        if self.source_sample_rate == 0 || self.target_sample_rate == 0 {
            return fail("sample rates must be positive".to_string());
        }
        if self.target_sample_rate > self.source_sample_rate {
            return fail(format!(
                "target_sample_rate ({}) exceeds source_sample_rate ({})",
                self.target_sample_rate, self.source_sample_rate
            ));
        }
        if self.channel_count == 0 {
            return fail("channel_count must be at least 1".to_string());
        }

        if self.lowpass_order == 0 {
            return fail("lowpass_order must be at least 1".to_string());
        }
        let source_nyquist = self.source_sample_rate as f32 / 2.0;
        if !(self.lowpass_cutoff_hz > 0.0 && self.lowpass_cutoff_hz < source_nyquist) {
            return fail(format!(
                "lowpass_cutoff_hz ({}) must lie in (0, {})",
                self.lowpass_cutoff_hz, source_nyquist
            ));
        }

        if self.window_size < 2 {
            return fail("window_size must be at least 2".to_string());
        }
        if self.hop_size == 0 {
            return fail("hop_size must be positive".to_string());
        }

        if !(0.0..=1.0).contains(&self.chroma_blend_weight) {
            return fail(format!(
                "chroma_blend_weight ({}) must lie in [0, 1]",
                self.chroma_blend_weight
            ));
        }
        if !(self.cqt_bandwidth > 0.0 && self.cqt_bandwidth.is_finite()) {
            return fail(format!("cqt_bandwidth ({}) must be positive", self.cqt_bandwidth));
        }
        if !self.min_vote_correlation.is_finite() {
            return fail("min_vote_correlation must be finite".to_string());
        }

        let highest_note = midi_to_hz(self.max_midi_note as f32 - 1.0);
        let target_nyquist = self.target_sample_rate as f32 / 2.0;
        if highest_note >= target_nyquist {
            return fail(format!(
                "highest analysed note ({:.1} Hz) is above the target Nyquist frequency ({:.1} Hz)",
                highest_note, target_nyquist
            ));
        }

        Ok(())
    }
}
