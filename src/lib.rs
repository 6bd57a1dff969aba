//! # Tonal DSP
//!
//! Musical key estimation from raw audio. A track is reduced to one of the
//! 24 major/minor keys by a chroma pipeline and a frame-vote decision.
//!
//! ## Features
//!
//! - **Decoding**: WAV/MP3 via symphonia, checked against the configured format
//! - **Preprocessing**: mono mix, Butterworth low-pass, downsampling to 4410 Hz
//! - **Spectral estimation**: constant-Q binning of an FFT or a Lomb-Scargle
//!   periodogram at note frequencies
//! - **Key decision**: Pearson matching against rotated key profiles, then
//!   histogram voting or bigram sequence scoring
//! - **Evaluation**: exact/parallel/relative/fifth error classes over datasets
//!
//! ## Quick Start
//!
//! ```no_run
//! use tonal_dsp::{AnalysisConfig, KeyDetector};
//!
//! let detector = KeyDetector::new(AnalysisConfig::default())?;
//! let analysis = detector.detect_file("song.wav")?;
//!
//! println!("Key: {} (confidence: {:.2})", analysis.key, analysis.confidence);
//! # Ok::<(), tonal_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! The analysis pipeline follows this flow:
//!
//! ```text
//! Audio Input → Preprocessing → Framing → Spectral Estimation
//!   → Chroma → Profile Matching → Vote → Key
//! ```
//!
//! A [`KeyDetector`] builds every lookup table once (FFT plan, constant-Q
//! windows or periodogram bases, rotated profiles) and is `Send + Sync`, so
//! one detector can serve many threads analysing different tracks.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

use std::path::Path;
use std::time::Instant;

// Re-export main types
pub use analysis::result::{AnalysisMetadata, FrameFeatures, Key, KeyAnalysis};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use io::AudioSignal;

use config::DecisionMethod;
use features::chroma::{fold_octaves, ChromaVector};
use features::framing::{frames, short_term_energy, zero_crossings, AnalysisWindow};
use features::key::{vote_weight, BigramModel, KeyHistogram, ProfileMatcher};
use features::spectral::SpectralEstimator;

/// Confidence below which a warning is attached to the result
const LOW_CONFIDENCE: f32 = 0.1;

/// Key estimation session
///
/// Holds the validated configuration and every precomputed table. All
/// detection methods take `&self`.
#[derive(Debug, Clone)]
pub struct KeyDetector {
    config: AnalysisConfig,
    estimator: SpectralEstimator,
    window: AnalysisWindow,
    matcher: ProfileMatcher,
    bigram: BigramModel,
}

impl KeyDetector {
    /// Validate the configuration and build the lookup tables
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if the configuration violates an invariant or the
    /// spectral tables cannot be built (e.g. a constant-Q window past Nyquist).
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let estimator = SpectralEstimator::from_config(&config)?;
        let window = AnalysisWindow::new(config.window_function, config.window_size);
        let matcher = ProfileMatcher::from_config(&config);

        log::debug!(
            "Key detector ready: {:?}, N={}, hop={}, {} notes",
            estimator.method(),
            config.window_size,
            config.hop_size,
            estimator.output_len()
        );

        Ok(Self {
            config,
            estimator,
            window,
            matcher,
            bigram: BigramModel::bach(),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Decode, check and analyse an audio file
    ///
    /// # Errors
    ///
    /// - `IoFailure` / `DecodingError` if the file cannot be read
    /// - `UnsupportedAudioFormat` if rate or channel count differ from the
    ///   configuration
    /// - Everything [`KeyDetector::detect_signal`] returns
    pub fn detect_file<P: AsRef<Path>>(&self, path: P) -> Result<KeyAnalysis, AnalysisError> {
        let path = path.as_ref();
        log::debug!("Analysing {}", path.display());
        let signal = io::load_signal(path, &self.config)?;
        self.detect_signal(signal)
    }

    /// Check, preprocess and analyse a decoded signal
    ///
    /// The signal must have `source_sample_rate` and `channel_count`. It is
    /// mixed, low-passed and downsampled to `target_sample_rate`.
    ///
    /// # Errors
    ///
    /// - `UnsupportedAudioFormat` if rate or channel count differ from the
    ///   configuration
    /// - `InvalidInput` for an empty signal
    /// - Everything [`KeyDetector::detect_samples`] returns
    pub fn detect_signal(&self, signal: AudioSignal) -> Result<KeyAnalysis, AnalysisError> {
        signal.ensure_format(self.config.source_sample_rate, self.config.channel_count)?;
        if signal.is_empty() {
            return Err(AnalysisError::InvalidInput("Empty audio signal".to_string()));
        }
        let samples = preprocessing::preprocess(signal, &self.config)?;
        self.detect_samples(&samples)
    }

    /// Analyse a mono signal already at `target_sample_rate`
    ///
    /// The signal is cut into full frames. A signal shorter than one frame is
    /// analysed as a single short frame.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty signal
    /// - `DegenerateInput` if no frame casts a vote (silence, constant input)
    pub fn detect_samples(&self, samples: &[f32]) -> Result<KeyAnalysis, AnalysisError> {
        let start_time = Instant::now();

        if samples.is_empty() {
            return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
        }

        let mut warnings = Vec::new();
        let mut frame_list: Vec<&[f32]> =
            frames(samples, self.config.window_size, self.config.hop_size)?.collect();
        if frame_list.is_empty() {
            warnings.push(format!(
                "Signal has {} samples, shorter than one {}-sample frame",
                samples.len(),
                self.config.window_size
            ));
            frame_list.push(samples);
        }

        let mut histogram = KeyHistogram::new();
        let mut chroma = Vec::with_capacity(frame_list.len());
        let mut energies = Vec::with_capacity(frame_list.len());
        let mut crossings = Vec::new();
        let mut observations = Vec::new();
        let mut degenerate = 0usize;

        for (index, frame) in frame_list.iter().enumerate() {
            let windowed = self.apply_window(frame);
            let energy = short_term_energy(&windowed);
            energies.push(energy);
            if self.config.compute_zero_crossings {
                crossings.push(zero_crossings(frame));
            }

            let frame_chroma = match self.chroma_for_windowed(&windowed) {
                Ok(c) => c,
                Err(e) if e.is_degenerate() => {
                    log::debug!("Frame {}: {}", index, e);
                    degenerate += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            chroma.push(frame_chroma);

            let best = match self.matcher.best_match(&frame_chroma) {
                Ok(m) => m,
                Err(e) => {
                    log::debug!("Frame {}: {}", index, e);
                    degenerate += 1;
                    continue;
                }
            };
            if best.correlation < self.config.min_vote_correlation {
                log::debug!(
                    "Frame {}: best correlation {:.3} below threshold, no vote",
                    index,
                    best.correlation
                );
                continue;
            }
            let Some(weight) = vote_weight(self.config.vote_weighting, energy) else {
                log::debug!("Frame {}: energy {:.3e} gives no usable vote weight", index, energy);
                continue;
            };

            histogram.vote(best.key, weight);
            observations.push(best.key);
        }

        if degenerate > 0 {
            warnings.push(format!("{} degenerate frame(s) skipped", degenerate));
        }

        let key = match self.config.decision {
            DecisionMethod::Histogram => histogram.decide()?,
            DecisionMethod::Bigram => self.bigram.decide(&observations)?,
        };
        let confidence = histogram.confidence_for(key);
        if confidence < LOW_CONFIDENCE {
            warnings.push(format!("Low key confidence ({:.3})", confidence));
        }

        let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
        log::debug!(
            "Detected key {} from {}/{} voting frames (confidence {:.3}) in {:.1} ms",
            key,
            histogram.votes(),
            frame_list.len(),
            confidence,
            processing_time_ms
        );

        Ok(KeyAnalysis {
            key,
            confidence,
            frames_analyzed: frame_list.len(),
            frames_voted: histogram.votes(),
            histogram,
            chroma,
            features: FrameFeatures {
                energies: Some(energies),
                zero_crossings: self.config.compute_zero_crossings.then_some(crossings),
                observations: (self.config.decision == DecisionMethod::Bigram)
                    .then_some(observations),
            },
            metadata: AnalysisMetadata {
                duration_seconds: samples.len() as f32 / self.config.target_sample_rate as f32,
                sample_rate: self.config.target_sample_rate,
                processing_time_ms,
                algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
                spectral_method: self.estimator.method(),
                decision: self.config.decision,
                warnings,
            },
        })
    }

    /// Chroma vector of one unwindowed frame at the target rate
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty frame or one longer than `window_size`
    /// - `DegenerateInput` if the periodogram is undefined for this frame
    pub fn chroma_for_frame(&self, frame: &[f32]) -> Result<ChromaVector, AnalysisError> {
        if frame.is_empty() || frame.len() > self.config.window_size {
            return Err(AnalysisError::InvalidInput(format!(
                "Frame has {} samples, expected 1..={}",
                frame.len(),
                self.config.window_size
            )));
        }
        self.chroma_for_windowed(&self.apply_window(frame))
    }

    fn apply_window(&self, frame: &[f32]) -> Vec<f32> {
        if frame.len() == self.window.len() {
            self.window.apply(frame)
        } else {
            AnalysisWindow::new(self.config.window_function, frame.len()).apply(frame)
        }
    }

    fn chroma_for_windowed(&self, windowed: &[f32]) -> Result<ChromaVector, AnalysisError> {
        let spectrum = self.estimator.estimate(windowed)?;
        fold_octaves(&spectrum, self.config.octave_count, self.config.chroma_blend_weight)
    }
}

/// Main analysis function
///
/// Builds a one-off [`KeyDetector`] and analyses a decoded signal. Prefer a
/// long-lived detector when analysing many tracks.
///
/// # Arguments
///
/// * `signal` - Decoded audio at `source_sample_rate` with `channel_count`
///   channels
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// `KeyAnalysis` containing the key, vote histogram and per-frame features
///
/// # Errors
///
/// Returns `AnalysisError` if the configuration is invalid or analysis fails
///
/// # Example
///
/// ```no_run
/// use tonal_dsp::{analyze_audio, AnalysisConfig, AudioSignal};
///
/// let samples: Vec<f32> = (0..44100 * 10)
///     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
///     .collect();
/// // The default configuration expects 44.1 kHz stereo
/// let signal = AudioSignal::new(44100, vec![samples.clone(), samples])?;
/// let analysis = analyze_audio(signal, AnalysisConfig::default())?;
/// println!("{}", analysis.key);
/// # Ok::<(), tonal_dsp::AnalysisError>(())
/// ```
pub fn analyze_audio(
    signal: AudioSignal,
    config: AnalysisConfig,
) -> Result<KeyAnalysis, AnalysisError> {
    KeyDetector::new(config)?.detect_signal(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SpectralMethod, VoteWeighting};

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_detector_is_send_sync() {
        assert_send_sync::<KeyDetector>();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            octave_count: 3,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            KeyDetector::new(config),
            Err(AnalysisError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_a440_chroma_peaks_at_a() {
        let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
        let chroma = detector.chroma_for_frame(&sine(440.0, 4410.0, 16384)).unwrap();
        let peak = (0..12).fold(0, |best, i| if chroma[i] > chroma[best] { i } else { best });
        // Chroma index 0 is MIDI 9, pitch class A
        assert_eq!(peak, 0);

        let matched = detector.matcher.best_match(&chroma).unwrap();
        assert_eq!(matched.key.pitch_class(), 9);
    }

    #[test]
    fn test_detect_samples_sine() {
        let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
        let analysis = detector.detect_samples(&sine(440.0, 4410.0, 16384 * 3)).unwrap();
        assert_eq!(analysis.key.pitch_class(), 9);
        assert_eq!(analysis.frames_analyzed, 3);
        assert_eq!(analysis.frames_voted, 3);
        assert_eq!(analysis.chroma.len(), 3);
        assert!(analysis.confidence > 0.3);
        let features = &analysis.features;
        assert_eq!(features.energies.as_ref().map(Vec::len), Some(3));
        assert_eq!(features.zero_crossings.as_ref().map(Vec::len), Some(3));
        assert!(features.observations.is_none());
    }

    #[test]
    fn test_lomb_scargle_and_bigram() {
        let config = AnalysisConfig {
            window_size: 4096,
            hop_size: 2048,
            spectral_method: SpectralMethod::LombScargle,
            decision: DecisionMethod::Bigram,
            compute_zero_crossings: false,
            ..AnalysisConfig::default()
        };
        let detector = KeyDetector::new(config).unwrap();
        let analysis = detector.detect_samples(&sine(440.0, 4410.0, 4096 * 3)).unwrap();
        assert_eq!(analysis.key.pitch_class(), 9);
        assert_eq!(analysis.frames_analyzed, 5);
        assert_eq!(analysis.metadata.spectral_method, SpectralMethod::LombScargle);
        assert!(analysis.features.zero_crossings.is_none());
        assert_eq!(analysis.features.observations.as_ref().map(Vec::len), Some(5));
        assert_eq!(analysis.confidence, analysis.histogram.confidence_for(analysis.key));
    }

    #[test]
    fn test_short_signal_single_frame() {
        let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
        let analysis = detector.detect_samples(&sine(440.0, 4410.0, 8000)).unwrap();
        assert_eq!(analysis.frames_analyzed, 1);
        assert_eq!(analysis.key.pitch_class(), 9);
        assert!(!analysis.metadata.warnings.is_empty());
    }

    #[test]
    fn test_silence_is_degenerate() {
        let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
        let result = detector.detect_samples(&vec![0.0; 16384 * 2]);
        assert!(matches!(result, Err(AnalysisError::DegenerateInput(_))));
        assert!(detector.detect_samples(&[]).is_err());
    }

    #[test]
    fn test_log_energy_weighting() {
        let config = AnalysisConfig {
            vote_weighting: VoteWeighting::LogEnergy,
            ..AnalysisConfig::default()
        };
        let detector = KeyDetector::new(config).unwrap();
        let analysis = detector.detect_samples(&sine(440.0, 4410.0, 16384 * 2)).unwrap();
        // Blackman-windowed unit sine: energy ~ 0.5 * 0.3046 * N, well above 1
        assert_eq!(analysis.frames_voted, 2);
        assert!(analysis.histogram.total() > 2.0);
    }

    #[test]
    fn test_chroma_for_frame_rejects_long_frame() {
        let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
        assert!(detector.chroma_for_frame(&vec![0.1; 16385]).is_err());
        assert!(detector.chroma_for_frame(&[]).is_err());
    }

    #[test]
    fn test_single_sample_input_does_not_panic() {
        for method in [SpectralMethod::Cqt, SpectralMethod::LombScargle] {
            let config = AnalysisConfig {
                spectral_method: method,
                ..AnalysisConfig::default()
            };
            let detector = KeyDetector::new(config).unwrap();
            let result = detector.detect_samples(&[0.5]);
            assert!(
                matches!(result, Ok(_) | Err(AnalysisError::DegenerateInput(_))),
                "{:?}: {:?}",
                method,
                result
            );
            let chroma = detector.chroma_for_frame(&[0.5]);
            assert!(matches!(chroma, Ok(_) | Err(AnalysisError::DegenerateInput(_))));
        }
    }

    #[test]
    fn test_tiny_signal_reaches_one_sample() {
        // 10 samples at 44.1 kHz downsample to a single sample at 4410 Hz
        let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
        let signal = AudioSignal::new(44100, vec![vec![0.25; 10], vec![-0.1; 10]]).unwrap();
        let result = detector.detect_signal(signal);
        assert!(matches!(result, Ok(_) | Err(AnalysisError::DegenerateInput(_))));
    }

    #[test]
    fn test_detect_signal_checks_format() {
        let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();

        let wrong_rate = AudioSignal::mono(48000, sine(440.0, 48000.0, 48000 * 4)).unwrap();
        assert!(matches!(
            detector.detect_signal(wrong_rate),
            Err(AnalysisError::UnsupportedAudioFormat(_))
        ));

        let already_downsampled = AudioSignal::mono(4410, sine(440.0, 4410.0, 16384)).unwrap();
        assert!(matches!(
            detector.detect_signal(already_downsampled),
            Err(AnalysisError::UnsupportedAudioFormat(_))
        ));

        let tone = sine(440.0, 44100.0, 44100 * 4);
        let mono = AudioSignal::mono(44100, tone.clone()).unwrap();
        assert!(matches!(
            analyze_audio(mono, AnalysisConfig::default()),
            Err(AnalysisError::UnsupportedAudioFormat(_))
        ));

        let stereo = AudioSignal::new(44100, vec![tone.clone(), tone]).unwrap();
        let analysis = detector.detect_signal(stereo).unwrap();
        assert_eq!(analysis.key.pitch_class(), 9);
    }

    #[test]
    fn test_quiet_lomb_scargle_signal_still_votes() {
        let config = AnalysisConfig {
            spectral_method: SpectralMethod::LombScargle,
            ..AnalysisConfig::default()
        };
        let detector = KeyDetector::new(config).unwrap();
        let a4 = sine(440.0, 4410.0, 16384 * 2);
        let e5 = sine(659.26, 4410.0, 16384 * 2);

        let mut keys = Vec::new();
        for amplitude in [1e-2f32, 1e-4, 3e-5, 1e-5, 1e-6] {
            let samples: Vec<f32> =
                a4.iter().zip(&e5).map(|(a, e)| (a + e) * amplitude).collect();
            let analysis = detector.detect_samples(&samples).unwrap();
            assert_eq!(analysis.frames_voted, 2, "amplitude {}", amplitude);
            keys.push(analysis.key);
        }
        assert_eq!(keys[0].pitch_class(), 9);
        assert!(keys.iter().all(|&k| k == keys[0]), "{:?}", keys);
    }

    #[test]
    fn test_min_vote_correlation_threshold() {
        let frame = sine(440.0, 4410.0, 16384);
        let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
        let chroma = detector.chroma_for_frame(&frame).unwrap();
        let correlation = detector.matcher.best_match(&chroma).unwrap().correlation;

        // A frame exactly at the threshold still votes
        let at_threshold = KeyDetector::new(AnalysisConfig {
            min_vote_correlation: correlation,
            ..AnalysisConfig::default()
        })
        .unwrap();
        let analysis = at_threshold.detect_samples(&frame).unwrap();
        assert_eq!(analysis.frames_voted, 1);
        assert_eq!(analysis.key.pitch_class(), 9);

        let above = KeyDetector::new(AnalysisConfig {
            min_vote_correlation: correlation + 1e-3,
            ..AnalysisConfig::default()
        })
        .unwrap();
        assert!(matches!(
            above.detect_samples(&frame),
            Err(AnalysisError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_degenerate_frames_skipped_among_voting_frames() {
        let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
        let mut samples = vec![0.0f32; 16384];
        samples.extend(sine(440.0, 4410.0, 16384 * 2));

        let analysis = detector.detect_samples(&samples).unwrap();
        assert_eq!(analysis.frames_analyzed, 3);
        assert_eq!(analysis.frames_voted, 2);
        assert_eq!(analysis.key.pitch_class(), 9);
        assert!(analysis
            .metadata
            .warnings
            .iter()
            .any(|w| w == "1 degenerate frame(s) skipped"));
        assert_eq!(analysis.features.energies.as_ref().map(Vec::len), Some(3));
    }
}
