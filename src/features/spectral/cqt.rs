//! Constant-Q binning of an FFT magnitude spectrum
//!
//! Every analysed note gets a raised-cosine window over the FFT bins around
//! its centre frequency. The window width is a fixed fraction of a semitone,
//! so bandwidth grows with frequency (constant Q). Windows are built once per
//! (frame length, sample rate, note set) and reused for every frame.
//!
//! # Algorithm
//!
//! For note frequency `f`, frame length `N` and rate `fs`:
//! 1. `Q = bandwidth * (2^(1/12) - 1)`
//! 2. Centre bin `c = f * N / fs`, bounds `l = c (1 - Q/2)`, `r = c (1 + Q/2)`
//! 3. Nearest bins `li = round(l)`, `ri = round(r)` (widened to `li + 1` if equal)
//! 4. Weights `w(x) = 1 - cos(2 pi (x - l) / (r - l))`, normalized to sum 1
//! 5. Note value = `sum_x w(x) * |X(x)|`

use std::f64::consts::PI;
use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};

use super::notes::NoteFrequencySet;
use crate::error::AnalysisError;

/// Numerical stability epsilon
const EPSILON: f64 = 1e-12;

/// FFT bin range and normalized weights for one note
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralWindow {
    /// First FFT bin (inclusive)
    pub left_bin: usize,
    /// Last FFT bin (inclusive), always greater than `left_bin`
    pub right_bin: usize,
    /// One weight per bin in `left_bin..=right_bin`, summing to 1
    pub weights: Vec<f32>,
}

/// Build one spectral window per note
///
/// # Errors
///
/// `ConfigurationError` if a window reaches past the Nyquist bin, or the
/// frame length / sample rate / bandwidth is not positive.
pub fn build_spectral_windows(
    notes: &NoteFrequencySet,
    window_size: usize,
    sample_rate: u32,
    bandwidth: f32,
) -> Result<Vec<SpectralWindow>, AnalysisError> {
    if window_size == 0 || sample_rate == 0 || bandwidth <= 0.0 {
        return Err(AnalysisError::ConfigurationError(format!(
            "Invalid constant-Q parameters: window_size={}, sample_rate={}, bandwidth={}",
            window_size, sample_rate, bandwidth
        )));
    }

    let q = bandwidth as f64 * (2.0f64.powf(1.0 / 12.0) - 1.0);
    let nyquist_bin = window_size / 2;
    let mut windows = Vec::with_capacity(notes.len());

    for &freq in notes.frequencies() {
        let centre = freq as f64 * window_size as f64 / sample_rate as f64;
        let lower = (1.0 - q / 2.0) * centre;
        let upper = (1.0 + q / 2.0) * centre;

        let left_bin = lower.round() as usize;
        let mut right_bin = upper.round() as usize;
        if left_bin == right_bin {
            right_bin += 1;
        }
        if right_bin > nyquist_bin {
            return Err(AnalysisError::ConfigurationError(format!(
                "Constant-Q window for {:.2} Hz ends at bin {}, past Nyquist bin {}",
                freq, right_bin, nyquist_bin
            )));
        }

        let width = upper - lower;
        let raw: Vec<f64> = (left_bin..=right_bin)
            .map(|x| 1.0 - (2.0 * PI * (x as f64 - lower) / width).cos())
            .collect();
        let total: f64 = raw.iter().sum();
        let weights: Vec<f32> = if total > EPSILON {
            raw.iter().map(|&w| (w / total) as f32).collect()
        } else {
            let uniform = 1.0 / raw.len() as f32;
            vec![uniform; raw.len()]
        };

        windows.push(SpectralWindow {
            left_bin,
            right_bin,
            weights,
        });
    }

    log::debug!(
        "Built {} constant-Q windows for N={} at {} Hz",
        windows.len(),
        window_size,
        sample_rate
    );

    Ok(windows)
}

/// FFT + constant-Q spectral estimator
///
/// Holds only immutable tables, so a single instance can serve many threads.
#[derive(Clone)]
pub struct CqtEstimator {
    fft: Arc<dyn RealToComplex<f32>>,
    windows: Vec<SpectralWindow>,
    window_size: usize,
}

impl std::fmt::Debug for CqtEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CqtEstimator")
            .field("window_size", &self.window_size)
            .field("notes", &self.windows.len())
            .finish()
    }
}

impl CqtEstimator {
    /// Plan the FFT and build the note windows
    pub fn new(
        notes: &NoteFrequencySet,
        window_size: usize,
        sample_rate: u32,
        bandwidth: f32,
    ) -> Result<Self, AnalysisError> {
        let windows = build_spectral_windows(notes, window_size, sample_rate, bandwidth)?;
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(window_size);
        Ok(Self {
            fft,
            windows,
            window_size,
        })
    }

    /// Note windows, one per analysed note
    pub fn windows(&self) -> &[SpectralWindow] {
        &self.windows
    }

    /// Number of values produced per frame
    pub fn output_len(&self) -> usize {
        self.windows.len()
    }

    /// Magnitude of the real FFT (`window_size / 2 + 1` bins)
    ///
    /// Shorter frames are zero-padded to the window size.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the frame is longer than the window size.
    pub fn magnitude_spectrum(&self, frame: &[f32]) -> Result<Vec<f32>, AnalysisError> {
        if frame.len() > self.window_size {
            return Err(AnalysisError::InvalidInput(format!(
                "Frame has {} samples, window size is {}",
                frame.len(),
                self.window_size
            )));
        }

        let mut input = self.fft.make_input_vec();
        input[..frame.len()].copy_from_slice(frame);
        let mut output = self.fft.make_output_vec();
        self.fft
            .process(&mut input, &mut output)
            .map_err(|e| AnalysisError::InvalidInput(format!("FFT failed: {}", e)))?;

        Ok(output.iter().map(|c| c.norm()).collect())
    }

    /// Constant-Q values of one (already windowed) frame
    pub fn estimate(&self, frame: &[f32]) -> Result<Vec<f32>, AnalysisError> {
        let magnitudes = self.magnitude_spectrum(frame)?;
        Ok(self
            .windows
            .iter()
            .map(|win| {
                magnitudes[win.left_bin..=win.right_bin]
                    .iter()
                    .zip(&win.weights)
                    .map(|(&m, &w)| m * w)
                    .sum()
            })
            .collect())
    }
}
