//! Lomb-Scargle periodogram at musical note frequencies
//!
//! Least-squares spectral estimate evaluated directly at the analysed note
//! frequencies instead of FFT bins. Everything that does not depend on the
//! signal (time delays, shifted cosine/sine bases and their squared sums) is
//! computed once per configuration and shared by all frames.
//!
//! # Reference
//!
//! Lomb, N. R. (1976). Least-squares frequency analysis of unequally spaced data.
//! *Astrophysics and Space Science*, 39, 447-462.
//!
//! Scargle, J. D. (1982). Studies in astronomical time series analysis. II.
//! *The Astrophysical Journal*, 263, 835-853.
//!
//! # Algorithm
//!
//! With `w = 2 pi f / fs` and sample index `t`:
//! - `tau = atan(sum sin(w t) / sum cos(w t)) / w`
//! - `P = 0.5 * [ (sum x cos(w (t - tau)))^2 / sum cos^2(w (t - tau))
//!              + (sum x sin(w (t - tau)))^2 / sum sin^2(w (t - tau)) ]`

use std::f64::consts::PI;

use super::notes::NoteFrequencySet;
use crate::error::AnalysisError;

/// Denominators below this are treated as zero
const EPSILON: f64 = 1e-9;

/// Precomputed basis for one query frequency
#[derive(Debug, Clone)]
struct NoteBasis {
    tau: f64,
    cos: Vec<f32>,
    sin: Vec<f32>,
    cos_sq: f64,
    sin_sq: f64,
}

/// Time delay `tau` for a query frequency over `window_size` samples
pub fn time_delay(freq: f32, sample_rate: u32, window_size: usize) -> f64 {
    let w = 2.0 * PI * freq as f64 / sample_rate as f64;
    let (sin_sum, cos_sum) = (0..window_size).fold((0.0f64, 0.0f64), |(s, c), t| {
        let phase = w * t as f64;
        (s + phase.sin(), c + phase.cos())
    });
    let tau = (sin_sum / cos_sum).atan() / w;
    if tau.is_finite() {
        tau
    } else {
        0.0
    }
}

/// Lomb-Scargle spectral estimator
#[derive(Debug, Clone)]
pub struct LombScargleEstimator {
    frequencies: Vec<f32>,
    window_size: usize,
    bases: Vec<NoteBasis>,
}

impl LombScargleEstimator {
    /// Precompute bases for every note of the set
    pub fn new(
        notes: &NoteFrequencySet,
        window_size: usize,
        sample_rate: u32,
    ) -> Result<Self, AnalysisError> {
        Self::with_frequencies(notes.frequencies(), window_size, sample_rate)
    }

    /// Precompute bases for arbitrary query frequencies
    ///
    /// # Errors
    ///
    /// `ConfigurationError` on a zero window size or sample rate.
    pub fn with_frequencies(
        frequencies: &[f32],
        window_size: usize,
        sample_rate: u32,
    ) -> Result<Self, AnalysisError> {
        if window_size == 0 || sample_rate == 0 {
            return Err(AnalysisError::ConfigurationError(format!(
                "Invalid Lomb-Scargle parameters: window_size={}, sample_rate={}",
                window_size, sample_rate
            )));
        }

        let bases = frequencies
            .iter()
            .map(|&freq| {
                let w = 2.0 * PI * freq as f64 / sample_rate as f64;
                let tau = time_delay(freq, sample_rate, window_size);
                let mut cos = Vec::with_capacity(window_size);
                let mut sin = Vec::with_capacity(window_size);
                let (mut cos_sq, mut sin_sq) = (0.0f64, 0.0f64);
                for t in 0..window_size {
                    let phase = w * (t as f64 - tau);
                    let (s, c) = phase.sin_cos();
                    cos.push(c as f32);
                    sin.push(s as f32);
                    cos_sq += c * c;
                    sin_sq += s * s;
                }
                NoteBasis {
                    tau,
                    cos,
                    sin,
                    cos_sq,
                    sin_sq,
                }
            })
            .collect();

        log::debug!(
            "Precomputed Lomb-Scargle bases for {} frequencies, N={}",
            frequencies.len(),
            window_size
        );

        Ok(Self {
            frequencies: frequencies.to_vec(),
            window_size,
            bases,
        })
    }

    /// Query frequencies in Hz
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Precomputed time delays, one per frequency
    pub fn taus(&self) -> Vec<f64> {
        self.bases.iter().map(|b| b.tau).collect()
    }

    /// Number of values produced per frame
    pub fn output_len(&self) -> usize {
        self.bases.len()
    }

    /// Periodogram power at every query frequency
    ///
    /// Frames shorter than the window use the first `frame.len()` samples of
    /// each basis; longer frames are truncated to the window size.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty frame
    /// - `DegenerateInput` if a basis has (numerically) zero energy over the
    ///   frame, which leaves the power undefined
    pub fn estimate(&self, frame: &[f32]) -> Result<Vec<f32>, AnalysisError> {
        if frame.is_empty() {
            return Err(AnalysisError::InvalidInput("Empty frame".to_string()));
        }
        let n = frame.len().min(self.window_size);
        let psi = &frame[..n];

        self.bases
            .iter()
            .zip(&self.frequencies)
            .map(|(basis, &freq)| {
                let (cos, sin) = (&basis.cos[..n], &basis.sin[..n]);
                let (cos_sq, sin_sq) = if n == self.window_size {
                    (basis.cos_sq, basis.sin_sq)
                } else {
                    (sum_of_squares(cos), sum_of_squares(sin))
                };
                if cos_sq < EPSILON || sin_sq < EPSILON {
                    return Err(AnalysisError::DegenerateInput(format!(
                        "Lomb-Scargle denominator vanishes at {:.2} Hz over {} samples",
                        freq, n
                    )));
                }
                let num_cos = dot(psi, cos);
                let num_sin = dot(psi, sin);
                let power = 0.5 * (num_cos * num_cos / cos_sq + num_sin * num_sin / sin_sq);
                Ok(power as f32)
            })
            .collect()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| x as f64 * y as f64).sum()
}

fn sum_of_squares(a: &[f32]) -> f64 {
    a.iter().map(|&x| x as f64 * x as f64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    fn argmax(values: &[f32]) -> usize {
        let mut best = 0;
        for (i, &v) in values.iter().enumerate() {
            if v > values[best] {
                best = i;
            }
        }
        best
    }

    #[test]
    fn test_time_delay_formula() {
        let (freq, fs, n) = (100.0f32, 4410u32, 1000usize);
        let w = 2.0 * PI * freq as f64 / fs as f64;
        let s: f64 = (0..n).map(|t| (w * t as f64).sin()).sum();
        let c: f64 = (0..n).map(|t| (w * t as f64).cos()).sum();
        let expected = (s / c).atan() / w;
        assert!((time_delay(freq, fs, n) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_sine_peaks_at_its_note() {
        let notes = NoteFrequencySet::new(9, 81).unwrap();
        let estimator = LombScargleEstimator::new(&notes, 4096, 4410).unwrap();
        let values = estimator.estimate(&sine(440.0, 4410.0, 4096)).unwrap();
        assert_eq!(values.len(), 72);
        assert_eq!(argmax(&values), 60);
        assert!(values.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_power_of_unit_sine() {
        // A full-amplitude sinusoid at the query frequency has power ~ N / 4
        let estimator = LombScargleEstimator::with_frequencies(&[441.0], 4410, 4410).unwrap();
        let power = estimator.estimate(&sine(441.0, 4410.0, 4410)).unwrap()[0];
        let expected = 4410.0 / 4.0;
        assert!(
            (power - expected).abs() / expected < 0.01,
            "power {} expected {}",
            power,
            expected
        );
    }

    #[test]
    fn test_short_frame_truncates_basis() {
        let notes = NoteFrequencySet::new(9, 81).unwrap();
        let estimator = LombScargleEstimator::new(&notes, 4096, 4410).unwrap();
        let values = estimator.estimate(&sine(440.0, 4410.0, 3000)).unwrap();
        assert_eq!(argmax(&values), 60);

        let longer = estimator.estimate(&sine(440.0, 4410.0, 5000)).unwrap();
        let exact = estimator.estimate(&sine(440.0, 4410.0, 4096)).unwrap();
        assert_eq!(longer, exact);

        assert!(estimator.estimate(&[]).is_err());
    }

    #[test]
    fn test_zero_frequency_is_degenerate() {
        let estimator = LombScargleEstimator::with_frequencies(&[0.0], 128, 4410).unwrap();
        let result = estimator.estimate(&[1.0; 128]);
        assert!(matches!(result, Err(AnalysisError::DegenerateInput(_))));
    }
}
