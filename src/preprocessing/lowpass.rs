//! Butterworth low-pass filtering
//!
//! Digital IIR Butterworth low-pass of arbitrary order, designed with the
//! bilinear transform (cutoff pre-warped) and realised as a cascade of
//! second-order sections, plus one first-order section for odd orders.
//! Cascading keeps high orders numerically stable at cutoffs far below
//! Nyquist, where a single direct-form polynomial would not be.
//!
//! # Example
//!
//! ```
//! use tonal_dsp::preprocessing::lowpass::lowpass;
//!
//! let samples = vec![1.0f32; 4410];
//! let filtered = lowpass(&samples, 2205.0, 5, 44100)?;
//! assert!((filtered[4409] - 1.0).abs() < 1e-3);
//! # Ok::<(), tonal_dsp::AnalysisError>(())
//! ```

use std::f64::consts::PI;

use rustfft::num_complex::Complex64;

use crate::error::AnalysisError;

/// One first- or second-order IIR section, Direct Form II transposed
#[derive(Debug, Clone)]
struct Section {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Section {
    /// Second-order section for the analog prototype `1 / (s^2 + a s + 1)`
    fn second_order(k: f64, a: f64) -> Self {
        let k2 = k * k;
        let norm = 1.0 / (1.0 + a * k + k2);
        let b0 = k2 * norm;
        Self {
            b0,
            b1: 2.0 * b0,
            b2: b0,
            a1: 2.0 * (k2 - 1.0) * norm,
            a2: (1.0 - a * k + k2) * norm,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// First-order section for the analog prototype `1 / (s + 1)`
    fn first_order(k: f64) -> Self {
        let norm = 1.0 / (1.0 + k);
        Self {
            b0: k * norm,
            b1: k * norm,
            b2: 0.0,
            a1: (k - 1.0) * norm,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = self.b0 + z_inv * self.b1 + z_inv2 * self.b2;
        let den = 1.0 + z_inv * self.a1 + z_inv2 * self.a2;
        num / den
    }

    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Cascaded Butterworth low-pass filter
#[derive(Debug, Clone)]
pub struct ButterworthLowpass {
    sections: Vec<Section>,
    sample_rate: f64,
}

impl ButterworthLowpass {
    /// Design a low-pass filter
    ///
    /// # Arguments
    ///
    /// * `order` - Filter order (>= 1)
    /// * `cutoff_hz` - -3 dB frequency, strictly between 0 and Nyquist
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Errors
    ///
    /// `DegenerateInput` if the order is zero or the cutoff is outside
    /// (0, Nyquist); the bilinear design is singular there.
    pub fn new(order: usize, cutoff_hz: f32, sample_rate: u32) -> Result<Self, AnalysisError> {
        if order == 0 {
            return Err(AnalysisError::DegenerateInput(
                "Butterworth order must be at least 1".to_string(),
            ));
        }
        let fs = sample_rate as f64;
        let fc = cutoff_hz as f64;
        let nyquist = fs / 2.0;
        if !(fc > 0.0 && fc < nyquist) {
            return Err(AnalysisError::DegenerateInput(format!(
                "Low-pass cutoff {} Hz must lie in (0, {}) Hz",
                cutoff_hz, nyquist
            )));
        }

        // Pre-warped analog cutoff, expressed for the normalized prototype
        let k = (PI * fc / fs).tan();

        let mut sections = Vec::with_capacity(order.div_ceil(2));
        for i in 0..order / 2 {
            let a = 2.0 * (PI * (2 * i + 1) as f64 / (2 * order) as f64).sin();
            sections.push(Section::second_order(k, a));
        }
        if order % 2 == 1 {
            sections.push(Section::first_order(k));
        }

        log::debug!(
            "Designed order-{} Butterworth low-pass at {} Hz ({} sections)",
            order,
            cutoff_hz,
            sections.len()
        );

        Ok(Self {
            sections,
            sample_rate: fs,
        })
    }

    /// Filter one sample
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let mut y = sample as f64;
        for section in self.sections.iter_mut() {
            y = section.process(y);
        }
        y as f32
    }

    /// Filter a whole buffer, starting from the current state
    pub fn filter(&mut self, samples: &[f32]) -> Vec<f32> {
        samples.iter().map(|&s| self.process(s)).collect()
    }

    /// Magnitude response at `freq_hz`
    pub fn magnitude_at(&self, freq_hz: f32) -> f32 {
        let w = 2.0 * PI * freq_hz as f64 / self.sample_rate;
        let z_inv = Complex64::from_polar(1.0, -w);
        let h = self
            .sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z_inv));
        h.norm() as f32
    }

    /// Clear filter state
    pub fn reset(&mut self) {
        for section in self.sections.iter_mut() {
            section.reset();
        }
    }
}

/// Low-pass filter a signal from rest
///
/// # Errors
///
/// See [`ButterworthLowpass::new`].
pub fn lowpass(
    samples: &[f32],
    cutoff_hz: f32,
    order: usize,
    sample_rate: u32,
) -> Result<Vec<f32>, AnalysisError> {
    let mut filter = ButterworthLowpass::new(order, cutoff_hz, sample_rate)?;
    Ok(filter.filter(samples))
}
