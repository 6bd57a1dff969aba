//! Framing, analysis windows and per-frame energy diagnostics
//!
//! Frames are contiguous `window_size` slices of the preprocessed signal,
//! `hop` samples apart. A trailing partial frame is never produced: a signal
//! of length `n` yields `floor((n - window_size) / hop) + 1` frames, or none
//! when `n < window_size`.

use crate::config::WindowFunction;
use crate::error::AnalysisError;

/// Iterator over fixed-length frames of a signal
///
/// Borrowing and cheap to clone, so iteration can be restarted at any time.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    signal: &'a [f32],
    window_size: usize,
    hop: usize,
    next: usize,
    count: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a [f32];

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let start = self.next * self.hop;
        self.next += 1;
        Some(&self.signal[start..start + self.window_size])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}

/// Number of full frames in a signal of `len` samples
pub fn frame_count(len: usize, window_size: usize, hop: usize) -> usize {
    if window_size == 0 || hop == 0 || len < window_size {
        0
    } else {
        (len - window_size) / hop + 1
    }
}

/// Slice a signal into frames
///
/// # Errors
///
/// `InvalidInput` if `window_size` or `hop` is zero.
///
/// # Example
///
/// ```
/// use tonal_dsp::features::framing::frames;
///
/// let signal: Vec<f32> = (0..10).map(|i| i as f32).collect();
/// let collected: Vec<&[f32]> = frames(&signal, 4, 3)?.collect();
/// assert_eq!(collected.len(), 3);
/// assert_eq!(collected[1], &[3.0, 4.0, 5.0, 6.0][..]);
/// assert_eq!(collected[2], &[6.0, 7.0, 8.0, 9.0][..]);
/// # Ok::<(), tonal_dsp::AnalysisError>(())
/// ```
pub fn frames(signal: &[f32], window_size: usize, hop: usize) -> Result<Frames<'_>, AnalysisError> {
    if window_size == 0 || hop == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid framing: window_size={}, hop={}",
            window_size, hop
        )));
    }
    Ok(Frames {
        signal,
        window_size,
        hop,
        next: 0,
        count: frame_count(signal.len(), window_size, hop),
    })
}

/// Precomputed analysis window
#[derive(Debug, Clone)]
pub struct AnalysisWindow {
    coefficients: Vec<f32>,
}

impl AnalysisWindow {
    /// Build a window of `size` coefficients
    ///
    /// Tapered windows need at least two points; shorter windows are
    /// rectangular.
    pub fn new(function: WindowFunction, size: usize) -> Self {
        let coefficients: Vec<f32> = match function {
            _ if size < 2 => vec![1.0; size],
            WindowFunction::Blackman => apodize::blackman_iter(size).map(|x| x as f32).collect(),
            WindowFunction::Hann => apodize::hanning_iter(size).map(|x| x as f32).collect(),
            WindowFunction::Rectangular => vec![1.0; size],
        };
        Self { coefficients }
    }

    /// Window length
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// True for a zero-length window
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Window coefficients
    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    /// Multiply a frame element-wise by the window
    ///
    /// A frame shorter than the window uses the leading coefficients.
    pub fn apply(&self, frame: &[f32]) -> Vec<f32> {
        frame
            .iter()
            .zip(&self.coefficients)
            .map(|(&s, &w)| s * w)
            .collect()
    }
}

/// Short-term energy: sum of squared samples
pub fn short_term_energy(frame: &[f32]) -> f32 {
    frame.iter().map(|&x| x * x).sum()
}

/// Number of sign changes between consecutive samples
///
/// Sign is taken from the sign bit, so `-0.0` counts as negative.
pub fn zero_crossings(frame: &[f32]) -> usize {
    frame
        .windows(2)
        .filter(|w| w[0].is_sign_negative() != w[1].is_sign_negative())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_formula() {
        assert_eq!(frame_count(16384, 16384, 16384), 1);
        assert_eq!(frame_count(16383, 16384, 16384), 0);
        assert_eq!(frame_count(40000, 16384, 16384), 2);
        assert_eq!(frame_count(40000, 16384, 8192), 3);
        assert_eq!(frame_count(10, 4, 1), 7);
    }

    #[test]
    fn test_frames_exact_size_and_restart() {
        let signal: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let iter = frames(&signal, 32, 16).unwrap();
        assert_eq!(iter.len(), 5);

        let first_pass: Vec<f32> = iter.clone().map(|f| f[0]).collect();
        let second_pass: Vec<f32> = iter.map(|f| f[0]).collect();
        assert_eq!(first_pass, vec![0.0, 16.0, 32.0, 48.0, 64.0]);
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn test_frames_short_signal() {
        let signal = vec![0.0f32; 10];
        assert_eq!(frames(&signal, 16, 16).unwrap().count(), 0);
        assert!(frames(&signal, 0, 16).is_err());
        assert!(frames(&signal, 4, 0).is_err());
    }

    #[test]
    fn test_windows() {
        let blackman = AnalysisWindow::new(WindowFunction::Blackman, 65);
        assert_eq!(blackman.len(), 65);
        let mid = blackman.coefficients()[32];
        assert!((mid - 1.0).abs() < 1e-3, "Blackman centre {}", mid);
        assert!(blackman.coefficients()[0].abs() < 1e-3);

        let hann = AnalysisWindow::new(WindowFunction::Hann, 65);
        assert!((hann.coefficients()[32] - 1.0).abs() < 1e-3);

        let rect = AnalysisWindow::new(WindowFunction::Rectangular, 4);
        assert_eq!(rect.apply(&[1.0, 2.0, 3.0, 4.0]), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_degenerate_window_sizes() {
        for function in [WindowFunction::Blackman, WindowFunction::Hann] {
            let single = AnalysisWindow::new(function, 1);
            assert_eq!(single.coefficients(), &[1.0]);
            assert_eq!(single.apply(&[0.25]), vec![0.25]);
            assert!(AnalysisWindow::new(function, 0).is_empty());
            assert_eq!(AnalysisWindow::new(function, 2).len(), 2);
        }
    }

    #[test]
    fn test_energy_and_zero_crossings() {
        let frame = [1.0, -1.0, 2.0, 2.0, -0.5];
        assert_eq!(short_term_energy(&frame), 1.0 + 1.0 + 4.0 + 4.0 + 0.25);
        assert_eq!(zero_crossings(&frame), 3);
        assert_eq!(zero_crossings(&[0.5]), 0);
        assert_eq!(zero_crossings(&[]), 0);
    }
}
