//! Rational-ratio downsampling by nearest-index selection

use crate::error::AnalysisError;

/// Downsample a (band-limited) signal
///
/// Output sample `i` is input sample `round(i * source_rate / target_rate)`,
/// for every `i` whose index stays inside the input. The ratio does not need
/// to be integral and no interpolation is performed, so callers must low-pass
/// the signal below the target Nyquist frequency first.
///
/// # Errors
///
/// `InvalidInput` if either rate is zero or `target_rate > source_rate`.
///
/// # Example
///
/// ```
/// use tonal_dsp::preprocessing::resample::downsample;
///
/// let samples: Vec<f32> = (0..100).map(|i| i as f32).collect();
/// let out = downsample(&samples, 44100, 4410)?;
/// assert_eq!(out, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0]);
/// # Ok::<(), tonal_dsp::AnalysisError>(())
/// ```
pub fn downsample(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, AnalysisError> {
    if source_rate == 0 || target_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }
    if target_rate > source_rate {
        return Err(AnalysisError::InvalidInput(format!(
            "Cannot downsample from {} Hz to {} Hz",
            source_rate, target_rate
        )));
    }
    if source_rate == target_rate {
        return Ok(samples.to_vec());
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let capacity = (samples.len() as f64 / ratio).ceil() as usize;
    let mut out = Vec::with_capacity(capacity);
    for i in 0.. {
        let idx = (i as f64 * ratio).round() as usize;
        if idx >= samples.len() {
            break;
        }
        out.push(samples[idx]);
    }

    log::debug!(
        "Downsampled {} -> {} samples ({} Hz -> {} Hz)",
        samples.len(),
        out.len(),
        source_rate,
        target_rate
    );

    Ok(out)
}
