//! Decoded PCM signal

use crate::error::AnalysisError;

/// Planar PCM audio at a known sample rate
///
/// Samples are `f32` normalized to [-1.0, 1.0]. Every channel has the same
/// length.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioSignal {
    /// Build a signal from planar channel buffers.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if there are no channels, the sample rate is zero, or
    /// the channels differ in length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
        }
        let Some(first) = channels.first() else {
            return Err(AnalysisError::InvalidInput("Signal has no channels".to_string()));
        };
        let len = first.len();
        if let Some((i, ch)) = channels.iter().enumerate().find(|(_, ch)| ch.len() != len) {
            return Err(AnalysisError::InvalidInput(format!(
                "Channel {} has {} samples, expected {}",
                i,
                ch.len(),
                len
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Single-channel signal.
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Result<Self, AnalysisError> {
        Self::new(sample_rate, vec![samples])
    }

    /// De-interleave `[l0, r0, l1, r1, ...]` style buffers.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(
        sample_rate: u32,
        channel_count: usize,
        interleaved: &[f32],
    ) -> Result<Self, AnalysisError> {
        if channel_count == 0 {
            return Err(AnalysisError::InvalidInput("Channel count is zero".to_string()));
        }
        let frames = interleaved.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Self::new(sample_rate, channels)
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// True if the signal holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.len() as f32 / self.sample_rate as f32
    }

    /// Planar channel data
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Consume the signal, returning its channel buffers
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Fail fast unless the signal matches the expected rate and layout.
    ///
    /// # Errors
    ///
    /// `UnsupportedAudioFormat` naming the mismatching property.
    pub fn ensure_format(&self, sample_rate: u32, channel_count: u16) -> Result<(), AnalysisError> {
        if self.sample_rate != sample_rate {
            return Err(AnalysisError::UnsupportedAudioFormat(format!(
                "sample rate {} Hz, expected {} Hz",
                self.sample_rate, sample_rate
            )));
        }
        if self.channel_count() != channel_count as usize {
            return Err(AnalysisError::UnsupportedAudioFormat(format!(
                "{} channel(s), expected {}",
                self.channel_count(),
                channel_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_interleaved() {
        let interleaved = [1.0, -1.0, 0.5, -0.5, 0.25];
        let signal = AudioSignal::from_interleaved(44100, 2, &interleaved).unwrap();
        assert_eq!(signal.channel_count(), 2);
        assert_eq!(signal.len(), 2);
        assert_eq!(signal.channels()[0], vec![1.0, 0.5]);
        assert_eq!(signal.channels()[1], vec![-1.0, -0.5]);
    }

    #[test]
    fn test_mismatched_channels() {
        let result = AudioSignal::new(44100, vec![vec![0.0; 4], vec![0.0; 3]]);
        assert!(result.is_err());
        assert!(AudioSignal::new(44100, vec![]).is_err());
        assert!(AudioSignal::mono(0, vec![0.0]).is_err());
    }

    #[test]
    fn test_ensure_format() {
        let signal = AudioSignal::new(44100, vec![vec![0.0; 10], vec![0.0; 10]]).unwrap();
        assert!(signal.ensure_format(44100, 2).is_ok());
        assert!(matches!(
            signal.ensure_format(48000, 2),
            Err(AnalysisError::UnsupportedAudioFormat(_))
        ));
        assert!(matches!(
            signal.ensure_format(44100, 1),
            Err(AnalysisError::UnsupportedAudioFormat(_))
        ));
    }

    #[test]
    fn test_duration() {
        let signal = AudioSignal::mono(4410, vec![0.0; 8820]).unwrap();
        assert!((signal.duration_seconds() - 2.0).abs() < 1e-6);
    }
}
