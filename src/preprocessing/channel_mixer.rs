//! Channel mixing utilities (multi-channel to mono conversion)

use crate::io::AudioSignal;

/// Convert a signal to mono
///
/// A single-channel signal is returned unchanged; otherwise every output
/// sample is the arithmetic mean of the channels at that index.
///
/// # Example
///
/// ```
/// use tonal_dsp::io::AudioSignal;
/// use tonal_dsp::preprocessing::channel_mixer::mix_to_mono;
///
/// let stereo = AudioSignal::new(44100, vec![vec![1.0, 0.0], vec![0.0, 0.5]])?;
/// assert_eq!(mix_to_mono(stereo), vec![0.5, 0.25]);
/// # Ok::<(), tonal_dsp::AnalysisError>(())
/// ```
pub fn mix_to_mono(signal: AudioSignal) -> Vec<f32> {
    let n_channels = signal.channel_count();
    let mut channels = signal.into_channels();
    if n_channels == 1 {
        return channels.swap_remove(0);
    }

    log::debug!("Mixing {} channels to mono", n_channels);

    let scale = 1.0 / n_channels as f32;
    let mut mono = channels.swap_remove(0);
    for ch in &channels {
        for (m, &s) in mono.iter_mut().zip(ch) {
            *m += s;
        }
    }
    for m in mono.iter_mut() {
        *m *= scale;
    }
    mono
}
