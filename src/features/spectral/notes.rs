//! Musical note frequencies

use crate::error::AnalysisError;

/// Frequency of a (possibly fractional) MIDI note, A4 = 69 = 440 Hz
pub fn midi_to_hz(note: f32) -> f32 {
    440.0 * 2.0f32.powf((note - 69.0) / 12.0)
}

/// Nearest MIDI note of a frequency
pub fn hz_to_midi(freq: f32) -> f32 {
    (69.0 + 12.0 * (freq / 440.0).log2()).round()
}

/// Semitone-spaced analysis frequencies
///
/// Covers MIDI notes `min_midi_note..max_midi_note` (half-open), so index
/// `octave * 12 + j` is note `min_midi_note + octave * 12 + j`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteFrequencySet {
    min_midi_note: u8,
    frequencies: Vec<f32>,
}

impl NoteFrequencySet {
    /// Build the set for a MIDI range spanning whole octaves
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if the range is empty or not a multiple of 12
    /// semitones.
    pub fn new(min_midi_note: u8, max_midi_note: u8) -> Result<Self, AnalysisError> {
        if max_midi_note <= min_midi_note || (max_midi_note - min_midi_note) % 12 != 0 {
            return Err(AnalysisError::ConfigurationError(format!(
                "MIDI range {}..{} is not a whole number of octaves",
                min_midi_note, max_midi_note
            )));
        }
        let frequencies = (min_midi_note..max_midi_note)
            .map(|n| midi_to_hz(n as f32))
            .collect();
        Ok(Self {
            min_midi_note,
            frequencies,
        })
    }

    /// Lowest note of the set
    pub fn min_midi_note(&self) -> u8 {
        self.min_midi_note
    }

    /// Number of octaves
    pub fn octave_count(&self) -> usize {
        self.frequencies.len() / 12
    }

    /// Frequencies in Hz, ascending
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Number of notes
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Always false for a constructed set
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}
