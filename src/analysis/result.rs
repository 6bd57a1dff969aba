//! Analysis result types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{DecisionMethod, SpectralMethod};
use crate::error::AnalysisError;
use crate::features::key::KeyHistogram;

/// Canonical pitch-class names, index = pitch class
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "G#", "A", "Bb", "B",
];

/// Musical key
///
/// Keys map to ordinals 0-23: majors 0-11, minors 12-23, each ordered by
/// pitch class starting from C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Key for an ordinal in 0-23 (values are taken modulo 24)
    ///
    /// # Example
    ///
    /// ```
    /// use tonal_dsp::Key;
    ///
    /// assert_eq!(Key::from_index(9), Key::Major(9));
    /// assert_eq!(Key::from_index(21), Key::Minor(9));
    /// ```
    pub fn from_index(index: usize) -> Self {
        let index = index % 24;
        if index < 12 {
            Key::Major(index as u32)
        } else {
            Key::Minor((index - 12) as u32)
        }
    }

    /// Ordinal in 0-23 (minor keys offset by 12)
    pub fn index(&self) -> usize {
        match self {
            Key::Major(pc) => *pc as usize % 12,
            Key::Minor(pc) => 12 + *pc as usize % 12,
        }
    }

    /// Pitch class of the tonic (0 = C)
    pub fn pitch_class(&self) -> u32 {
        match self {
            Key::Major(pc) | Key::Minor(pc) => pc % 12,
        }
    }

    /// True for minor keys
    pub fn is_minor(&self) -> bool {
        matches!(self, Key::Minor(_))
    }

    /// Get key name in musical notation (e.g., "C", "Am", "F#", "Ebm")
    ///
    /// Returns the canonical spelling:
    /// - Major keys: note name only (e.g., "C", "Eb", "F#", "Bb")
    /// - Minor keys: note name + "m" (e.g., "Am", "C#m", "Ebm")
    ///
    /// # Example
    ///
    /// ```
    /// use tonal_dsp::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C");
    /// assert_eq!(Key::Major(3).name(), "Eb");
    /// assert_eq!(Key::Minor(9).name(), "Am");
    /// assert_eq!(Key::Minor(10).name(), "Bbm");
    /// ```
    pub fn name(&self) -> String {
        let note = PITCH_CLASS_NAMES[self.pitch_class() as usize];
        match self {
            Key::Major(_) => note.to_string(),
            Key::Minor(_) => format!("{}m", note),
        }
    }

    /// Parse a key name
    ///
    /// Accepts the canonical names plus enharmonic spellings (`D#`, `Db`,
    /// `Gb`, `Ab`, `A#`, ...). A trailing `m` marks a minor key.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the name is not a recognised key.
    pub fn from_name(name: &str) -> Result<Self, AnalysisError> {
        let trimmed = name.trim();
        let (note, minor) = match trimmed.strip_suffix('m') {
            Some(note) => (note, true),
            None => (trimmed, false),
        };

        let mut chars = note.chars();
        let base = match chars.next() {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(AnalysisError::InvalidInput(format!("Unknown key name: {:?}", name))),
        };
        let accidental: i32 = match chars.as_str() {
            "" => 0,
            "#" => 1,
            "b" => -1,
            _ => return Err(AnalysisError::InvalidInput(format!("Unknown key name: {:?}", name))),
        };

        let pc = (base + accidental).rem_euclid(12) as u32;
        Ok(if minor { Key::Minor(pc) } else { Key::Major(pc) })
    }

    /// Same tonic, opposite mode
    pub fn parallel(&self) -> Self {
        match *self {
            Key::Major(pc) => Key::Minor(pc),
            Key::Minor(pc) => Key::Major(pc),
        }
    }

    /// Relative key (same key signature, opposite mode)
    ///
    /// # Example
    ///
    /// ```
    /// use tonal_dsp::Key;
    ///
    /// assert_eq!(Key::Major(0).relative(), Key::Minor(9)); // C -> Am
    /// assert_eq!(Key::Minor(9).relative(), Key::Major(0));
    /// ```
    pub fn relative(&self) -> Self {
        match *self {
            Key::Major(pc) => Key::Minor((pc + 9) % 12),
            Key::Minor(pc) => Key::Major((pc + 3) % 12),
        }
    }

    /// All 24 keys in ordinal order
    pub fn all() -> impl Iterator<Item = Key> {
        (0..24).map(Key::from_index)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Key {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::from_name(s)
    }
}

/// Optional per-frame sequences collected alongside the key decision
///
/// - `energies`: short-term energy of every analysed frame, always present
///   after a full analysis
/// - `zero_crossings`: present when `compute_zero_crossings` is enabled
/// - `observations`: best-matching key of every voting frame, present when
///   the bigram decision is used
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameFeatures {
    /// Short-term energy per frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energies: Option<Vec<f32>>,

    /// Zero-crossing count per frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero_crossings: Option<Vec<usize>>,

    /// Per-frame key observations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observations: Option<Vec<Key>>,
}

/// Analysis metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Audio duration in seconds (at the analysis rate)
    pub duration_seconds: f32,

    /// Sample rate the frames were cut at, in Hz
    pub sample_rate: u32,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,

    /// Spectral estimator used
    pub spectral_method: SpectralMethod,

    /// Track-level decision used
    pub decision: DecisionMethod,

    /// Warnings (skipped frames, weak votes, etc.)
    pub warnings: Vec<String>,
}

/// Complete key analysis of one track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyAnalysis {
    /// Detected key
    pub key: Key,

    /// Key confidence (0.0-1.0): vote-histogram margin of `key` over the
    /// strongest other key, relative to the total vote weight
    ///
    /// Under bigram decisions `key` may not lead the histogram; the
    /// confidence is then 0.0.
    pub confidence: f32,

    /// Vote histogram
    pub histogram: KeyHistogram,

    /// Number of frames cut from the signal
    pub frames_analyzed: usize,

    /// Number of frames that cast a vote
    pub frames_voted: usize,

    /// Chroma vector of every analysed frame
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub chroma: Vec<[f32; 12]>,

    /// Optional per-frame sequences
    pub features: FrameFeatures,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}
