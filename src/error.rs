//! Error types for the key detection engine

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during key analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Invalid input parameters (empty buffers, mismatched lengths, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Audio does not have the configured sample rate or channel layout
    #[error("Unsupported audio format: {0}")]
    UnsupportedAudioFormat(String),

    /// File could not be opened or read
    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Audio container or codec error
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Numerically undefined computation (zero variance, zero denominator,
    /// unstable filter design). Local to the frame or stage that raised it.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Configuration invariant violated
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl AnalysisError {
    /// True for failures that only concern a single frame and should be
    /// skipped rather than abort the track.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, AnalysisError::DegenerateInput(_))
    }
}
