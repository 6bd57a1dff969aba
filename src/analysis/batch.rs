//! Dataset evaluation driver
//!
//! Runs the detector over labelled tracks and tallies the outcomes. A track
//! that cannot be loaded or analysed is recorded as skipped and never stops
//! the run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::evaluation::{EvaluationCounters, MatchCategory};
use super::result::{Key, KeyAnalysis};
use crate::error::AnalysisError;
use crate::KeyDetector;

/// One labelled track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    /// Reference key
    pub target: Key,
    /// Audio file
    pub path: PathBuf,
}

impl DatasetEntry {
    /// Entry from a key name and a path
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the key name is not recognised.
    pub fn new<P: Into<PathBuf>>(target: &str, path: P) -> Result<Self, AnalysisError> {
        Ok(Self {
            target: Key::from_name(target)?,
            path: path.into(),
        })
    }
}

/// Result of one analysed track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackOutcome {
    /// Audio file
    pub path: PathBuf,
    /// Reference key
    pub target: Key,
    /// Detected key
    pub predicted: Key,
    /// Error class of the prediction
    pub category: MatchCategory,
    /// Detector confidence
    pub confidence: f32,
}

/// Track that produced no prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedTrack {
    /// Audio file
    pub path: PathBuf,
    /// Why it was skipped
    pub reason: String,
}

/// Outcome of a dataset run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Category tally over analysed tracks
    pub counters: EvaluationCounters,
    /// Per-track results, in input order
    pub outcomes: Vec<TrackOutcome>,
    /// Tracks that failed to load or analyse
    pub skipped: Vec<SkippedTrack>,
}

impl BatchReport {
    /// Empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one track result into the report
    ///
    /// Returns the prediction category, or `None` if the track was skipped.
    pub fn record(
        &mut self,
        entry: &DatasetEntry,
        result: Result<KeyAnalysis, AnalysisError>,
    ) -> Option<MatchCategory> {
        match result {
            Ok(analysis) => {
                let category = self.counters.record(analysis.key, entry.target);
                self.outcomes.push(TrackOutcome {
                    path: entry.path.clone(),
                    target: entry.target,
                    predicted: analysis.key,
                    category,
                    confidence: analysis.confidence,
                });
                Some(category)
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", entry.path.display(), e);
                self.skipped.push(SkippedTrack {
                    path: entry.path.clone(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Number of tracks seen, analysed or skipped
    pub fn tracks_seen(&self) -> usize {
        self.outcomes.len() + self.skipped.len()
    }
}

/// Analyse every entry and tally predictions against targets
///
/// Tracks are processed one after another; failures (missing file, wrong
/// format, no voting frame) land in [`BatchReport::skipped`].
///
/// # Example
///
/// ```no_run
/// use tonal_dsp::analysis::batch::{evaluate_batch, DatasetEntry};
/// use tonal_dsp::{AnalysisConfig, KeyDetector};
///
/// let detector = KeyDetector::new(AnalysisConfig::default())?;
/// let entries = vec![DatasetEntry::new("Am", "song.wav")?];
/// let report = evaluate_batch(&detector, &entries);
/// println!("{}", report.counters);
/// # Ok::<(), tonal_dsp::AnalysisError>(())
/// ```
pub fn evaluate_batch(detector: &KeyDetector, entries: &[DatasetEntry]) -> BatchReport {
    let mut report = BatchReport::new();
    for (i, entry) in entries.iter().enumerate() {
        let result = detector.detect_file(&entry.path);
        if let Some(category) = report.record(entry, result) {
            log::debug!(
                "[{}/{}] {}: target {} -> {}",
                i + 1,
                entries.len(),
                entry.path.display(),
                entry.target,
                category.label()
            );
        }
    }
    log::debug!(
        "Batch finished: {} analysed, {} skipped",
        report.outcomes.len(),
        report.skipped.len()
    );
    report
}
