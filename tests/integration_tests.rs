//! Integration tests for the key detection engine

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use tonal_dsp::analysis::batch::{evaluate_batch, DatasetEntry};
use tonal_dsp::analysis::evaluation::MatchCategory;
use tonal_dsp::config::{DecisionMethod, SpectralMethod};
use tonal_dsp::{AnalysisConfig, AnalysisError, Key, KeyDetector};

/// Write a 16-bit WAV of summed sinusoids, same signal on every channel
fn write_tone_wav(path: &Path, freqs: &[f32], sample_rate: u32, channels: u16, seconds: f32) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    let amplitude = 0.8 / freqs.len() as f32;
    let frames = (sample_rate as f32 * seconds) as usize;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let value: f32 = freqs.iter().map(|f| amplitude * (2.0 * PI * f * t).sin()).sum();
        let sample = (value * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(sample).expect("write sample");
        }
    }
    writer.finalize().expect("finalize wav");
}

fn tone_file(dir: &Path, name: &str, freqs: &[f32]) -> PathBuf {
    let path = dir.join(name);
    write_tone_wav(&path, freqs, 44100, 2, 8.0);
    path
}

const A_MAJOR_TRIAD: [f32; 3] = [440.0, 554.37, 659.26];
const C_MAJOR_TRIAD: [f32; 3] = [261.63, 329.63, 392.0];

#[test]
fn test_sine_file_detects_a() {
    let dir = tempfile::tempdir().unwrap();
    let path = tone_file(dir.path(), "a440.wav", &[440.0]);

    let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
    let analysis = detector.detect_file(&path).expect("analysis should succeed");

    assert_eq!(analysis.key.pitch_class(), 9, "expected A or Am, got {}", analysis.key);
    // 8 s at 4410 Hz = 35280 samples -> two 16384-sample frames
    assert_eq!(analysis.frames_analyzed, 2);
    assert!(analysis.metadata.duration_seconds > 7.9 && analysis.metadata.duration_seconds < 8.1);
    assert_eq!(analysis.metadata.sample_rate, 4410);
}

#[test]
fn test_a_major_triad() {
    let dir = tempfile::tempdir().unwrap();
    let path = tone_file(dir.path(), "a_major.wav", &A_MAJOR_TRIAD);

    let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
    let analysis = detector.detect_file(&path).unwrap();
    assert_eq!(analysis.key, Key::Major(9));
    assert_eq!(analysis.key.name(), "A");
}

#[test]
fn test_lomb_scargle_triad() {
    let dir = tempfile::tempdir().unwrap();
    let path = tone_file(dir.path(), "a_major.wav", &A_MAJOR_TRIAD);

    let config = AnalysisConfig {
        spectral_method: SpectralMethod::LombScargle,
        hop_size: 8192,
        ..AnalysisConfig::default()
    };
    let detector = KeyDetector::new(config).unwrap();
    let analysis = detector.detect_file(&path).unwrap();
    assert_eq!(analysis.key, Key::Major(9));
    assert_eq!(analysis.frames_analyzed, 3);
}

#[test]
fn test_bigram_decision_on_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = tone_file(dir.path(), "c_major.wav", &C_MAJOR_TRIAD);

    let config = AnalysisConfig {
        decision: DecisionMethod::Bigram,
        ..AnalysisConfig::default()
    };
    let detector = KeyDetector::new(config).unwrap();
    let analysis = detector.detect_file(&path).unwrap();
    assert_eq!(analysis.key, Key::Major(0));
    let observations = analysis.features.observations.expect("observations recorded");
    assert_eq!(observations.len(), analysis.frames_voted);
}

#[test]
fn test_wrong_format_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mono22k.wav");
    write_tone_wav(&path, &[440.0], 22050, 1, 1.0);

    let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
    let result = detector.detect_file(&path);
    assert!(matches!(result, Err(AnalysisError::UnsupportedAudioFormat(_))));
}

#[test]
fn test_missing_file() {
    let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
    let result = detector.detect_file("/nonexistent/track.wav");
    assert!(matches!(result, Err(AnalysisError::IoFailure { .. })));
}

#[test]
fn test_batch_skips_unreadable_tracks() {
    let dir = tempfile::tempdir().unwrap();
    let a_major = tone_file(dir.path(), "a_major.wav", &A_MAJOR_TRIAD);
    let c_major = tone_file(dir.path(), "c_major.wav", &C_MAJOR_TRIAD);

    let entries = vec![
        DatasetEntry::new("A", &a_major).unwrap(),
        DatasetEntry::new("Am", &c_major).unwrap(),
        DatasetEntry::new("G", dir.path().join("missing.wav")).unwrap(),
    ];

    let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
    let report = evaluate_batch(&detector, &entries);

    assert_eq!(report.tracks_seen(), 3);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("missing.wav"));
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].category, MatchCategory::Exact);
    assert_eq!(report.outcomes[1].category, MatchCategory::Relative);
    assert_eq!(report.counters.total(), 2);
    assert!((report.counters.accuracy() - 0.5).abs() < 1e-6);
}

#[test]
fn test_batch_survives_tiny_track() {
    let dir = tempfile::tempdir().unwrap();
    let a_major = tone_file(dir.path(), "a_major.wav", &A_MAJOR_TRIAD);
    // A handful of frames downsamples to a single sample
    let tiny = dir.path().join("tiny.wav");
    write_tone_wav(&tiny, &[440.0], 44100, 2, 8.0 / 44100.0);

    let entries = vec![
        DatasetEntry::new("C", &tiny).unwrap(),
        DatasetEntry::new("G", dir.path().join("missing.wav")).unwrap(),
        DatasetEntry::new("A", &a_major).unwrap(),
    ];

    let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
    let report = evaluate_batch(&detector, &entries);

    assert_eq!(report.tracks_seen(), 3);
    assert!(report.skipped.iter().any(|s| s.path.ends_with("missing.wav")));
    let last = report.outcomes.last().expect("A major track analysed");
    assert!(last.path.ends_with("a_major.wav"));
    assert_eq!(last.category, MatchCategory::Exact);
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tonal.toml");
    std::fs::write(
        &path,
        "spectral_method = \"lomb_scargle\"\nvote_weighting = \"log_energy\"\nhop_size = 8192\n",
    )
    .unwrap();

    let config = AnalysisConfig::from_file(&path).unwrap();
    assert_eq!(config.spectral_method, SpectralMethod::LombScargle);
    assert_eq!(config.hop_size, 8192);
    assert!(KeyDetector::new(config).is_ok());
}

#[test]
fn test_analysis_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = tone_file(dir.path(), "a440.wav", &[440.0]);

    let detector = KeyDetector::new(AnalysisConfig::default()).unwrap();
    let analysis = detector.detect_file(&path).unwrap();
    let json = serde_json::to_value(&analysis).unwrap();

    assert!(json.get("key").is_some());
    assert!(json.get("histogram").is_some());
    assert_eq!(json["metadata"]["spectral_method"], "cqt");
    assert_eq!(json["frames_analyzed"], 2);
}
