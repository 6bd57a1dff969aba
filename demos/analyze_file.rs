//! Example: Analyze a single audio file
//!
//! Usage:
//!   cargo run --example analyze_file -- <file.wav> [config.toml]

use tonal_dsp::{AnalysisConfig, KeyDetector};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: analyze_file <file> [config.toml]")?;

    // Configure analysis
    let config = match args.next() {
        Some(config_path) => AnalysisConfig::from_file(config_path)?,
        None => AnalysisConfig::default(),
    };

    // Analyze
    let detector = KeyDetector::new(config)?;
    let result = detector.detect_file(&path)?;

    // Print results
    println!("Analysis Results:");
    println!("  Key: {} (confidence: {:.2})", result.key, result.confidence);
    println!(
        "  Frames: {} analysed, {} voted",
        result.frames_analyzed, result.frames_voted
    );
    println!("  Method: {:?}", result.metadata.spectral_method);
    println!("  Processing time: {:.2} ms", result.metadata.processing_time_ms);
    for warning in &result.metadata.warnings {
        println!("  Warning: {}", warning);
    }

    Ok(())
}
