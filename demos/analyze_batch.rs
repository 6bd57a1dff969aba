//! Example: Evaluate key detection over a labelled dataset in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- \
//!     [--jobs N] [--json] [--config FILE] <dataset.csv>
//!
//! The dataset is a semicolon-separated file with a header row; the last two
//! columns of every row are the reference key name and the audio file path
//! (e.g. `artist;title;Am;tracks/song.wav`).
//!
//! Notes:
//! - Parallelism is across files (batch-level). Each file analysis is still single-threaded.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.
//! - Unreadable files are reported as skipped and do not stop the run.

use rayon::prelude::*;
use std::env;
use std::path::Path;
use std::time::Instant;
use tonal_dsp::analysis::batch::{BatchReport, DatasetEntry};
use tonal_dsp::{AnalysisConfig, KeyDetector};

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn read_dataset(path: &str) -> Result<Vec<DatasetEntry>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let base = Path::new(path).parent().unwrap_or_else(|| Path::new("."));
    let mut entries = Vec::new();
    for (line_no, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() < 2 {
            eprintln!("line {}: expected at least 2 fields, skipping", line_no + 1);
            continue;
        }
        let key = fields[fields.len() - 2];
        let file = base.join(fields[fields.len() - 1].trim());
        match DatasetEntry::new(key, file) {
            Ok(entry) => entries.push(entry),
            Err(e) => eprintln!("line {}: {}, skipping", line_no + 1, e),
        }
    }
    Ok(entries)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut config_path: Option<String> = None;
    let mut dataset: Option<String> = None;

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--config" => {
                config_path = Some(args.first().ok_or("--config requires a path")?.clone());
                args.remove(0);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_batch [--jobs N] [--json] [--config FILE] <dataset.csv>\n\
                     \n\
                     --jobs N       Parallel workers (default: CPU-1)\n\
                     --json         Emit one JSON object per line (JSONL)\n\
                     --config FILE  TOML analysis configuration\n"
                );
                return Ok(());
            }
            _ => dataset = Some(a),
        }
    }

    let Some(dataset) = dataset else {
        eprintln!("ERROR: Provide a dataset file. Use --help for usage.");
        std::process::exit(2);
    };

    let config = match config_path {
        Some(p) => AnalysisConfig::from_file(p)?,
        None => AnalysisConfig::default(),
    };
    let detector = KeyDetector::new(config)?;
    let entries = read_dataset(&dataset)?;

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} tracks, jobs={}", entries.len(), jobs);

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    // One shared detector; results come back in input order
    let results: Vec<_> = pool.install(|| {
        entries
            .par_iter()
            .map(|entry| detector.detect_file(&entry.path))
            .collect()
    });

    let mut report = BatchReport::new();
    for (entry, result) in entries.iter().zip(results) {
        report.record(entry, result);
    }

    if json {
        for outcome in &report.outcomes {
            println!("{}", serde_json::to_string(outcome)?);
        }
        for skipped in &report.skipped {
            println!("{}", serde_json::to_string(skipped)?);
        }
    } else {
        for (idx, o) in report.outcomes.iter().enumerate() {
            println!(
                "[{}/{}] {}: target={} predicted={} ({}, conf={:.3})",
                idx + 1,
                report.outcomes.len(),
                o.path.display(),
                o.target,
                o.predicted,
                o.category.label(),
                o.confidence
            );
        }
        for s in &report.skipped {
            println!("SKIPPED {}: {}", s.path.display(), s.reason);
        }
        println!("{}", report.counters);
    }

    eprintln!(
        "Done: ok={}/{} skipped={} wall={:.0}ms",
        report.outcomes.len(),
        report.tracks_seen(),
        report.skipped.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}
