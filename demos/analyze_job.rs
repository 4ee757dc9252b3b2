//! Example: Analyze separated stems in one or more job directories
//!
//! Usage:
//!   cargo run --release --example analyze_job -- [--stem NAME|all] [--config FILE] [--jobs N] <dir1> <dir2> ...
//!
//! Each directory must contain stem files named `vocals`, `drums`, `bass`
//! and/or `other` (mp3 or wav). The chord artifact is written to
//! `<dir>/chords.json`. Directories are processed in parallel.

use chordsync::{analyze_job_dir, load_from_json, AnalysisConfig, StemSelection};
use rayon::prelude::*;
use std::env;
use std::path::PathBuf;
use std::time::Instant;

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(1)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut selection = StemSelection::All;
    let mut config_path: Option<PathBuf> = None;
    let mut jobs: Option<usize> = None;
    let mut dirs: Vec<PathBuf> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--stem" => {
                selection = args.first().ok_or("--stem requires a value")?.parse()?;
                args.remove(0);
            }
            "--config" => {
                config_path = Some(args.first().ok_or("--config requires a value")?.into());
                args.remove(0);
            }
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_job [--stem NAME|all] [--config FILE] [--jobs N] <dir1> <dir2> ...\n\
                     \n\
                     --stem NAME   Analyze one stem (vocals, drums, bass, other) or all (default)\n\
                     --config FILE JSON file overriding analysis parameters\n\
                     --jobs N      Parallel workers (default: CPU-1)\n"
                );
                return Ok(());
            }
            _ => dirs.push(a.into()),
        }
    }

    if dirs.is_empty() {
        eprintln!("ERROR: Provide at least one job directory. Use --help for usage.");
        std::process::exit(2);
    }

    let config = match &config_path {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Jobs: {} directories, workers={}, stems={}", dirs.len(), jobs, selection);

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outcomes: Vec<(PathBuf, Result<PathBuf, String>)> = pool.install(|| {
        dirs.par_iter()
            .map(|dir| {
                let outcome = analyze_job_dir(dir, selection, &config).map_err(|e| e.to_string());
                (dir.clone(), outcome)
            })
            .collect()
    });

    let mut failures = 0usize;
    for (dir, outcome) in outcomes {
        match outcome.and_then(|path| load_from_json(&path).map_err(|e| e.to_string())) {
            Ok(result) => {
                let stem = result.primary_stem.map(|s| s.to_string()).unwrap_or_default();
                println!("{} [{}] {:.1}s", dir.display(), stem, result.duration);
                if let Some(err) = &result.error {
                    println!("  error: {}", err);
                }
                for event in &result.events {
                    println!(
                        "  {:>7.2}s  {:<6} ({:.2})",
                        event.time, event.chord, event.confidence
                    );
                }
            }
            Err(e) => {
                failures += 1;
                println!("{} FAILED: {}", dir.display(), e);
            }
        }
    }

    eprintln!(
        "Done in {:.2}s ({} failed)",
        t0.elapsed().as_secs_f32(),
        failures
    );

    Ok(())
}
