//! # ChordSync
//!
//! Chord recognition for separated music stems, producing a time-ordered
//! sequence of chord-change events for playback overlays.
//!
//! ## Features
//!
//! - **Chroma Extraction**: Spectral peaks mapped onto constant-Q semitone bins and folded into 12 pitch classes
//! - **Chord Matching**: Pearson correlation against ten binary chord templates at every root
//! - **Change Detection**: Fixed 2 s segments, emitted only on label change above a confidence gate
//! - **Stem Fusion**: Picks the most harmonic stem (other, bass, vocals, drums) with a fallback
//!
//! ## Quick Start
//!
//! ```no_run
//! use chordsync::{analyze_audio, AnalysisConfig};
//!
//! // Mono samples, f32 in [-1.0, 1.0]
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let sample_rate = 22050;
//!
//! let result = analyze_audio(&samples, sample_rate, &AnalysisConfig::default());
//!
//! for event in &result.events {
//!     println!("{:>7.2}s  {:<6} ({:.2})", event.time, event.chord, event.confidence);
//! }
//! ```
//!
//! ## Architecture
//!
//! The analysis pipeline follows this flow:
//!
//! ```text
//! Stem files → Decoding → Chroma Frames → Segments → Chord Matches → Events → chords.json
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

use std::path::Path;

// Re-export main types
pub use analysis::job::{analyze_job, analyze_job_dir, StemSelection};
pub use analysis::result::{AnalysisResult, ChordEvent};
pub use analysis::sequencer::ChordSequencer;
pub use analysis::stems::{fuse_stems, fuse_stems_parallel, probe_stems, Stem, StemSet};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use io::artifact::{load_from_json, save_to_json};
pub use io::decoder::AudioFile;
pub use io::source::{AudioInput, AudioSource};

/// Main analysis function
///
/// Analyzes mono samples and returns the chord-change events.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (any rate > 0; bins are computed for it)
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// `AnalysisResult` with the chord events. This never fails: an invalid
/// sample rate or configuration produces a result with `error` set, no events
/// and duration 0.
///
/// # Example
///
/// ```
/// use chordsync::{analyze_audio, AnalysisConfig};
///
/// let samples = vec![0.0f32; 22050 * 4]; // 4 seconds of silence
/// let result = analyze_audio(&samples, 22050, &AnalysisConfig::default());
/// assert_eq!(result.events.len(), 1);
/// assert_eq!(result.events[0].chord, "C");
/// ```
pub fn analyze_audio(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> AnalysisResult {
    log::debug!(
        "Starting chord analysis: {} samples at {} Hz",
        samples.len(),
        sample_rate
    );

    let sequencer = match ChordSequencer::new(config.clone()) {
        Ok(sequencer) => sequencer,
        Err(e) => return AnalysisResult::failed(&e, config.hop_size),
    };

    sequencer.analyze_samples(samples, sample_rate)
}

/// Decode an audio file and analyze it
///
/// Decoding failures are reported in the result's `error` field.
///
/// # Example
///
/// ```no_run
/// use chordsync::{analyze_file, AnalysisConfig};
///
/// let result = analyze_file("song.mp3", &AnalysisConfig::default());
/// if let Some(err) = &result.error {
///     eprintln!("analysis failed: {}", err);
/// }
/// ```
pub fn analyze_file<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> AnalysisResult {
    match ChordSequencer::new(config.clone()) {
        Ok(sequencer) => sequencer.analyze_input(&AudioFile::new(path.as_ref())),
        Err(e) => AnalysisResult::failed(&e, config.hop_size),
    }
}
