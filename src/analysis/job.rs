//! Job-directory pipeline
//!
//! A job directory holds the separated stems of one upload
//! (`vocals.mp3`, `drums.mp3`, `bass.mp3`, `other.mp3`, or `.wav`).
//! Analysis probes the stems, picks or fuses them, and writes the chord
//! artifact next to them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::result::AnalysisResult;
use super::sequencer::ChordSequencer;
use super::stems::{fuse_stems, probe_stems, Stem};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::io::artifact::save_to_json;

/// Which stems a job analysis uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StemSelection {
    /// Every available stem, combined by stem fusion
    #[default]
    All,
    /// Exactly one stem
    Single(Stem),
}

impl fmt::Display for StemSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StemSelection::All => f.write_str("all"),
            StemSelection::Single(stem) => write!(f, "{}", stem),
        }
    }
}

impl FromStr for StemSelection {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StemSelection::All)
        } else {
            s.parse().map(StemSelection::Single)
        }
    }
}

/// Analyze the stems of a job directory
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if no stem is found (`All`) or the
/// requested stem is missing (`Single`). Decoding problems do not error; they
/// end up in the returned result.
pub fn analyze_job<P: AsRef<Path>>(
    dir: P,
    selection: StemSelection,
    sequencer: &ChordSequencer,
) -> Result<AnalysisResult, AnalysisError> {
    let dir = dir.as_ref();
    let stems = probe_stems(dir, sequencer.config());
    log::info!(
        "Analyzing {} with stems {:?} (selection: {})",
        dir.display(),
        stems.stems(),
        selection
    );

    match selection {
        StemSelection::All => {
            if stems.is_empty() {
                return Err(AnalysisError::InvalidInput(format!(
                    "No stems found in {}",
                    dir.display()
                )));
            }
            Ok(fuse_stems(&stems, sequencer))
        }
        StemSelection::Single(stem) => {
            let input = stems.get(stem).ok_or_else(|| {
                AnalysisError::InvalidInput(format!(
                    "Stem not found: {} in {}",
                    stem,
                    dir.display()
                ))
            })?;
            Ok(sequencer.analyze_input(input).with_stem(stem))
        }
    }
}

/// Analyze a job directory and write the chord artifact into it
///
/// # Returns
///
/// Path of the written artifact (`<dir>/<config.output_filename>`)
///
/// # Errors
///
/// Fails if the configuration is invalid, no usable stem exists, or the
/// artifact cannot be written. An analysis that ran but failed to decode is
/// still written, with its `error` field set.
pub fn analyze_job_dir<P: AsRef<Path>>(
    dir: P,
    selection: StemSelection,
    config: &AnalysisConfig,
) -> Result<PathBuf, AnalysisError> {
    let dir = dir.as_ref();
    let sequencer = ChordSequencer::new(config.clone())?;
    let result = analyze_job(dir, selection, &sequencer)?;

    let output_path = dir.join(&config.output_filename);
    save_to_json(&result, &output_path)?;

    log::info!(
        "Saved {} chord events ({}) to {}",
        result.events.len(),
        result
            .primary_stem
            .map(|s| s.as_str())
            .unwrap_or("no stem"),
        output_path.display()
    );

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_parsing() {
        assert_eq!("all".parse::<StemSelection>().unwrap(), StemSelection::All);
        assert_eq!(
            "Bass".parse::<StemSelection>().unwrap(),
            StemSelection::Single(Stem::Bass)
        );
        assert!("guitar".parse::<StemSelection>().is_err());
        assert_eq!(StemSelection::default(), StemSelection::All);
        assert_eq!(StemSelection::Single(Stem::Other).to_string(), "other");
    }

    #[test]
    fn test_empty_job_dir_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let err = analyze_job_dir(dir.path(), StemSelection::All, &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
        assert!(!dir.path().join("chords.json").exists());
    }

    #[test]
    fn test_missing_single_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vocals.mp3"), b"x").unwrap();
        let err = analyze_job_dir(
            dir.path(),
            StemSelection::Single(Stem::Other),
            &AnalysisConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("other"));
    }

    #[test]
    fn test_undecodable_stem_still_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("other.mp3"), b"not really an mp3").unwrap();

        let path =
            analyze_job_dir(dir.path(), StemSelection::All, &AnalysisConfig::default()).unwrap();
        let written = crate::io::artifact::load_from_json(&path).unwrap();
        assert_eq!(written.primary_stem, Some(Stem::Other));
        assert!(written.error.is_some());
        assert!(written.events.is_empty());
        assert_eq!(written.duration, 0.0);
    }
}
