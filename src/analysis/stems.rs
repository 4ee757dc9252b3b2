//! Stem fusion
//!
//! Chooses which separated stem's analysis becomes the final chord track.
//!
//! Stems are tried in harmonic priority order (other, bass, vocals, drums);
//! the first one whose analysis has at least one event wins and lower
//! priority stems are not analyzed. If none qualifies, the first stem of the
//! input mapping is used even when its result is empty. An empty mapping is
//! an error result and nothing is analyzed.
//!
//! A failed analysis has no events, so a stem that cannot be decoded is
//! skipped like a stem without chords.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::result::AnalysisResult;
use super::sequencer::ChordSequencer;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::io::decoder::AudioFile;
use crate::io::source::AudioInput;

/// Separated instrument track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stem {
    /// Lead and backing vocals
    Vocals,
    /// Percussion
    Drums,
    /// Bass line
    Bass,
    /// Everything else (keys, guitars, pads): the harmonic stem
    Other,
}

impl Stem {
    /// All stems in separation output order (also the probe order)
    pub const ALL: [Stem; 4] = [Stem::Vocals, Stem::Drums, Stem::Bass, Stem::Other];

    /// Stems in chord-detection priority order
    pub const PRIORITY: [Stem; 4] = [Stem::Other, Stem::Bass, Stem::Vocals, Stem::Drums];

    /// Lowercase stem name, also used as the file stem on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Stem::Vocals => "vocals",
            Stem::Drums => "drums",
            Stem::Bass => "bass",
            Stem::Other => "other",
        }
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stem {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vocals" => Ok(Stem::Vocals),
            "drums" => Ok(Stem::Drums),
            "bass" => Ok(Stem::Bass),
            "other" => Ok(Stem::Other),
            _ => Err(AnalysisError::InvalidInput(format!(
                "Unknown stem '{}' (expected vocals, drums, bass or other)",
                s
            ))),
        }
    }
}

/// Ordered mapping from stem to audio input
///
/// Insertion order is preserved; it decides the fallback stem.
#[derive(Debug, Clone)]
pub struct StemSet<I> {
    entries: Vec<(Stem, I)>,
}

impl<I> StemSet<I> {
    /// Empty set
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a stem, replacing (in place) any input already registered for it
    pub fn insert(&mut self, stem: Stem, input: I) {
        match self.entries.iter_mut().find(|(s, _)| *s == stem) {
            Some(entry) => entry.1 = input,
            None => self.entries.push((stem, input)),
        }
    }

    /// Input registered for `stem`
    pub fn get(&self, stem: Stem) -> Option<&I> {
        self.entries
            .iter()
            .find(|(s, _)| *s == stem)
            .map(|(_, input)| input)
    }

    /// First entry in insertion order
    pub fn first(&self) -> Option<(Stem, &I)> {
        self.entries.first().map(|(stem, input)| (*stem, input))
    }

    /// Stems present, in insertion order
    pub fn stems(&self) -> Vec<Stem> {
        self.entries.iter().map(|(stem, _)| *stem).collect()
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Stem, &I)> {
        self.entries.iter().map(|(stem, input)| (*stem, input))
    }

    /// Number of stems
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no stem is present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<I> Default for StemSet<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> FromIterator<(Stem, I)> for StemSet<I> {
    fn from_iter<T: IntoIterator<Item = (Stem, I)>>(iter: T) -> Self {
        let mut set = StemSet::new();
        for (stem, input) in iter {
            set.insert(stem, input);
        }
        set
    }
}

/// Find stem files in a separation output directory
///
/// For each stem (vocals, drums, bass, other) the first existing
/// `<dir>/<stem>.<ext>` over `config.stem_extensions` is included. Missing
/// stems are simply absent.
pub fn probe_stems<P: AsRef<Path>>(dir: P, config: &AnalysisConfig) -> StemSet<AudioFile> {
    let dir = dir.as_ref();
    let mut set = StemSet::new();

    for stem in Stem::ALL {
        let found = config
            .stem_extensions
            .iter()
            .map(|ext| dir.join(format!("{}.{}", stem, ext)))
            .find(|path| path.is_file());

        match found {
            Some(path) => {
                log::debug!("Found {} stem: {}", stem, path.display());
                set.insert(stem, AudioFile::new(path));
            }
            None => log::debug!("No {} stem in {}", stem, dir.display()),
        }
    }

    set
}

fn no_stems(sequencer: &ChordSequencer) -> AnalysisResult {
    let err = AnalysisError::InvalidInput("No stems available".to_string());
    log::warn!("{}", err);
    AnalysisResult::failed(&err, sequencer.config().hop_size)
}

/// Apply the priority / fallback policy to already computed results
fn select<F>(stems: &[Stem], mut result_for: F) -> Option<AnalysisResult>
where
    F: FnMut(Stem) -> AnalysisResult,
{
    for stem in Stem::PRIORITY {
        if !stems.contains(&stem) {
            continue;
        }
        let result = result_for(stem);
        if result.has_events() {
            log::info!("Using {} stem ({} chord events)", stem, result.events.len());
            return Some(result.with_stem(stem));
        }
        log::debug!("{} stem produced no chord events", stem);
    }

    let fallback = *stems.first()?;
    log::info!("No prioritized stem produced chords, falling back to {}", fallback);
    Some(result_for(fallback).with_stem(fallback))
}

/// Pick the analysis of the most useful stem
///
/// Analyzes stems lazily in priority order and stops at the first result
/// with events. Never fails: an empty set yields an error result.
pub fn fuse_stems<I: AudioInput>(stems: &StemSet<I>, sequencer: &ChordSequencer) -> AnalysisResult {
    if stems.is_empty() {
        return no_stems(sequencer);
    }

    let order = stems.stems();
    let mut cache: Vec<(Stem, AnalysisResult)> = Vec::new();

    let selected = select(&order, |stem| {
        if let Some((_, cached)) = cache.iter().find(|(s, _)| *s == stem) {
            return cached.clone();
        }
        let result = match stems.get(stem) {
            Some(input) => sequencer.analyze_input(input),
            None => no_stems(sequencer),
        };
        cache.push((stem, result.clone()));
        result
    });

    selected.unwrap_or_else(|| no_stems(sequencer))
}

/// Like [`fuse_stems`], but analyzes every stem concurrently first
///
/// Each stem's pipeline runs on a rayon worker; the same priority and
/// fallback policy is then applied, so the result equals the sequential one.
pub fn fuse_stems_parallel<I: AudioInput + Sync>(
    stems: &StemSet<I>,
    sequencer: &ChordSequencer,
) -> AnalysisResult {
    if stems.is_empty() {
        return no_stems(sequencer);
    }

    let results: Vec<(Stem, AnalysisResult)> = stems
        .entries
        .par_iter()
        .map(|(stem, input)| (*stem, sequencer.analyze_input(input)))
        .collect();

    let order = stems.stems();
    let selected = select(&order, |stem| {
        results
            .iter()
            .find(|(s, _)| *s == stem)
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| no_stems(sequencer))
    });

    selected.unwrap_or_else(|| no_stems(sequencer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::source::AudioSource;
    use std::borrow::Cow;
    use std::cell::RefCell;

    /// Input that records every load and never yields chords when `chords` is false
    struct FakeStem {
        name: &'static str,
        chords: bool,
        loads: RefCell<Vec<&'static str>>,
    }

    impl FakeStem {
        fn new(name: &'static str, chords: bool) -> Self {
            Self {
                name,
                chords,
                loads: RefCell::new(Vec::new()),
            }
        }

        fn load_count(&self) -> usize {
            self.loads.borrow().len()
        }
    }

    impl AudioInput for FakeStem {
        fn load(&self, _config: &AnalysisConfig) -> Result<Cow<'_, AudioSource>, AnalysisError> {
            self.loads.borrow_mut().push(self.name);
            if self.chords {
                Ok(Cow::Owned(AudioSource::new(vec![0.0; 22050 * 4], 22050)?))
            } else {
                Err(AnalysisError::DecodingError(format!("{} unreadable", self.name)))
            }
        }

        fn describe(&self) -> String {
            self.name.to_string()
        }
    }

    fn sequencer() -> ChordSequencer {
        ChordSequencer::new(AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_stem_names_roundtrip() {
        for stem in Stem::ALL {
            assert_eq!(stem.as_str().parse::<Stem>().unwrap(), stem);
        }
        assert!("piano".parse::<Stem>().is_err());
        assert_eq!(serde_json::to_string(&Stem::Other).unwrap(), "\"other\"");
    }

    #[test]
    fn test_stem_set_preserves_order_and_replaces() {
        let mut set = StemSet::new();
        set.insert(Stem::Drums, 1);
        set.insert(Stem::Vocals, 2);
        set.insert(Stem::Drums, 3);
        assert_eq!(set.stems(), vec![Stem::Drums, Stem::Vocals]);
        assert_eq!(set.get(Stem::Drums), Some(&3));
        assert_eq!(set.first(), Some((Stem::Drums, &3)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_priority_prefers_other() {
        let stems: StemSet<FakeStem> = vec![
            (Stem::Vocals, FakeStem::new("vocals", true)),
            (Stem::Other, FakeStem::new("other", true)),
        ]
        .into_iter()
        .collect();

        let result = fuse_stems(&stems, &sequencer());
        assert_eq!(result.primary_stem, Some(Stem::Other));
        assert!(result.has_events());

        // Short-circuit: vocals never loaded
        assert_eq!(stems.get(Stem::Vocals).unwrap().load_count(), 0);
        assert_eq!(stems.get(Stem::Other).unwrap().load_count(), 1);
    }

    #[test]
    fn test_failed_stem_moves_to_next_priority() {
        let stems: StemSet<FakeStem> = vec![
            (Stem::Other, FakeStem::new("other", false)),
            (Stem::Bass, FakeStem::new("bass", true)),
        ]
        .into_iter()
        .collect();

        let result = fuse_stems(&stems, &sequencer());
        assert_eq!(result.primary_stem, Some(Stem::Bass));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_fallback_to_first_stem() {
        let stems: StemSet<FakeStem> = vec![
            (Stem::Drums, FakeStem::new("drums", false)),
            (Stem::Vocals, FakeStem::new("vocals", false)),
        ]
        .into_iter()
        .collect();

        let result = fuse_stems(&stems, &sequencer());
        assert_eq!(result.primary_stem, Some(Stem::Drums));
        assert!(result.events.is_empty());
        // Fallback reuses the already computed drums result
        assert_eq!(stems.get(Stem::Drums).unwrap().load_count(), 1);
    }

    #[test]
    fn test_empty_set_is_error() {
        let stems: StemSet<AudioSource> = StemSet::new();
        let result = fuse_stems(&stems, &sequencer());
        assert_eq!(result.duration, 0.0);
        assert!(result.events.is_empty());
        assert!(!result.error.as_deref().unwrap_or("").is_empty());
        assert!(result.primary_stem.is_none());

        let parallel = fuse_stems_parallel(&stems, &sequencer());
        assert_eq!(parallel, result);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let silent = AudioSource::new(vec![0.0; 22050 * 3], 22050).unwrap();
        let empty_rate = AudioSource {
            samples: vec![0.1; 10],
            sample_rate: 0,
        };
        let stems: StemSet<AudioSource> = vec![
            (Stem::Vocals, silent.clone()),
            (Stem::Other, empty_rate),
            (Stem::Bass, silent),
        ]
        .into_iter()
        .collect();

        let seq = sequencer();
        let a = fuse_stems(&stems, &seq);
        let b = fuse_stems_parallel(&stems, &seq);
        assert_eq!(a, b);
        assert_eq!(a.primary_stem, Some(Stem::Bass));
    }

    #[test]
    fn test_probe_stems() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bass.wav"), b"x").unwrap();
        std::fs::write(dir.path().join("other.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("other.wav"), b"x").unwrap();
        std::fs::write(dir.path().join("piano.wav"), b"x").unwrap();

        let stems = probe_stems(dir.path(), &AnalysisConfig::default());
        assert_eq!(stems.stems(), vec![Stem::Bass, Stem::Other]);
        // mp3 is probed before wav
        assert!(stems.get(Stem::Other).unwrap().path.ends_with("other.mp3"));
    }
}
