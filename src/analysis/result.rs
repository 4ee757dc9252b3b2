//! Analysis result types

use serde::{Deserialize, Serialize};

use super::stems::Stem;
use crate::error::AnalysisError;

/// Pitch-class names, index 0 = C ... 11 = B
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Name of a pitch class (wraps modulo 12)
///
/// # Example
///
/// ```
/// use chordsync::analysis::result::note_name;
///
/// assert_eq!(note_name(0), "C");
/// assert_eq!(note_name(6), "F#");
/// assert_eq!(note_name(21), "A");
/// ```
pub fn note_name(pitch_class: usize) -> &'static str {
    NOTE_NAMES[pitch_class % 12]
}

/// A detected chord onset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    /// Onset time in seconds
    pub time: f32,

    /// Chord label (root note + quality suffix, root alone for major)
    pub chord: String,

    /// Confidence (0.0-1.0)
    pub confidence: f32,
}

/// Output of analyzing one audio source
///
/// Serializes to the `chords.json` artifact layout. When `error` is set,
/// `duration` is 0 and `events` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Audio duration in seconds
    pub duration: f32,

    /// Chord changes, time-ordered, no two consecutive with the same label
    pub events: Vec<ChordEvent>,

    /// Sample rate the analysis ran at (0 when no audio was analyzed)
    pub sample_rate: u32,

    /// Hop size used for chroma frames
    #[serde(rename = "hop_length")]
    pub hop_size: usize,

    /// Stem the result was computed from, when produced by stem fusion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_stem: Option<Stem>,

    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Result describing a failed analysis
    pub fn failed(error: &AnalysisError, hop_size: usize) -> Self {
        Self {
            duration: 0.0,
            events: Vec::new(),
            sample_rate: 0,
            hop_size,
            primary_stem: None,
            error: Some(error.to_string()),
        }
    }

    /// Tag the result with the stem it came from
    pub fn with_stem(mut self, stem: Stem) -> Self {
        self.primary_stem = Some(stem);
        self
    }

    /// True if at least one chord event was detected
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// True if the analysis failed
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
