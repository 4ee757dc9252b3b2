//! Chord quality templates
//!
//! Defines the interval fingerprints (root-relative semitone offsets) that
//! segment chroma vectors are matched against. Enumeration order matters:
//! the matcher keeps the first template on score ties.

use crate::error::AnalysisError;

/// Quality label of the plain major triad
pub const MAJOR: &str = "major";

/// Quality label of the plain minor triad
pub const MINOR: &str = "minor";

/// Interval fingerprint of one chord quality
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordTemplate {
    quality: String,
    intervals: Vec<u8>,
}

impl ChordTemplate {
    /// Create a template, validating its interval set
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the label is empty, the root
    /// (offset 0) is missing, or an offset repeats or lies outside [0, 11].
    pub fn new(quality: &str, intervals: &[u8]) -> Result<Self, AnalysisError> {
        Self::check(quality, intervals)?;
        Ok(Self {
            quality: quality.to_string(),
            intervals: intervals.to_vec(),
        })
    }

    fn check(quality: &str, intervals: &[u8]) -> Result<(), AnalysisError> {
        if quality.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Chord quality label must not be empty".to_string(),
            ));
        }
        if !intervals.contains(&0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Template '{}' must include the root (offset 0)",
                quality
            )));
        }
        let mut seen = [false; 12];
        for &offset in intervals {
            if offset > 11 {
                return Err(AnalysisError::InvalidInput(format!(
                    "Template '{}' has offset {} outside [0, 11]",
                    quality, offset
                )));
            }
            if seen[offset as usize] {
                return Err(AnalysisError::InvalidInput(format!(
                    "Template '{}' repeats offset {}",
                    quality, offset
                )));
            }
            seen[offset as usize] = true;
        }
        Ok(())
    }

    /// Quality label (e.g. "major", "min7")
    pub fn quality(&self) -> &str {
        &self.quality
    }

    /// Root-relative semitone offsets in [0, 11], unique, always containing 0
    pub fn intervals(&self) -> &[u8] {
        &self.intervals
    }

    /// Binary 12-element mask with the template rotated onto `root`
    ///
    /// `mask[(root + offset) % 12] = 1.0` for every offset, 0.0 elsewhere.
    pub fn rotated_mask(&self, root: usize) -> [f32; 12] {
        let mut mask = [0.0f32; 12];
        for &offset in &self.intervals {
            mask[(root + offset as usize) % 12] = 1.0;
        }
        mask
    }

    /// Suffix appended to the root note name in a chord label
    ///
    /// Major chords are written as the bare root ("C"), minor chords with "m"
    /// ("Am"), every other quality with its label ("G7", "Dsus4").
    pub fn label_suffix(&self) -> &str {
        match self.quality.as_str() {
            MAJOR => "",
            MINOR => "m",
            other => other,
        }
    }
}

/// Ordered, immutable set of chord templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordTemplateBank {
    templates: Vec<ChordTemplate>,
}

impl ChordTemplateBank {
    /// The standard bank: triads, sevenths and suspended chords
    pub fn new() -> Self {
        const STANDARD: [(&str, &[u8]); 10] = [
            (MAJOR, &[0, 4, 7]),
            (MINOR, &[0, 3, 7]),
            ("dim", &[0, 3, 6]),
            ("aug", &[0, 4, 8]),
            ("7", &[0, 4, 7, 10]),
            ("maj7", &[0, 4, 7, 11]),
            ("min7", &[0, 3, 7, 10]),
            ("m7b5", &[0, 3, 6, 10]),
            ("sus2", &[0, 2, 7]),
            ("sus4", &[0, 5, 7]),
        ];

        Self {
            templates: STANDARD
                .iter()
                .map(|(quality, intervals)| ChordTemplate {
                    quality: quality.to_string(),
                    intervals: intervals.to_vec(),
                })
                .collect(),
        }
    }

    /// Build a custom bank; templates are evaluated in the given order
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for an empty list or a malformed
    /// template.
    pub fn from_templates(templates: Vec<ChordTemplate>) -> Result<Self, AnalysisError> {
        if templates.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Template bank must contain at least one template".to_string(),
            ));
        }
        for template in &templates {
            ChordTemplate::check(&template.quality, &template.intervals)?;
        }
        Ok(Self { templates })
    }

    /// Templates in evaluation order
    pub fn templates(&self) -> &[ChordTemplate] {
        &self.templates
    }

    /// Look up a template by quality label
    pub fn get(&self, quality: &str) -> Option<&ChordTemplate> {
        self.templates.iter().find(|t| t.quality == quality)
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True if the bank has no templates
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for ChordTemplateBank {
    fn default() -> Self {
        Self::new()
    }
}
