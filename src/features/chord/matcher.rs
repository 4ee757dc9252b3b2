//! Chord matching
//!
//! Maps one normalized 12-element segment vector to the best fitting chord.
//!
//! # Algorithm
//!
//! 1. Root = pitch class with the highest energy (ties: lowest index)
//! 2. Rotate every template onto the root as a binary mask
//! 3. Score = Pearson correlation between the vector and the mask
//!    (undefined correlation, e.g. a constant vector, scores 0)
//! 4. Keep the highest score; ties keep the earlier template. The search
//!    starts from "major" with score 0, so only positive correlations replace it.
//! 5. Confidence = clamp((score + 1) / 2, 0, 1)
//!
//! # Example
//!
//! ```
//! use chordsync::features::chord::{matcher::match_chord, templates::ChordTemplateBank};
//!
//! let bank = ChordTemplateBank::new();
//! let c_major = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
//! let m = match_chord(&c_major, &bank);
//! assert_eq!(m.label(), "C");
//! assert!(m.confidence >= 0.9);
//! ```

use super::templates::{ChordTemplateBank, MAJOR};
use crate::analysis::result::note_name;

/// Best template match for one segment
#[derive(Debug, Clone, PartialEq)]
pub struct ChordMatch {
    /// Root pitch class (0 = C, ..., 11 = B)
    pub root: usize,

    /// Quality label of the winning template
    pub quality: String,

    /// Label suffix of the winning template ("" for major, "m" for minor)
    pub suffix: String,

    /// Pearson correlation of the winning template, in [-1, 1]
    pub score: f32,

    /// Confidence (0.0-1.0)
    pub confidence: f32,
}

impl ChordMatch {
    /// Chord label: root note name followed by the quality suffix
    pub fn label(&self) -> String {
        format!("{}{}", note_name(self.root), self.suffix)
    }
}

/// Index of the strongest pitch class, lowest index on ties
///
/// NaN entries never win.
pub fn root_index(chroma: &[f32; 12]) -> usize {
    let mut best = 0;
    for i in 1..12 {
        if chroma[i] > chroma[best] {
            best = i;
        }
    }
    best
}

/// Pearson correlation coefficient of two 12-element sequences
///
/// Returns 0.0 when either sequence is constant (zero variance) or the
/// inputs contain non-finite values.
pub fn pearson_correlation(a: &[f32; 12], b: &[f32; 12]) -> f32 {
    // f64 accumulation keeps results identical across call sites
    let n = 12.0f64;
    let mean_a = a.iter().map(|&x| x as f64).sum::<f64>() / n;
    let mean_b = b.iter().map(|&x| x as f64).sum::<f64>() / n;

    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for i in 0..12 {
        let da = a[i] as f64 - mean_a;
        let db = b[i] as f64 - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if !denom.is_finite() || denom <= f64::EPSILON {
        return 0.0;
    }

    let r = cov / denom;
    if r.is_finite() {
        r.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Match a normalized segment vector against the template bank
///
/// # Arguments
///
/// * `chroma` - Normalized 12-element vector (max = 1.0, or all zeros)
/// * `bank` - Chord templates, evaluated in order
///
/// # Returns
///
/// Best match with label parts and confidence. Deterministic for a given
/// vector and bank.
pub fn match_chord(chroma: &[f32; 12], bank: &ChordTemplateBank) -> ChordMatch {
    let root = root_index(chroma);

    let mut best_quality = MAJOR;
    let mut best_suffix = "";
    let mut best_score = 0.0f32;

    for template in bank.templates() {
        let mask = template.rotated_mask(root);
        let score = pearson_correlation(chroma, &mask);
        if score > best_score {
            best_score = score;
            best_quality = template.quality();
            best_suffix = template.label_suffix();
        }
    }

    let confidence = ((best_score + 1.0) / 2.0).clamp(0.0, 1.0);

    log::trace!(
        "Matched {}{} (score={:.3}, confidence={:.3})",
        note_name(root),
        best_suffix,
        best_score,
        confidence
    );

    ChordMatch {
        root,
        quality: best_quality.to_string(),
        suffix: best_suffix.to_string(),
        score: best_score,
        confidence,
    }
}
