//! Chord matching modules
//!
//! Detect chords using:
//! - Interval templates (triads, sevenths, suspended chords)
//! - Pearson correlation against root-rotated template masks

pub mod matcher;
pub mod templates;

pub use matcher::{match_chord, ChordMatch};
pub use templates::{ChordTemplate, ChordTemplateBank};
