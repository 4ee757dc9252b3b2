//! Chord analysis and result aggregation modules
//!
//! Turns chroma segments into chord-change events:
//! - Result types and the JSON artifact layout
//! - Chord sequencing (change detection with a confidence gate)
//! - Stem selection and fusion
//! - Job-directory pipeline

pub mod job;
pub mod result;
pub mod sequencer;
pub mod stems;
