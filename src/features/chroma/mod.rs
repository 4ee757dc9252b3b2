//! Chroma extraction modules
//!
//! Extract pitch-class distribution (12 semitones) from audio:
//! - Chroma frame computation
//! - Normalization strategies
//! - Fixed-duration segmentation

pub mod extractor;
pub mod normalization;
pub mod segmenter;

pub use extractor::{extract_chroma, ChromaExtractor, ChromaFrame};
pub use segmenter::{frames_per_segment, segment_frames, Segment};
