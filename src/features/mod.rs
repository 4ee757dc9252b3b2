//! Feature extraction modules
//!
//! This module contains the signal-level stages of chord detection:
//! - Chroma extraction and fixed-duration segmentation
//! - Chord template matching

pub mod chord;
pub mod chroma;
