//! Fixed-duration chroma segmentation
//!
//! Groups consecutive chroma frames into non-overlapping windows of
//! `segment_duration` seconds (`round(duration * sample_rate / hop_size)`
//! frames, at least 1); the final window may be shorter. Each window is
//! reduced to its element-wise mean and normalized so the largest pitch class
//! is 1.0. An all-zero mean stays all-zero.

use super::extractor::ChromaFrame;
use super::normalization::normalize_max;
use crate::error::AnalysisError;

/// A time window aggregating consecutive chroma frames
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Time of the window's first frame, in seconds
    pub start: f32,

    /// Index of the window's first frame
    pub first_frame: usize,

    /// Number of frames in the window
    pub frame_count: usize,

    /// Averaged and normalized chroma (max = 1.0, or all zeros)
    pub chroma: [f32; 12],
}

impl Segment {
    /// True if the segment carries no pitch energy at all
    pub fn is_silent(&self) -> bool {
        self.chroma.iter().all(|&x| x == 0.0)
    }
}

/// Number of frames per segment for the given timing parameters
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero hop size or sample rate,
/// or a non-positive duration.
pub fn frames_per_segment(
    segment_duration: f32,
    sample_rate: u32,
    hop_size: usize,
) -> Result<usize, AnalysisError> {
    if hop_size == 0 || sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Hop size and sample rate must be > 0".to_string(),
        ));
    }
    if !(segment_duration > 0.0) {
        return Err(AnalysisError::InvalidInput(format!(
            "Segment duration must be > 0, got {}",
            segment_duration
        )));
    }
    let frames = (segment_duration as f64 * sample_rate as f64 / hop_size as f64).round();
    Ok((frames as usize).max(1))
}

/// Partition chroma frames into fixed-size segments
///
/// # Arguments
///
/// * `frames` - Time-ordered chroma frames
/// * `frames_per_segment` - Window length in frames (must be > 0)
///
/// # Returns
///
/// One segment per window, in time order. Empty input gives no segments.
pub fn segment_frames(
    frames: &[ChromaFrame],
    frames_per_segment: usize,
) -> Result<Vec<Segment>, AnalysisError> {
    if frames_per_segment == 0 {
        return Err(AnalysisError::InvalidInput(
            "Frames per segment must be > 0".to_string(),
        ));
    }

    let segments: Vec<Segment> = frames
        .chunks(frames_per_segment)
        .map(|window| {
            let mut mean = [0.0f32; 12];
            for frame in window {
                for (acc, &e) in mean.iter_mut().zip(frame.energies.iter()) {
                    *acc += e;
                }
            }
            let n = window.len() as f32;
            for x in mean.iter_mut() {
                // Clamp guards against negative energies from foreign extractors
                *x = (*x / n).max(0.0);
            }
            normalize_max(&mut mean);

            Segment {
                start: window[0].time,
                first_frame: window[0].index,
                frame_count: window.len(),
                chroma: mean,
            }
        })
        .collect();

    log::debug!(
        "Segmented {} frames into {} segments ({} frames each)",
        frames.len(),
        segments.len(),
        frames_per_segment
    );

    Ok(segments)
}
