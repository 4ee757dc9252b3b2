//! Channel mixing utilities (interleaved multi-channel to mono)

use crate::error::AnalysisError;

/// Convert interleaved samples to mono by averaging every frame's channels
///
/// # Arguments
///
/// * `interleaved` - Interleaved samples (`frames * channels` values)
/// * `channels` - Number of channels per frame
///
/// # Returns
///
/// Mono samples, one per frame. A trailing partial frame is dropped.
///
/// # Example
///
/// ```
/// use chordsync::preprocessing::channel_mixer::downmix_to_mono;
///
/// let stereo = [0.5, 0.3, -0.2, 0.4];
/// let mono = downmix_to_mono(&stereo, 2)?;
/// assert_eq!(mono.len(), 2);
/// # Ok::<(), chordsync::AnalysisError>(())
/// ```
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Result<Vec<f32>, AnalysisError> {
    match channels {
        0 => Err(AnalysisError::InvalidInput(
            "Channel count must be > 0".to_string(),
        )),
        1 => Ok(interleaved.to_vec()),
        n => {
            let scale = 1.0 / n as f32;
            Ok(interleaved
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() * scale)
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_to_mono() {
        let input = [0.5, 0.3, -0.2, 0.4, 0.8, 0.6];
        let output = downmix_to_mono(&input, 2).unwrap();

        assert_eq!(output.len(), 3);
        assert!((output[0] - 0.4).abs() < 1e-6);
        assert!((output[1] - 0.1).abs() < 1e-6);
        assert!((output[2] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_mono_passthrough() {
        let input = [0.5, -0.3, 0.8];
        assert_eq!(downmix_to_mono(&input, 1).unwrap(), input.to_vec());
    }

    #[test]
    fn test_surround_average_and_partial_frame() {
        let input = [0.6, 0.0, 0.0, 0.3, 0.3, 0.3, 0.9];
        let output = downmix_to_mono(&input, 3).unwrap();
        assert_eq!(output.len(), 2);
        assert!((output[0] - 0.2).abs() < 1e-6);
        assert!((output[1] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_zero_channels() {
        assert!(downmix_to_mono(&[0.1], 0).is_err());
    }
}
