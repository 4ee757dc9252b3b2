//! Configuration parameters for chord analysis

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Largest accepted analysis window, in samples
pub const MAX_FRAME_SIZE: usize = 1 << 20;

/// Analysis configuration parameters
///
/// Built once per process (or per job) and passed by reference through the
/// pipeline. Every field has a default, so a partial JSON file is enough to
/// override a single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Loading
    /// Analysis sample rate in Hz (default: 22050)
    /// Decoded files are resampled to this rate. 0 keeps the file's native rate.
    pub sample_rate: u32,

    // STFT parameters
    /// Frame size / analysis window for the spectral transform (default: 2048)
    pub frame_size: usize,

    /// Hop size between chroma frames (default: 512)
    pub hop_size: usize,

    // Chroma
    /// Reference tuning frequency for A4 in Hz (default: 440.0)
    pub tuning_frequency: f32,

    /// MIDI note of the lowest constant-Q bin (default: 24 = C1, 32.70 Hz)
    pub min_midi_note: u8,

    /// Number of octaves covered by the constant-Q bins (default: 7)
    pub n_octaves: usize,

    /// Soft mapping standard deviation in semitones (default: 0.5)
    /// Each FFT bin contributes to nearby semitone bins with a Gaussian weight.
    pub soft_mapping_sigma: f32,

    // Segmentation / sequencing
    /// Segment duration in seconds (default: 2.0)
    pub segment_duration: f32,

    /// Minimum confidence (exclusive) for a chord change to be emitted (default: 0.3)
    pub confidence_threshold: f32,

    // Job layout
    /// File extensions probed for stem files, in order (default: mp3, wav)
    pub stem_extensions: Vec<String>,

    /// Name of the artifact written into the job directory (default: chords.json)
    pub output_filename: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            frame_size: 2048,
            hop_size: 512,
            tuning_frequency: 440.0,
            min_midi_note: 24,
            n_octaves: 7,
            soft_mapping_sigma: 0.5,
            segment_duration: 2.0,
            confidence_threshold: 0.3,
            stem_extensions: vec!["mp3".to_string(), "wav".to_string()],
            output_filename: "chords.json".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields take their default values. The result is validated.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: AnalysisConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        log::debug!("Loaded analysis config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Check that all parameters are usable
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.hop_size == 0 {
            return Err(AnalysisError::InvalidInput(
                "Hop size must be > 0".to_string(),
            ));
        }
        if self.frame_size == 0 || self.frame_size > MAX_FRAME_SIZE {
            return Err(AnalysisError::InvalidInput(format!(
                "Frame size must be in [1, {}], got {}",
                MAX_FRAME_SIZE, self.frame_size
            )));
        }
        if !(self.segment_duration > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Segment duration must be > 0, got {}",
                self.segment_duration
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(AnalysisError::InvalidInput(format!(
                "Confidence threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(self.tuning_frequency > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Tuning frequency must be > 0, got {}",
                self.tuning_frequency
            )));
        }
        if self.n_octaves == 0 {
            return Err(AnalysisError::InvalidInput(
                "At least one octave is required".to_string(),
            ));
        }
        if !(self.soft_mapping_sigma > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Soft mapping sigma must be > 0, got {}",
                self.soft_mapping_sigma
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hop_size, 512);
        assert_eq!(config.frame_size, 2048);
        assert_eq!(config.output_filename, "chords.json");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.hop_size = 0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.segment_duration = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frame_size_is_capped() {
        let mut config = AnalysisConfig::default();
        config.frame_size = MAX_FRAME_SIZE;
        assert!(config.validate().is_ok());

        config.frame_size = MAX_FRAME_SIZE + 1;
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidInput(_))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.json");
        std::fs::write(&path, r#"{"frame_size": 4000000000000}"#).unwrap();
        assert!(AnalysisConfig::from_json_file(&path).is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"hop_size": 1024}"#).unwrap();
        assert_eq!(config.hop_size, 1024);
        assert_eq!(config.frame_size, 2048);
        assert_eq!(config.stem_extensions, vec!["mp3", "wav"]);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"confidence_threshold": 0.6, "sample_rate": 0}"#).unwrap();

        let config = AnalysisConfig::from_json_file(&path).unwrap();
        assert!((config.confidence_threshold - 0.6).abs() < 1e-6);
        assert_eq!(config.sample_rate, 0);

        std::fs::write(&path, r#"{"hop_size": 0}"#).unwrap();
        assert!(AnalysisConfig::from_json_file(&path).is_err());
    }
}
