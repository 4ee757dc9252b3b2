//! Decoded mono audio and the inputs that produce it

use std::borrow::Cow;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// Anything the engine can turn into an [`AudioSource`]
///
/// In-memory sources load for free; file-backed inputs decode on demand so a
/// decode failure surfaces inside the analysis of that one input.
pub trait AudioInput {
    /// Produce mono samples for analysis
    fn load(&self, config: &AnalysisConfig) -> Result<Cow<'_, AudioSource>, AnalysisError>;

    /// Short human-readable description for log messages
    fn describe(&self) -> String;
}

/// One decoded track (full mix or a single stem)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    /// Mono samples, nominally in [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioSource {
    /// Wrap mono samples, rejecting a zero sample rate
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Invalid sample rate".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Duration in seconds (`samples / sample_rate`)
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        (self.samples.len() as f64 / self.sample_rate as f64) as f32
    }

    /// True if there are no samples or every sample is zero
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }
}

impl AudioInput for AudioSource {
    fn load(&self, _config: &AnalysisConfig) -> Result<Cow<'_, AudioSource>, AnalysisError> {
        Ok(Cow::Borrowed(self))
    }

    fn describe(&self) -> String {
        format!(
            "in-memory source ({} samples at {} Hz)",
            self.samples.len(),
            self.sample_rate
        )
    }
}
