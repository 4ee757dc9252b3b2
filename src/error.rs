//! Error types for the chord detection engine

use std::fmt;

/// Errors that can occur during chord analysis
///
/// Inside the pipeline these propagate with `?`. At the single-source and
/// stem-fusion boundaries they are folded into
/// [`AnalysisResult::error`](crate::AnalysisResult) instead of being returned.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Audio decoding error
    DecodingError(String),

    /// Processing error during analysis
    ProcessingError(String),

    /// Numerical error (overflow, underflow, etc.)
    NumericalError(String),

    /// File system error
    Io(String),

    /// JSON (de)serialization error
    Serialization(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            AnalysisError::Io(msg) => write!(f, "I/O error: {}", msg),
            AnalysisError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Serialization(err.to_string())
    }
}

impl From<symphonia::core::errors::Error> for AnalysisError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AnalysisError::DecodingError(err.to_string())
    }
}
