//! Analysis error types.

use thiserror::Error;

/// Errors raised while decoding or analyzing audio.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The container or codec is not recognized.
    #[error("unsupported audio: {0}")]
    Unsupported(String),

    /// The stream was recognized but could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Decoding produced no samples.
    #[error("audio contains no samples")]
    Empty,
}

/// Result type for analysis operations.
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
