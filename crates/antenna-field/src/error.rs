//! Error types for the field model, audio decoding and rendering

use thiserror::Error;

/// Rejected simulation input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A parameter update that would break a parameter invariant
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Malformed input to a field evaluation (NaN, negative frequency, empty batch)
    #[error("invalid field input: {0}")]
    InvalidInput(String),
}

impl SimError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Failure to turn an uploaded file into an [`crate::AudioTrack`]
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported audio format `{0}` (expected wav or mp3)")]
    UnsupportedExtension(String),

    #[error("audio input is empty")]
    EmptyInput,

    #[error("no decodable audio track found")]
    NoTrack,

    #[error("audio stream has no sample rate")]
    MissingSampleRate,

    #[error("audio stream contains no samples")]
    NoSamples,

    #[error("corrupt audio stream: {0}")]
    Corrupt(String),

    #[error("failed to read audio file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<symphonia::core::errors::Error> for DecodeError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        DecodeError::Corrupt(err.to_string())
    }
}

/// Failure while producing SVG output
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("frame count must be at least 1")]
    NoFrames,

    #[error(transparent)]
    Field(#[from] SimError),
}
