//! Error handling for stride-align
//!
//! Every failure is raised at the call that detects it and propagated
//! unchanged to the caller.

use thiserror::Error;

/// Result type alias for stride-align operations
pub type Result<T> = std::result::Result<T, AlignError>;

/// Main error type for stride-align operations
#[derive(Error, Debug)]
pub enum AlignError {
    // Core Errors
    #[error("Invalid shape: {reason}")]
    Shape { reason: String },

    #[error("Invalid sample rate {rate} Hz for {context}")]
    InvalidRate { rate: u32, context: &'static str },

    #[error("Invalid length: {reason}")]
    InvalidLength { reason: String },

    #[error("Malformed mask entry '{entry}': {reason}")]
    Parse { entry: String, reason: String },

    #[error("Cannot scale a buffer whose peak is {peak}")]
    DivideByZero { peak: f64 },

    // Capability Errors
    #[error("Unsupported device: {device}")]
    UnsupportedDevice { device: String },

    #[error("Model '{model}' failed: {reason}")]
    Inference { model: String, reason: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AlignError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AlignError::Shape { .. } => "SHAPE_ERROR",
            AlignError::InvalidRate { .. } => "INVALID_RATE",
            AlignError::InvalidLength { .. } => "INVALID_LENGTH",
            AlignError::Parse { .. } => "PARSE_ERROR",
            AlignError::DivideByZero { .. } => "DIVIDE_BY_ZERO",
            AlignError::UnsupportedDevice { .. } => "UNSUPPORTED_DEVICE",
            AlignError::Inference { .. } => "INFERENCE_ERROR",
            AlignError::FileNotFound { .. } => "FILE_NOT_FOUND",
            AlignError::InvalidAudio { .. } => "INVALID_AUDIO",
            AlignError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            AlignError::Io(_) => "IO_ERROR",
            AlignError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            AlignError::Shape { .. } => vec![
                "Pass mono audio as (time,) and multi-channel audio as (time, channel)",
                "Model outputs must be (batch, channel, time)",
            ],
            AlignError::InvalidRate { .. } => vec!["Sample rates must be greater than zero"],
            AlignError::InvalidLength { .. } => vec![
                "Choose a target length whose hop-framed size is already divisible",
                "Use `stride-align align` to find a compatible length",
            ],
            AlignError::Parse { .. } => vec![
                "Write intervals as <start>-<end> in whole seconds",
                "Separate intervals with commas and no spaces, e.g. 0-1,3-4",
            ],
            AlignError::DivideByZero { .. } => vec![
                "The buffer is silent; skip amplitude scaling for this input",
            ],
            AlignError::UnsupportedDevice { .. } => vec![
                "Use the cpu device",
                "Inject a TensorCast implementation that supports this device",
            ],
            AlignError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            AlignError::InvalidAudio { .. } => vec![
                "Try converting the file to WAV format first",
                "The file may be corrupted - try re-exporting from source",
            ],
            AlignError::UnsupportedFormat { .. } => vec![
                "Convert to 8, 16, 24 or 32-bit PCM or 32-bit float WAV",
            ],
            _ => vec![],
        }
    }
}
