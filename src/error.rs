//! Error handling for Beatshift
//!
//! Every pipeline failure maps to exactly one variant. All failures abort the run;
//! nothing here is retried because every stage is deterministic given its input.

use thiserror::Error;

use crate::pipeline::IllegalTransition;

/// Result type alias for Beatshift operations
pub type Result<T> = std::result::Result<T, BeatshiftError>;

/// Main error type for Beatshift operations
#[derive(Error, Debug)]
pub enum BeatshiftError {
    // Decode Errors
    #[error("Unsupported audio format: {reason}")]
    UnsupportedFormat {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Corrupt audio data: {reason}")]
    CorruptData {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Analysis Errors
    #[error("Not enough peaks to estimate tempo (found {peaks_found})")]
    InsufficientPeaks { peaks_found: usize },

    #[error("Invalid tempo: original {original_bpm} BPM, target {target_bpm} BPM")]
    InvalidTempo { original_bpm: f64, target_bpm: f64 },

    // Request Errors
    #[error("Unknown genre: '{name}'")]
    UnknownGenre { name: String },

    #[error("Input too large: {size} bytes (limit {limit} bytes)")]
    InputTooLarge { size: usize, limit: usize },

    #[error("Invalid sample buffer: {reason}")]
    InvalidBuffer { reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Buffer too large to encode: {data_bytes} data bytes, {channels} channels")]
    EncodingOverflow { data_bytes: u64, channels: usize },

    #[error("Pipeline run was cancelled")]
    Cancelled,

    #[error("Pipeline worker stopped unexpectedly: {reason}")]
    WorkerFailed { reason: String },

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BeatshiftError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            BeatshiftError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            BeatshiftError::CorruptData { .. } => "CORRUPT_DATA",
            BeatshiftError::InsufficientPeaks { .. } => "INSUFFICIENT_PEAKS",
            BeatshiftError::InvalidTempo { .. } => "INVALID_TEMPO",
            BeatshiftError::UnknownGenre { .. } => "UNKNOWN_GENRE",
            BeatshiftError::InputTooLarge { .. } => "INPUT_TOO_LARGE",
            BeatshiftError::InvalidBuffer { .. } => "INVALID_BUFFER",
            BeatshiftError::InvalidConfig { .. } => "INVALID_CONFIG",
            BeatshiftError::EncodingOverflow { .. } => "ENCODING_OVERFLOW",
            BeatshiftError::Cancelled => "CANCELLED",
            BeatshiftError::WorkerFailed { .. } => "WORKER_FAILED",
            BeatshiftError::IllegalTransition(_) => "ILLEGAL_TRANSITION",
            BeatshiftError::FileNotFound { .. } => "FILE_NOT_FOUND",
            BeatshiftError::Io(_) => "IO_ERROR",
            BeatshiftError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the caller can recover by changing the request
    ///
    /// `InvalidTempo` and `InvalidBuffer` are contract violations inside the
    /// pipeline and are never recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BeatshiftError::UnsupportedFormat { .. }
                | BeatshiftError::InsufficientPeaks { .. }
                | BeatshiftError::UnknownGenre { .. }
                | BeatshiftError::InputTooLarge { .. }
                | BeatshiftError::InvalidConfig { .. }
                | BeatshiftError::FileNotFound { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BeatshiftError::UnsupportedFormat { .. } => vec![
                "Convert the file to WAV, FLAC, MP3 or OGG first",
                "Check if the file plays in another application",
            ],
            BeatshiftError::CorruptData { .. } => vec![
                "The file may be truncated or damaged - try re-exporting from source",
            ],
            BeatshiftError::InsufficientPeaks { .. } => vec![
                "The track has too few transients to detect a tempo",
                "Pass --fallback-bpm to supply the tempo manually",
                "Lower tempo.peak_threshold in the configuration file",
            ],
            BeatshiftError::UnknownGenre { .. } => vec![
                "Run 'beatshift-cli genres' to list the supported genres",
            ],
            BeatshiftError::InputTooLarge { .. } => vec![
                "Trim the file to a shorter section",
                "Raise max_input_bytes in the configuration file",
            ],
            BeatshiftError::InvalidConfig { .. } => vec![
                "Run 'beatshift-cli print-config' to see a valid configuration",
            ],
            BeatshiftError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            _ => vec![],
        }
    }
}
