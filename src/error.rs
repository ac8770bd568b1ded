//! Error handling for Databend
//!
//! Every fallible operation in the crate returns [`Result`]. Codec and
//! effect processing are total and never produce errors.

use thiserror::Error;

/// Result type alias for Databend operations
pub type Result<T> = std::result::Result<T, DatabendError>;

/// Main error type for Databend operations
#[derive(Error, Debug)]
pub enum DatabendError {
    // Input Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Missing input: {what}")]
    MissingInput { what: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Cannot interpolate between {start} and {end} effects")]
    MismatchedEffects {
        start: &'static str,
        end: &'static str,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Framebank Errors
    #[error("Cannot {operation} while transition is {from}")]
    InvalidTransition {
        from: String,
        operation: &'static str,
    },

    #[error("Framebank full: already holds {total_frames} frames")]
    FramebankFull { total_frames: usize },

    #[error("Cannot {operation}: a transition is still rendering")]
    RenderInProgress { operation: &'static str },

    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    // Storage Errors
    #[error("Stored frame not found: {id}")]
    FrameNotFound { id: String },

    #[error("Stored frame {id} failed checksum verification")]
    CorruptFrame { id: String },

    #[error("Frame store error: {reason}")]
    StorageError { reason: String },

    // Render Errors
    #[error("Render worker unavailable: {reason}")]
    WorkerUnavailable { reason: String },

    #[error("Render failed: {reason}")]
    RenderFailed { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DatabendError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            DatabendError::FileNotFound { .. } => "FILE_NOT_FOUND",
            DatabendError::MissingInput { .. } => "MISSING_INPUT",
            DatabendError::InvalidAudio { .. } => "INVALID_AUDIO",
            DatabendError::InvalidSettings { .. } => "INVALID_SETTINGS",
            DatabendError::MismatchedEffects { .. } => "MISMATCHED_EFFECTS",
            DatabendError::InvalidConfig { .. } => "INVALID_CONFIG",
            DatabendError::InvalidTransition { .. } => "INVALID_TRANSITION",
            DatabendError::FramebankFull { .. } => "FRAMEBANK_FULL",
            DatabendError::RenderInProgress { .. } => "RENDER_IN_PROGRESS",
            DatabendError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            DatabendError::FrameNotFound { .. } => "FRAME_NOT_FOUND",
            DatabendError::CorruptFrame { .. } => "CORRUPT_FRAME",
            DatabendError::StorageError { .. } => "STORAGE_ERROR",
            DatabendError::WorkerUnavailable { .. } => "WORKER_UNAVAILABLE",
            DatabendError::RenderFailed { .. } => "RENDER_FAILED",
            DatabendError::Io(_) => "IO_ERROR",
            DatabendError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave every piece of state untouched, so the
    /// caller can fix the input and retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DatabendError::FileNotFound { .. }
                | DatabendError::MissingInput { .. }
                | DatabendError::InvalidSettings { .. }
                | DatabendError::MismatchedEffects { .. }
                | DatabendError::InvalidTransition { .. }
                | DatabendError::RenderInProgress { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            DatabendError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            DatabendError::MissingInput { .. } => vec![
                "Load a source image before rendering",
                "Request at least one frame",
            ],
            DatabendError::MismatchedEffects { .. } => vec![
                "Use the same effect type for both ends of a transition",
            ],
            DatabendError::RenderInProgress { .. } => vec![
                "Wait for the running transition to finish",
                "Retry once every transition is complete",
            ],
            DatabendError::CorruptFrame { .. } => vec![
                "Re-render the transition that owns this frame",
            ],
            DatabendError::WorkerUnavailable { .. } => vec![
                "Create a new render worker",
            ],
            _ => vec![],
        }
    }
}
