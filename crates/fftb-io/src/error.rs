//! Error types for I/O operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Image could not be opened or decoded.
    #[error("cannot decode image {path}: {reason}")]
    Decode {
        /// Offending file.
        path: PathBuf,
        /// Codec message.
        reason: String,
    },

    /// Image could not be encoded or written.
    #[error("cannot encode image {path}: {reason}")]
    Encode {
        /// Target file.
        path: PathBuf,
        /// Codec message.
        reason: String,
    },

    /// Existing results log is not a JSON object.
    #[error("malformed results log {path}: {reason}")]
    MalformedRecord {
        /// Log file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// Record could not be serialized.
    #[error("cannot serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Buffer or shape error from fftb-core.
    #[error(transparent)]
    Core(#[from] fftb_core::Error),
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
