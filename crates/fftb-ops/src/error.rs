//! Error types for transform and harness operations.

use thiserror::Error;

/// Error type for transform and harness operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Buffer or shape error from fftb-core.
    #[error(transparent)]
    Core(#[from] fftb_core::Error),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Buffers have incompatible sizes.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Plan used outside its lifecycle (e.g. executed twice).
    #[error("plan state: {0}")]
    PlanState(String),

    /// The transform backend rejected a call.
    #[error("transform failed: {0}")]
    Transform(String),

    /// The worker pool could not be created.
    #[error("thread pool: {0}")]
    ThreadPool(String),
}

/// Result type for transform and harness operations.
pub type OpsResult<T> = Result<T, OpsError>;
