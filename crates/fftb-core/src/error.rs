//! Error types for fftb-core.
//!
//! Covers the failure modes of the low-level building blocks shared by the
//! benchmark harnesses:
//! - Buffer allocation (aligned, transform-ready memory)
//! - Problem shape validation
//!
//! # Usage
//!
//! ```rust
//! use fftb_core::{Error, Result};
//!
//! fn check_rank(rank: usize) -> Result<()> {
//!     if rank == 0 {
//!         return Err(Error::invalid_shape(vec![], "rank must be at least 1"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Used By
//!
//! - [`crate::buffer::AlignedBuffer`] - allocation failures
//! - [`crate::shape::Shape`] - dimension checks
//! - `fftb-ops` - wraps this error in `OpsError::Core`

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by buffers and shapes.
#[derive(Debug, Error)]
pub enum Error {
    /// Memory allocation failed.
    ///
    /// Fatal for a benchmark run: the harness aborts instead of continuing
    /// with partial data. `buffer` names the buffer that could not be
    /// allocated (e.g. `"green.spectrum_in"`).
    #[error("failed to allocate {bytes} bytes for buffer '{buffer}'")]
    AllocationFailed {
        /// Name of the buffer being allocated
        buffer: String,
        /// Bytes requested
        bytes: usize,
    },

    /// Requested alignment is not a power of two.
    #[error("invalid alignment {0}: must be a non-zero power of two")]
    InvalidAlignment(usize),

    /// Problem shape is unusable (zero rank, zero-sized dimension, overflow).
    #[error("invalid shape {dims:?}: {reason}")]
    InvalidShape {
        /// Dimension sizes as given
        dims: Vec<usize>,
        /// Reason why the shape is invalid
        reason: String,
    },

    /// Two buffers that must agree in length do not.
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        /// Expected element count
        expected: usize,
        /// Actual element count
        got: usize,
    },
}

impl Error {
    /// Creates an [`Error::AllocationFailed`] error.
    #[inline]
    pub fn allocation_failed(buffer: impl Into<String>, bytes: usize) -> Self {
        Self::AllocationFailed {
            buffer: buffer.into(),
            bytes,
        }
    }

    /// Creates an [`Error::InvalidShape`] error.
    #[inline]
    pub fn invalid_shape(dims: Vec<usize>, reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            dims,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::LengthMismatch`] error.
    #[inline]
    pub fn length_mismatch(expected: usize, got: usize) -> Self {
        Self::LengthMismatch { expected, got }
    }
}
