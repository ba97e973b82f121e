//! # fftb-core
//!
//! Core types for the frequency-domain benchmark harnesses.
//!
//! - [`AlignedBuffer`] - zero-initialized, boundary-aligned sample storage
//! - [`Shape`] - row-major problem shape and half-spectrum geometry
//! - [`RgbChannels`] - planar normalized RGB samples
//! - [`Error`] - allocation and shape errors
//!
//! ## Crate Structure
//!
//! ```text
//! fftb-core (this crate)
//!    ^
//!    |
//!    +-- fftb-ops (kernel, engine, plans, harnesses)
//!    +-- fftb-io (image codec, result records, plotting)
//!    +-- fftb-cli
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod channels;
pub mod error;
pub mod shape;

pub use buffer::{AlignedBuffer, DEFAULT_ALIGNMENT};
pub use channels::RgbChannels;
pub use error::{Error, Result};
pub use shape::Shape;
