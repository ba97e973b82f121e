//! # fftb-io
//!
//! Adapters between the harnesses and the outside world:
//!
//! - [`image`] - PNG/JPEG decode into normalized RGB planes, 8-bit save
//! - [`record`] - timestamp-keyed JSON results log with atomic append
//! - [`plot`] - `gnuplot` line plots of 1-D series

#![warn(missing_docs)]

mod error;

pub mod image;
pub mod plot;
pub mod record;

pub use self::image::{load_rgb, save_rgb};
pub use error::{IoError, IoResult};
pub use plot::plot_1d;
pub use record::ResultLog;
