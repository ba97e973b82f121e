//! # fftb-ops
//!
//! Transform engine and benchmark harnesses.
//!
//! This crate implements the frequency-domain pieces of the benchmark:
//!
//! - **Kernel**: normalized 2-D Gaussian, zero-padded to the image size
//! - **Engine**: worker pool, plan creation and live-plan accounting
//! - **Plans**: unnormalized N-D real↔complex transforms run on the pool
//! - **Spectrum**: pointwise half-spectrum multiply and inverse scaling
//! - **Timing**: phase timers, totals and throughput estimates
//! - **Harnesses**: RGB Gaussian blur and N-D cosine round trip
//!
//! # Quick Start
//!
//! ```rust
//! use fftb_core::RgbChannels;
//! use fftb_ops::blur::{BlurConfig, run_blur};
//! use fftb_ops::engine::{EngineConfig, TransformEngineContext};
//!
//! let ctx = TransformEngineContext::acquire(EngineConfig::with_threads(2)).unwrap();
//! let image = RgbChannels::uniform(32, 24, [0.5, 0.25, 0.125]);
//! let outcome = run_blur(&ctx, &image, &BlurConfig::default()).unwrap();
//! assert_eq!(outcome.output.width, 32);
//! assert_eq!(ctx.live_plans(), 0);
//! println!("{}", outcome.report);
//! ```
//!
//! # Conventions
//!
//! Row-major data, last axis contiguous. Forward transforms produce the
//! half-spectrum (`n_R/2 + 1` bins on the last axis); the inverse is
//! unnormalized, so a round trip scales by the sample count `N`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;

pub mod blur;
pub mod channels;
pub mod engine;
pub mod kernel;
pub mod plan;
pub mod report;
pub mod roundtrip;
pub mod spectrum;
pub mod timing;

pub use error::{OpsError, OpsResult};
