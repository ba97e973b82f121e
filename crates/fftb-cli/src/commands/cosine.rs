//! Cosine command
//!
//! N-dimensional forward/inverse round trip of a replicated cosine.

use crate::{CosineArgs, PlotMode};
use anyhow::{Context, Result, bail};
use fftb_core::Shape;
use fftb_ops::roundtrip::{CosineSignal, MIN_SAMPLING_FREQUENCY, RoundTripHarness, slice_1d};
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

const PLOT_TITLE: &str = "Resulting cosine Curve After Forward and Backward DFTs";

/// Rejects argument combinations before anything is written.
pub fn validate(args: &CosineArgs) -> Result<()> {
    super::validate_common(args.threads, args.iterations, args.time_limit)?;
    if !args.fs.is_finite() || args.fs <= MIN_SAMPLING_FREQUENCY {
        bail!(
            "FS must be greater than {MIN_SAMPLING_FREQUENCY:e} (got {}); pass the cosine sampling frequency, e.g. `1.0`",
            args.fs
        );
    }
    if args.rank == 0 {
        bail!("RANK must be at least 1 (got 0)");
    }
    if args.dims.len() != args.rank {
        bail!(
            "RANK is {} but {} dimension size(s) were given; pass exactly one size per dimension, e.g. `fftb cosine noplot 4 10 1.0 2 256 256`",
            args.rank,
            args.dims.len()
        );
    }
    if let Some(axis) = args.dims.iter().position(|&n| n == 0) {
        bail!("dimension {axis} has size 0; every dimension must be at least 1");
    }
    Ok(())
}

pub fn run(args: CosineArgs, verbose: u8) -> Result<()> {
    trace!(rank = args.rank, dims = ?args.dims, fs = args.fs, "cosine::run");
    validate(&args)?;

    let shape = Shape::new(args.dims.clone()).context("Invalid dimensions")?;
    let signal = CosineSignal::new(args.fs)?;
    if verbose > 0 {
        println!(
            "Round trip of a {}D cosine ({shape}) {} times on {} threads",
            shape.rank(),
            args.iterations,
            args.threads
        );
    }

    let ctx = super::acquire_engine(args.threads, args.time_limit, args.reuse_plans)?;
    let outcome = RoundTripHarness::with_iterations(args.iterations)
        .run(&ctx, &shape, &signal)
        .context("Round trip failed")?;
    ctx.release();

    println!("\n{}", outcome.report);

    // Plotting never costs the measurement its record.
    if args.plot == PlotMode::Plot {
        let series = slice_1d(&outcome.output, &shape);
        match fftb_io::plot_1d(&args.data, PLOT_TITLE, series) {
            Ok(true) => {}
            Ok(false) => warn!(data = %args.data.display(), "plot not shown; data left in place"),
            Err(e) => warn!(data = %args.data.display(), error = %e, "cannot write plot data, skipping plot"),
        }
    }

    super::append_record(&args.output, &outcome.report.to_record())
}
