//! Frequency-domain Gaussian blur harness.
//!
//! Blurs one RGB image `iterations` times through the convolution theorem
//! and measures each phase:
//!
//! ```text
//! allocate buffers                          (timed once)
//! for each iteration:
//!     plan r2c × 3 channels + kernel
//!     fill spatial inputs
//!     execute channel forwards              (timed)
//!     execute kernel forward
//!     plan c2r × 3 channels
//!     multiply spectra                      (timed)
//!     execute channel inverses              (timed)
//!     destroy all 7 plans
//! normalize by N and clamp to [0, 1]
//! ```
//!
//! Wall time covers the whole iteration loop, so planning and refills show
//! up as setup time in the [`BlurReport`].

use crate::channels::{Channel, ChannelBuffers};
use crate::engine::{PlanPolicy, TransformEngineContext};
use crate::kernel::{DEFAULT_KERNEL_SIZE, DEFAULT_SIGMA, GaussianKernel, KernelPlacement};
use crate::plan::Plan;
use crate::report::BlurReport;
use crate::spectrum::normalize_inverse;
use crate::timing::{Phase, PhaseTimer, PhaseTotals};
use crate::{OpsError, OpsResult};
use fftb_core::{DEFAULT_ALIGNMENT, RgbChannels, Shape};
use std::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

/// Blur run parameters.
#[derive(Debug, Clone)]
pub struct BlurConfig {
    /// Kernel extent `K`
    pub kernel_size: usize,
    /// Kernel standard deviation
    pub sigma: f64,
    /// Kernel placement in the padded buffer
    pub placement: KernelPlacement,
    /// Buffer alignment in bytes
    pub alignment: usize,
    /// Number of times the image is blurred
    pub iterations: usize,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_KERNEL_SIZE,
            sigma: DEFAULT_SIGMA,
            placement: KernelPlacement::default(),
            alignment: DEFAULT_ALIGNMENT,
            iterations: 1,
        }
    }
}

/// Result of a blur run.
#[derive(Debug, Clone)]
pub struct BlurOutcome {
    /// Timing statistics
    pub report: BlurReport,
    /// Blurred image of the final iteration, normalized to `[0, 1]`
    pub output: RgbChannels,
    /// Buffers that did not start on a page boundary
    pub misaligned: Vec<String>,
}

/// Kernel extent that fits a `rows × cols` image.
///
/// Kernels larger than the image are shrunk to the smaller image dimension;
/// the shrunk kernel is rebuilt and renormalized by the caller.
pub fn effective_kernel_size(requested: usize, rows: usize, cols: usize) -> usize {
    requested.min(rows).min(cols)
}

/// Runs the blur pipeline on `image`.
///
/// # Errors
///
/// - [`OpsError::InvalidParameter`] for zero iterations, an empty image or a
///   bad kernel
/// - allocation failures naming the buffer
/// - plan lifecycle or transform failures
pub fn run_blur(
    ctx: &TransformEngineContext,
    image: &RgbChannels,
    config: &BlurConfig,
) -> OpsResult<BlurOutcome> {
    if config.iterations == 0 {
        return Err(OpsError::InvalidParameter(
            "iterations must be at least 1".into(),
        ));
    }
    let (rows, cols) = (image.height, image.width);
    let shape = Shape::image(rows, cols)?;

    let extent = effective_kernel_size(config.kernel_size, rows, cols);
    if extent != config.kernel_size {
        warn!(
            requested = config.kernel_size,
            used = extent,
            width = cols,
            height = rows,
            "kernel larger than image, shrinking"
        );
    }
    let kernel = GaussianKernel::new(extent, config.sigma)?;
    let padded = kernel.padded(rows, cols, config.placement)?;

    info!(
        width = cols,
        height = rows,
        iterations = config.iterations,
        threads = ctx.threads(),
        kernel = extent,
        sigma = config.sigma,
        "blur run starting"
    );

    let mut totals = PhaseTotals::new();

    let timer = PhaseTimer::start(Phase::Allocation);
    let mut buffers = ChannelBuffers::allocate(&shape, config.alignment)?;
    totals.record(timer.stop());
    // Checked against the page boundary whatever alignment was requested.
    let misaligned = buffers.check_alignment(DEFAULT_ALIGNMENT);

    let wall = Instant::now();
    for iteration in 0..config.iterations {
        blur_iteration(ctx, &shape, &mut buffers, image, &padded, &mut totals)?;
        debug!(iteration, "blur iteration complete");
    }
    let wall_secs = wall.elapsed().as_secs_f64();

    let output = normalized_output(&buffers, image)?;
    let report = BlurReport::from_totals(
        cols,
        rows,
        ctx.threads(),
        extent,
        config.sigma,
        ctx.config().policy == PlanPolicy::Reuse,
        &totals,
        wall_secs,
    );
    info!(
        forward_secs = report.forward_secs,
        inverse_secs = report.inverse_secs,
        multiply_secs = report.multiply_secs,
        wall_secs,
        "blur run complete"
    );
    Ok(BlurOutcome {
        report,
        output,
        misaligned,
    })
}

fn blur_iteration(
    ctx: &TransformEngineContext,
    shape: &Shape,
    buffers: &mut ChannelBuffers,
    image: &RgbChannels,
    padded_kernel: &[f64],
    totals: &mut PhaseTotals,
) -> OpsResult<()> {
    let mut forward = [
        ctx.plan_forward(shape)?,
        ctx.plan_forward(shape)?,
        ctx.plan_forward(shape)?,
    ];
    let mut kernel_forward = ctx.plan_forward(shape)?;

    // Planning may clobber buffers, so inputs are filled afterwards.
    buffers.fill_spatial(image, padded_kernel)?;

    let timer = PhaseTimer::start(Phase::Forward);
    for (plan, channel) in forward.iter_mut().zip(Channel::ALL) {
        let set = buffers.channel_mut(channel);
        plan.execute_forward(&mut set.spatial_in, &mut set.spectrum_out)?;
    }
    totals.record(timer.stop());

    kernel_forward.execute_forward(
        &mut buffers.kernel.spatial_in,
        &mut buffers.kernel.spectrum_out,
    )?;

    let mut inverse = [
        ctx.plan_inverse(shape)?,
        ctx.plan_inverse(shape)?,
        ctx.plan_inverse(shape)?,
    ];

    let timer = PhaseTimer::start(Phase::Multiply);
    for channel in Channel::ALL {
        buffers.multiply(channel)?;
    }
    totals.record(timer.stop());

    let timer = PhaseTimer::start(Phase::Inverse);
    for (plan, channel) in inverse.iter_mut().zip(Channel::ALL) {
        let set = buffers.channel_mut(channel);
        plan.execute_inverse(&mut set.spectrum_in, &mut set.spatial_out)?;
    }
    totals.record(timer.stop());

    forward.into_iter().for_each(Plan::destroy);
    kernel_forward.destroy();
    inverse.into_iter().for_each(Plan::destroy);
    Ok(())
}

fn normalized_output(buffers: &ChannelBuffers, image: &RgbChannels) -> OpsResult<RgbChannels> {
    let n = buffers.shape().len();
    let [red, green, blue] = Channel::ALL.map(|channel| {
        let mut plane = buffers.channel(channel).spatial_out.to_vec();
        normalize_inverse(&mut plane, n);
        for v in &mut plane {
            *v = v.clamp(0.0, 1.0);
        }
        plane
    });
    Ok(RgbChannels::new(image.width, image.height, red, green, blue)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use approx::assert_abs_diff_eq;

    fn ctx() -> TransformEngineContext {
        TransformEngineContext::acquire(EngineConfig::with_threads(2)).unwrap()
    }

    #[test]
    fn kernel_size_clamped_to_image() {
        assert_eq!(effective_kernel_size(16, 2, 2), 2);
        assert_eq!(effective_kernel_size(16, 100, 8), 8);
        assert_eq!(effective_kernel_size(5, 100, 80), 5);
    }

    #[test]
    fn uniform_image_is_unchanged() {
        let rgb = [128.0 / 255.0, 64.0 / 255.0, 32.0 / 255.0];
        let image = RgbChannels::uniform(5, 4, rgb);
        let ctx = ctx();
        let config = BlurConfig {
            kernel_size: 3,
            sigma: 1.0,
            ..BlurConfig::default()
        };
        let outcome = run_blur(&ctx, &image, &config).unwrap();
        for (out, expected) in outcome.output.planes().iter().zip(rgb) {
            for &v in out.iter() {
                assert_abs_diff_eq!(v, expected, epsilon = 1e-9);
            }
        }
        assert_eq!(outcome.report.kernel_size, 3);
        assert_eq!(ctx.live_plans(), 0);
        assert_eq!(ctx.plans_created(), 7);
    }

    #[test]
    fn impulse_spreads_into_kernel_footprint() {
        let (w, h) = (16, 16);
        let mut image = RgbChannels::uniform(w, h, [0.0; 3]);
        image.red[0] = 1.0;
        let ctx = ctx();
        let config = BlurConfig {
            kernel_size: 5,
            sigma: 1.0,
            placement: KernelPlacement::Centered,
            iterations: 2,
            ..BlurConfig::default()
        };
        let outcome = run_blur(&ctx, &image, &config).unwrap();
        let kernel = GaussianKernel::new(5, 1.0).unwrap();
        // Centered placement keeps the impulse at the origin.
        assert_abs_diff_eq!(outcome.output.red[0], kernel.at(2, 2), epsilon = 1e-9);
        assert_abs_diff_eq!(outcome.output.red.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(outcome.output.green.iter().all(|&v| v.abs() < 1e-12));
        assert_eq!(outcome.report.iterations, 2);
        assert_eq!(ctx.plans_created(), 14);
    }

    #[test]
    fn top_left_placement_shifts_by_midpoint() {
        let (w, h) = (12, 10);
        let mut image = RgbChannels::uniform(w, h, [0.0; 3]);
        image.blue[0] = 1.0;
        let ctx = ctx();
        let config = BlurConfig {
            kernel_size: 4,
            sigma: 1.0,
            ..BlurConfig::default()
        };
        let outcome = run_blur(&ctx, &image, &config).unwrap();
        let kernel = GaussianKernel::new(4, 1.0).unwrap();
        assert_abs_diff_eq!(outcome.output.blue[2 * w + 2], kernel.at(2, 2), epsilon = 1e-9);
    }

    #[test]
    fn misaligned_buffers_are_reported_and_run_completes() {
        let rgb = [0.2, 0.4, 0.6];
        let image = RgbChannels::uniform(48, 40, rgb);
        let ctx = ctx();
        let config = BlurConfig {
            kernel_size: 3,
            sigma: 1.0,
            alignment: 8,
            ..BlurConfig::default()
        };
        let outcome = run_blur(&ctx, &image, &config).unwrap();
        assert!(!outcome.misaligned.is_empty());
        assert!(outcome.misaligned.iter().all(|n| n.contains('.')));
        for (out, expected) in outcome.output.planes().iter().zip(rgb) {
            assert!(out.iter().all(|&v| (v - expected).abs() < 1e-9));
        }
        assert_eq!(ctx.live_plans(), 0);
    }

    #[test]
    fn page_aligned_buffers_report_nothing() {
        let image = RgbChannels::uniform(8, 8, [0.5; 3]);
        let outcome = run_blur(&ctx(), &image, &BlurConfig::default()).unwrap();
        assert!(outcome.misaligned.is_empty());
    }

    #[test]
    fn rejects_zero_iterations() {
        let image = RgbChannels::uniform(4, 4, [0.5; 3]);
        let config = BlurConfig {
            iterations: 0,
            ..BlurConfig::default()
        };
        assert!(matches!(
            run_blur(&ctx(), &image, &config),
            Err(OpsError::InvalidParameter(_))
        ));
    }
}
