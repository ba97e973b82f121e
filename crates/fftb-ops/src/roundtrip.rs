//! N-dimensional forward/inverse round-trip harness.
//!
//! A cosine is replicated over every row of an N-D array, transformed
//! forward and back `iterations` times, and the reconstruction compared with
//! the input after dividing by the sample count.

use crate::engine::TransformEngineContext;
use crate::report::RoundTripReport;
use crate::spectrum::normalize_inverse;
use crate::timing::{Phase, PhaseTimer, PhaseTotals};
use crate::{OpsError, OpsResult};
use fftb_core::{AlignedBuffer, DEFAULT_ALIGNMENT, Shape};
use num_complex::Complex;
use std::f64::consts::PI;
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

/// Smallest accepted sampling frequency.
pub const MIN_SAMPLING_FREQUENCY: f64 = 1e-8;

/// Cosine test signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosineSignal {
    /// Sampling frequency
    pub fs: f64,
}

impl CosineSignal {
    /// Signal with sampling frequency `fs`.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] unless `fs > 1e-8` and finite.
    pub fn new(fs: f64) -> OpsResult<Self> {
        if !fs.is_finite() || fs <= MIN_SAMPLING_FREQUENCY {
            return Err(OpsError::InvalidParameter(format!(
                "sampling frequency must be greater than {MIN_SAMPLING_FREQUENCY}, got {fs}"
            )));
        }
        Ok(Self { fs })
    }

    /// Sample at last-axis coordinate `i`.
    #[inline]
    pub fn sample(&self, i: usize) -> f64 {
        (i as f64 * self.fs * 180.0 / PI).cos()
    }

    /// Row-major samples for `shape`: one cosine row along the last axis,
    /// repeated for every position of the outer axes.
    pub fn generate(&self, shape: &Shape) -> Vec<f64> {
        let row: Vec<f64> = (0..shape.last()).map(|i| self.sample(i)).collect();
        let rows = shape.len() / row.len();
        let mut data = Vec::with_capacity(shape.len());
        for _ in 0..rows {
            data.extend_from_slice(&row);
        }
        data
    }
}

/// Round-trip run parameters.
#[derive(Debug, Clone)]
pub struct RoundTripHarness {
    /// Forward/inverse repetitions
    pub iterations: usize,
    /// Buffer alignment in bytes
    pub alignment: usize,
}

impl Default for RoundTripHarness {
    fn default() -> Self {
        Self {
            iterations: 1,
            alignment: DEFAULT_ALIGNMENT,
        }
    }
}

/// Result of a round-trip run.
#[derive(Debug, Clone)]
pub struct RoundTripOutcome {
    /// Timing and fidelity statistics
    pub report: RoundTripReport,
    /// Reconstructed samples, divided by `N`
    pub output: Vec<f64>,
}

impl RoundTripHarness {
    /// Harness running `iterations` round trips.
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    /// Runs the round trip of `signal` over `shape`.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] for zero iterations, allocation
    /// failures, and plan or transform failures.
    pub fn run(
        &self,
        ctx: &TransformEngineContext,
        shape: &Shape,
        signal: &CosineSignal,
    ) -> OpsResult<RoundTripOutcome> {
        if self.iterations == 0 {
            return Err(OpsError::InvalidParameter(
                "iterations must be at least 1".into(),
            ));
        }
        info!(%shape, fs = signal.fs, iterations = self.iterations, threads = ctx.threads(), "round trip starting");

        let source = signal.generate(shape);
        let mut input = AlignedBuffer::<f64>::zeroed("cosine.spatial_in", shape.len(), self.alignment)?;
        let mut spectrum = AlignedBuffer::<Complex<f64>>::zeroed(
            "cosine.spectrum",
            shape.spectrum_len(),
            self.alignment,
        )?;
        let mut output = AlignedBuffer::<f64>::zeroed("cosine.spatial_out", shape.len(), self.alignment)?;

        let mut totals = PhaseTotals::new();
        for iteration in 0..self.iterations {
            let mut forward = ctx.plan_forward(shape)?;
            let mut inverse = ctx.plan_inverse(shape)?;

            // Inputs are filled only once the plans exist.
            input.fill_from(&source)?;

            let timer = PhaseTimer::start(Phase::Forward);
            forward.execute_forward(&mut input, &mut spectrum)?;
            totals.record(timer.stop());

            let timer = PhaseTimer::start(Phase::Inverse);
            inverse.execute_inverse(&mut spectrum, &mut output)?;
            totals.record(timer.stop());

            forward.destroy();
            inverse.destroy();
            trace!(iteration, "round trip iteration complete");
        }

        let mut result = output.to_vec();
        normalize_inverse(&mut result, shape.len());
        let max_abs_error = result
            .iter()
            .zip(&source)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);

        let report = RoundTripReport {
            dims: shape.dims().to_vec(),
            fs: signal.fs,
            iterations: self.iterations,
            threads: ctx.threads(),
            average_forward_secs: totals.average_secs(Phase::Forward),
            average_inverse_secs: totals.average_secs(Phase::Inverse),
            max_abs_error,
        };
        if max_abs_error > 1e-6 {
            warn!(max_abs_error, "round trip deviates from input");
        }
        info!(
            forward_secs = report.average_forward_secs,
            inverse_secs = report.average_inverse_secs,
            max_abs_error,
            "round trip complete"
        );
        Ok(RoundTripOutcome {
            report,
            output: result,
        })
    }
}

/// The 1-D slice along the last axis at the origin of all other axes.
pub fn slice_1d<'a>(samples: &'a [f64], shape: &Shape) -> &'a [f64] {
    &samples[..shape.last().min(samples.len())]
}
