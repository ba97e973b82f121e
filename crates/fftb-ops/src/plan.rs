//! Transform plans.
//!
//! A [`Plan`] is a direction-tagged execution handle for one problem shape.
//! Its lifecycle in the harnesses is strictly
//! `Planned → Executed → destroyed`: a plan runs once and is then consumed
//! by [`Plan::destroy`]. Dropping a plan on an early-exit path releases it
//! the same way, so the engine's live-plan count always returns to zero.
//!
//! Multi-dimensional transforms are unnormalized and laid out row-major:
//!
//! - forward: real-to-complex along the last (contiguous) axis, then
//!   complex transforms along every other axis
//! - inverse: complex transforms along the outer axes, then
//!   complex-to-real along the last axis
//!
//! Lines of each axis run in parallel on the engine's worker pool, split into
//! one contiguous group per worker. The gather buffer and every worker's
//! scratch are allocated with the plan, so execution itself does not
//! allocate.

use crate::{OpsError, OpsResult};
use fftb_core::Shape;
use num_complex::Complex;
use rayon::ThreadPool;
use rayon::prelude::*;
use realfft::{ComplexToReal, FftError, RealToComplex};
use rustfft::Fft;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Transform direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Real samples to half-spectrum.
    Forward,
    /// Half-spectrum to real samples.
    Inverse,
}

/// Lifecycle state of a live plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    /// Built, not yet run.
    Planned,
    /// Run once.
    Executed,
}

pub(crate) enum PlanKernel {
    Forward {
        r2c: Arc<dyn RealToComplex<f64>>,
        axes: Vec<Arc<dyn Fft<f64>>>,
    },
    Inverse {
        c2r: Arc<dyn ComplexToReal<f64>>,
        axes: Vec<Arc<dyn Fft<f64>>>,
    },
}

impl PlanKernel {
    fn axes(&self) -> &[Arc<dyn Fft<f64>>] {
        match self {
            PlanKernel::Forward { axes, .. } | PlanKernel::Inverse { axes, .. } => axes,
        }
    }

    fn line_scratch_len(&self) -> usize {
        match self {
            PlanKernel::Forward { r2c, .. } => r2c.get_scratch_len(),
            PlanKernel::Inverse { c2r, .. } => c2r.get_scratch_len(),
        }
    }
}

/// Buffers reused by every pass of one execution.
struct Workspace {
    /// Gathered lines of the axis being transformed; empty for rank 1
    lines: Vec<Complex<f64>>,
    /// `workers` slices of `scratch_len` each
    scratch: Vec<Complex<f64>>,
    scratch_len: usize,
    workers: usize,
}

impl Workspace {
    fn new(shape: &Shape, kernel: &PlanKernel, workers: usize) -> Self {
        let workers = workers.max(1);
        let scratch_len = kernel
            .axes()
            .iter()
            .map(|fft| fft.get_inplace_scratch_len())
            .fold(kernel.line_scratch_len(), usize::max)
            .max(1);
        let lines = if kernel.axes().is_empty() {
            Vec::new()
        } else {
            vec![Complex::new(0.0, 0.0); shape.spectrum_len()]
        };
        Self {
            lines,
            scratch: vec![Complex::new(0.0, 0.0); scratch_len * workers],
            scratch_len,
            workers,
        }
    }

    /// Lines per worker group when `count` lines are split across workers.
    fn group_size(&self, count: usize) -> usize {
        count.div_ceil(self.workers).max(1)
    }
}

/// Execution handle for one transform shape and direction.
pub struct Plan {
    direction: Direction,
    shape: Shape,
    state: PlanState,
    kernel: PlanKernel,
    workspace: Workspace,
    pool: Arc<ThreadPool>,
    live: Arc<AtomicUsize>,
    planning_time: Duration,
}

impl Plan {
    pub(crate) fn new(
        direction: Direction,
        shape: Shape,
        kernel: PlanKernel,
        pool: Arc<ThreadPool>,
        live: Arc<AtomicUsize>,
        planning_time: Duration,
    ) -> Self {
        let workspace = Workspace::new(&shape, &kernel, pool.current_num_threads());
        Self {
            direction,
            shape,
            state: PlanState::Planned,
            kernel,
            workspace,
            pool,
            live,
            planning_time,
        }
    }

    /// Transform direction.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Problem shape the plan was built for.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> PlanState {
        self.state
    }

    /// Time spent building the plan.
    #[inline]
    pub fn planning_time(&self) -> Duration {
        self.planning_time
    }

    /// Runs a forward plan: `input` (real, clobbered) → `output` (half-spectrum).
    ///
    /// # Errors
    ///
    /// - [`OpsError::PlanState`] if this is an inverse plan or was already executed
    /// - [`OpsError::SizeMismatch`] if buffer lengths do not match the shape
    pub fn execute_forward(
        &mut self,
        input: &mut [f64],
        output: &mut [Complex<f64>],
    ) -> OpsResult<()> {
        self.begin()?;
        self.check_lengths(input.len(), output.len())?;
        let PlanKernel::Forward { r2c, axes } = &self.kernel else {
            return Err(OpsError::PlanState(
                "forward execution requested on an inverse plan".into(),
            ));
        };

        let last = self.shape.last();
        let spectrum_dims = self.shape.spectrum_dims();
        let half = spectrum_dims[spectrum_dims.len() - 1];
        let workspace = &mut self.workspace;
        let per = workspace.group_size(input.len() / last);

        self.pool.install(|| -> OpsResult<()> {
            input
                .par_chunks_mut(per * last)
                .zip(output.par_chunks_mut(per * half))
                .zip(workspace.scratch.par_chunks_mut(workspace.scratch_len))
                .try_for_each(|((src, dst), scratch)| {
                    src.chunks_mut(last)
                        .zip(dst.chunks_mut(half))
                        .try_for_each(|(s, d)| {
                            r2c.process_with_scratch(s, d, scratch)
                                .map_err(transform_error)
                        })
                })?;
            for (axis, fft) in axes.iter().enumerate() {
                transform_axis(output, workspace, &spectrum_dims, axis, fft.as_ref());
            }
            Ok(())
        })?;

        self.state = PlanState::Executed;
        trace!(shape = %self.shape, "forward plan executed");
        Ok(())
    }

    /// Runs an inverse plan: `input` (half-spectrum, clobbered) → `output` (real).
    ///
    /// Output is unnormalized: a forward/inverse round trip scales by the
    /// total sample count.
    ///
    /// # Errors
    ///
    /// As [`Plan::execute_forward`].
    pub fn execute_inverse(
        &mut self,
        input: &mut [Complex<f64>],
        output: &mut [f64],
    ) -> OpsResult<()> {
        self.begin()?;
        self.check_lengths(output.len(), input.len())?;
        let PlanKernel::Inverse { c2r, axes } = &self.kernel else {
            return Err(OpsError::PlanState(
                "inverse execution requested on a forward plan".into(),
            ));
        };

        let last = self.shape.last();
        let spectrum_dims = self.shape.spectrum_dims();
        let half = spectrum_dims[spectrum_dims.len() - 1];
        let workspace = &mut self.workspace;
        let per = workspace.group_size(output.len() / last);

        self.pool.install(|| -> OpsResult<()> {
            for (axis, fft) in axes.iter().enumerate() {
                transform_axis(input, workspace, &spectrum_dims, axis, fft.as_ref());
            }
            input
                .par_chunks_mut(per * half)
                .zip(output.par_chunks_mut(per * last))
                .zip(workspace.scratch.par_chunks_mut(workspace.scratch_len))
                .try_for_each(|((src, dst), scratch)| {
                    src.chunks_mut(half)
                        .zip(dst.chunks_mut(last))
                        .try_for_each(|(s, d)| match c2r.process_with_scratch(s, d, scratch) {
                            // Rounding leaves tiny imaginary parts on the DC and
                            // Nyquist bins; they are ignored by the transform.
                            Ok(()) | Err(FftError::InputValues(..)) => Ok(()),
                            Err(e) => Err(transform_error(e)),
                        })
                })
        })?;

        self.state = PlanState::Executed;
        trace!(shape = %self.shape, "inverse plan executed");
        Ok(())
    }

    /// Releases the plan.
    pub fn destroy(self) {
        trace!(shape = %self.shape, direction = ?self.direction, "plan destroyed");
    }

    fn begin(&self) -> OpsResult<()> {
        match self.state {
            PlanState::Planned => Ok(()),
            PlanState::Executed => Err(OpsError::PlanState(format!(
                "{:?} plan for {} already executed",
                self.direction, self.shape
            ))),
        }
    }

    fn check_lengths(&self, real_len: usize, complex_len: usize) -> OpsResult<()> {
        if real_len != self.shape.len() || complex_len != self.shape.spectrum_len() {
            return Err(OpsError::SizeMismatch(format!(
                "shape {} needs {} real and {} complex samples, got {} and {}",
                self.shape,
                self.shape.len(),
                self.shape.spectrum_len(),
                real_len,
                complex_len
            )));
        }
        Ok(())
    }
}

impl Drop for Plan {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("direction", &self.direction)
            .field("shape", &self.shape)
            .field("state", &self.state)
            .field("planning_time", &self.planning_time)
            .finish()
    }
}

fn transform_error(e: FftError) -> OpsError {
    OpsError::Transform(e.to_string())
}

/// In-place complex transform of every line along `axis` of a row-major
/// array with dimensions `dims`.
///
/// Lines are gathered into the workspace, transformed one worker group at a
/// time and scattered back.
fn transform_axis(
    data: &mut [Complex<f64>],
    workspace: &mut Workspace,
    dims: &[usize],
    axis: usize,
    fft: &dyn Fft<f64>,
) {
    let n = dims[axis];
    if n <= 1 {
        return;
    }
    debug_assert_eq!(workspace.lines.len(), data.len());
    let stride = Shape::strides_of(dims)[axis];
    let block = n * stride;
    let per = workspace.group_size(data.len() / n);

    {
        let src: &[Complex<f64>] = data;
        workspace
            .lines
            .par_chunks_mut(per * n)
            .zip(workspace.scratch.par_chunks_mut(workspace.scratch_len))
            .enumerate()
            .for_each(|(g, (group, scratch))| {
                for (j, line) in group.chunks_mut(n).enumerate() {
                    let k = g * per + j;
                    let base = (k / stride) * block + k % stride;
                    for (i, v) in line.iter_mut().enumerate() {
                        *v = src[base + i * stride];
                    }
                }
                fft.process_with_scratch(group, scratch);
            });
    }

    let lines = &workspace.lines;
    data.par_chunks_mut(block)
        .enumerate()
        .for_each(|(b, chunk)| {
            for j in 0..stride {
                let line = &lines[(b * stride + j) * n..(b * stride + j + 1) * n];
                for (i, &v) in line.iter().enumerate() {
                    chunk[j + i * stride] = v;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use crate::engine::{EngineConfig, PlanPolicy, TransformEngineContext};
    use crate::OpsError;
    use approx::assert_abs_diff_eq;
    use fftb_core::Shape;
    use num_complex::Complex;

    fn ctx(threads: usize) -> TransformEngineContext {
        TransformEngineContext::acquire(EngineConfig::with_threads(threads)).unwrap()
    }

    /// Naive DFT of a real row-major array, half-spectrum output.
    fn naive_r2c(data: &[f64], dims: &[usize]) -> Vec<Complex<f64>> {
        let shape = Shape::new(dims.to_vec()).unwrap();
        let sdims = shape.spectrum_dims();
        let rstrides = shape.strides();
        let sstrides = Shape::strides_of(&sdims);
        let mut out = vec![Complex::new(0.0, 0.0); shape.spectrum_len()];
        for (s, o) in out.iter_mut().enumerate() {
            let k: Vec<usize> = (0..dims.len()).map(|a| s / sstrides[a] % sdims[a]).collect();
            for (r, &v) in data.iter().enumerate() {
                let mut phase = 0.0;
                for a in 0..dims.len() {
                    let x = r / rstrides[a] % dims[a];
                    phase += (k[a] * x) as f64 / dims[a] as f64;
                }
                let angle = -2.0 * std::f64::consts::PI * phase;
                *o += Complex::new(angle.cos(), angle.sin()) * v;
            }
        }
        out
    }

    #[test]
    fn forward_matches_naive_dft() {
        for dims in [vec![6], vec![3, 4], vec![2, 3, 5]] {
            let shape = Shape::new(dims.clone()).unwrap();
            let data: Vec<f64> = (0..shape.len()).map(|i| (i as f64 * 0.37).sin()).collect();
            let expected = naive_r2c(&data, &dims);

            let ctx = ctx(2);
            let mut plan = ctx.plan_forward(&shape).unwrap();
            let mut input = data.clone();
            let mut output = vec![Complex::new(0.0, 0.0); shape.spectrum_len()];
            plan.execute_forward(&mut input, &mut output).unwrap();
            plan.destroy();

            for (a, b) in output.iter().zip(&expected) {
                assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-9);
                assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn uneven_worker_groups_match_naive_dft() {
        // Line counts that do not divide evenly, and fewer lines than workers.
        for (dims, threads) in [(vec![5, 7, 3], 3), (vec![2, 3], 4), (vec![7, 5], 2)] {
            let shape = Shape::new(dims.clone()).unwrap();
            let data: Vec<f64> = (0..shape.len()).map(|i| ((i * 13) % 11) as f64 - 5.0).collect();
            let expected = naive_r2c(&data, &dims);

            let ctx = ctx(threads);
            let mut plan = ctx.plan_forward(&shape).unwrap();
            let mut input = data.clone();
            let mut output = vec![Complex::new(0.0, 0.0); shape.spectrum_len()];
            plan.execute_forward(&mut input, &mut output).unwrap();

            for (a, b) in output.iter().zip(&expected) {
                assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-9);
                assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn workspace_is_sized_at_planning() {
        let ctx = ctx(3);
        let plane = Shape::new(vec![6, 10]).unwrap();
        let plan = ctx.plan_inverse(&plane).unwrap();
        assert_eq!(plan.workspace.lines.len(), plane.spectrum_len());
        assert_eq!(plan.workspace.workers, 3);
        assert_eq!(plan.workspace.scratch.len(), 3 * plan.workspace.scratch_len);
        assert!(plan.workspace.scratch_len >= 1);

        let line = Shape::new(vec![16]).unwrap();
        assert!(ctx.plan_forward(&line).unwrap().workspace.lines.is_empty());
    }

    #[test]
    fn round_trip_scales_by_len() {
        let shape = Shape::new(vec![4, 3, 6]).unwrap();
        let data: Vec<f64> = (0..shape.len()).map(|i| (i % 7) as f64 - 3.0).collect();
        let ctx = TransformEngineContext::acquire(EngineConfig {
            threads: 3,
            policy: PlanPolicy::Reuse,
            ..EngineConfig::default()
        })
        .unwrap();

        let mut fwd = ctx.plan_forward(&shape).unwrap();
        let mut inv = ctx.plan_inverse(&shape).unwrap();
        let mut input = data.clone();
        let mut spectrum = vec![Complex::new(0.0, 0.0); shape.spectrum_len()];
        let mut back = vec![0.0; shape.len()];
        fwd.execute_forward(&mut input, &mut spectrum).unwrap();
        inv.execute_inverse(&mut spectrum, &mut back).unwrap();
        fwd.destroy();
        inv.destroy();

        let n = shape.len() as f64;
        for (a, b) in back.iter().zip(&data) {
            assert_abs_diff_eq!(a / n, *b, epsilon = 1e-9);
        }
        assert_eq!(ctx.live_plans(), 0);
    }

    #[test]
    fn executes_once() {
        let shape = Shape::new(vec![8]).unwrap();
        let ctx = ctx(1);
        let mut plan = ctx.plan_forward(&shape).unwrap();
        let mut input = vec![1.0; 8];
        let mut output = vec![Complex::new(0.0, 0.0); 5];
        plan.execute_forward(&mut input, &mut output).unwrap();
        assert_eq!(plan.state(), super::PlanState::Executed);
        assert!(matches!(
            plan.execute_forward(&mut input, &mut output),
            Err(OpsError::PlanState(_))
        ));
    }

    #[test]
    fn rejects_wrong_direction_and_sizes() {
        let shape = Shape::new(vec![2, 4]).unwrap();
        let ctx = ctx(1);
        let mut inv = ctx.plan_inverse(&shape).unwrap();
        let mut real = vec![0.0; 8];
        let mut spec = vec![Complex::new(0.0, 0.0); 6];
        assert!(matches!(
            inv.execute_forward(&mut real, &mut spec),
            Err(OpsError::PlanState(_))
        ));

        let mut fwd = ctx.plan_forward(&shape).unwrap();
        let mut short = vec![0.0; 7];
        assert!(matches!(
            fwd.execute_forward(&mut short, &mut spec),
            Err(OpsError::SizeMismatch(_))
        ));
    }

    #[test]
    fn dropped_plans_are_released() {
        let shape = Shape::new(vec![16, 16]).unwrap();
        let ctx = ctx(1);
        {
            let _a = ctx.plan_forward(&shape).unwrap();
            let _b = ctx.plan_inverse(&shape).unwrap();
            assert_eq!(ctx.live_plans(), 2);
        }
        assert_eq!(ctx.live_plans(), 0);
    }
}
