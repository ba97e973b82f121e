//! Transform engine context.
//!
//! [`TransformEngineContext`] holds what a transform library usually keeps
//! as process-wide state: the worker pool every plan executes on and the
//! planning configuration. It is acquired once per run with a fixed worker
//! count and released when the run ends (explicitly through
//! [`TransformEngineContext::release`] or on drop), so independent contexts
//! can coexist in tests.
//!
//! Plans are requested from the context ([`TransformEngineContext::plan_forward`],
//! [`TransformEngineContext::plan_inverse`]) and report back when they are
//! destroyed; [`TransformEngineContext::live_plans`] counts the ones still
//! outstanding.
//!
//! # Example
//!
//! ```rust
//! use fftb_core::Shape;
//! use fftb_ops::engine::{EngineConfig, TransformEngineContext};
//!
//! let ctx = TransformEngineContext::acquire(EngineConfig::with_threads(2)).unwrap();
//! let shape = Shape::new(vec![4, 8]).unwrap();
//! let plan = ctx.plan_forward(&shape).unwrap();
//! assert_eq!(ctx.live_plans(), 1);
//! plan.destroy();
//! assert_eq!(ctx.live_plans(), 0);
//! ctx.release();
//! ```

use crate::plan::{Direction, Plan, PlanKernel};
use crate::{OpsError, OpsResult};
use fftb_core::Shape;
use rayon::{ThreadPool, ThreadPoolBuilder};
use realfft::RealFftPlanner;
use rustfft::{Fft, FftPlanner};
use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

/// Default planning time budget.
pub const DEFAULT_PLAN_TIME_LIMIT: Duration = Duration::from_secs(2);

/// Whether plans are rebuilt from scratch or share planner caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanPolicy {
    /// Every plan request builds fresh planners; nothing carries over
    /// between iterations, so planning cost is measured in full.
    #[default]
    Replan,
    /// The context keeps its planners; repeated shapes reuse cached
    /// algorithms and twiddle tables, which lowers measured setup time.
    Reuse,
}

/// Engine configuration, fixed for the lifetime of a context.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Worker threads used inside each transform execution (≥ 1).
    pub threads: usize,
    /// Planning time budget; overruns are reported, not aborted.
    pub plan_time_limit: Duration,
    /// Plan caching policy.
    pub policy: PlanPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            plan_time_limit: DEFAULT_PLAN_TIME_LIMIT,
            policy: PlanPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Default configuration with `threads` workers.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads,
            ..Self::default()
        }
    }
}

struct Planners {
    real: RealFftPlanner<f64>,
    complex: FftPlanner<f64>,
}

impl Planners {
    fn new() -> Self {
        Self {
            real: RealFftPlanner::new(),
            complex: FftPlanner::new(),
        }
    }

    fn build(&mut self, shape: &Shape, direction: Direction) -> PlanKernel {
        let dims = shape.dims();
        let outer = &dims[..dims.len() - 1];
        match direction {
            Direction::Forward => {
                let axes: Vec<Arc<dyn Fft<f64>>> = outer
                    .iter()
                    .map(|&n| self.complex.plan_fft_forward(n))
                    .collect();
                PlanKernel::Forward {
                    r2c: self.real.plan_fft_forward(shape.last()),
                    axes,
                }
            }
            Direction::Inverse => {
                let axes: Vec<Arc<dyn Fft<f64>>> = outer
                    .iter()
                    .map(|&n| self.complex.plan_fft_inverse(n))
                    .collect();
                PlanKernel::Inverse {
                    c2r: self.real.plan_fft_inverse(shape.last()),
                    axes,
                }
            }
        }
    }
}

/// Worker pool and planning state for one benchmark run.
pub struct TransformEngineContext {
    config: EngineConfig,
    pool: Option<Arc<ThreadPool>>,
    planners: RefCell<Planners>,
    live: Arc<AtomicUsize>,
    created: AtomicUsize,
}

impl TransformEngineContext {
    /// Creates the worker pool and planning state.
    ///
    /// # Errors
    ///
    /// - [`OpsError::InvalidParameter`] if `threads` is zero
    /// - [`OpsError::ThreadPool`] if the pool cannot be spawned
    pub fn acquire(config: EngineConfig) -> OpsResult<Self> {
        if config.threads == 0 {
            return Err(OpsError::InvalidParameter(
                "thread count must be at least 1".into(),
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("fftb-worker-{i}"))
            .build()
            .map_err(|e| OpsError::ThreadPool(e.to_string()))?;

        info!(
            threads = config.threads,
            time_limit_ms = config.plan_time_limit.as_millis() as u64,
            policy = ?config.policy,
            "transform engine acquired"
        );
        Ok(Self {
            config,
            pool: Some(Arc::new(pool)),
            planners: RefCell::new(Planners::new()),
            live: Arc::new(AtomicUsize::new(0)),
            created: AtomicUsize::new(0),
        })
    }

    /// Configuration the context was acquired with.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Worker thread count.
    #[inline]
    pub fn threads(&self) -> usize {
        self.config.threads
    }

    /// Plans created and not yet destroyed.
    #[inline]
    pub fn live_plans(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Plans created over the context's lifetime.
    #[inline]
    pub fn plans_created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Plans a forward real-to-complex transform of `shape`.
    pub fn plan_forward(&self, shape: &Shape) -> OpsResult<Plan> {
        self.plan(shape, Direction::Forward)
    }

    /// Plans an inverse complex-to-real transform of `shape`.
    pub fn plan_inverse(&self, shape: &Shape) -> OpsResult<Plan> {
        self.plan(shape, Direction::Inverse)
    }

    fn plan(&self, shape: &Shape, direction: Direction) -> OpsResult<Plan> {
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| OpsError::PlanState("engine context already released".into()))?;

        let start = Instant::now();
        let kernel = match self.config.policy {
            PlanPolicy::Replan => Planners::new().build(shape, direction),
            PlanPolicy::Reuse => self.planners.borrow_mut().build(shape, direction),
        };
        let elapsed = start.elapsed();

        if elapsed > self.config.plan_time_limit {
            warn!(
                %shape,
                ?direction,
                elapsed_ms = elapsed.as_millis() as u64,
                limit_ms = self.config.plan_time_limit.as_millis() as u64,
                "planning exceeded time budget"
            );
        }
        trace!(%shape, ?direction, elapsed_us = elapsed.as_micros() as u64, "plan created");

        self.live.fetch_add(1, Ordering::AcqRel);
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(Plan::new(
            direction,
            shape.clone(),
            kernel,
            Arc::clone(pool),
            Arc::clone(&self.live),
            elapsed,
        ))
    }

    /// Tears down the worker pool.
    pub fn release(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(pool) = self.pool.take() {
            let live = self.live_plans();
            if live > 0 {
                warn!(live, "engine released with plans still alive");
            }
            drop(pool);
            debug!(plans = self.plans_created(), "transform engine released");
        }
    }
}

impl Drop for TransformEngineContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_threads() {
        assert!(matches!(
            TransformEngineContext::acquire(EngineConfig::with_threads(0)),
            Err(OpsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn counts_live_plans() {
        let ctx = TransformEngineContext::acquire(EngineConfig::with_threads(1)).unwrap();
        let shape = Shape::new(vec![4, 4]).unwrap();
        let f = ctx.plan_forward(&shape).unwrap();
        let i = ctx.plan_inverse(&shape).unwrap();
        assert_eq!(ctx.live_plans(), 2);
        f.destroy();
        drop(i);
        assert_eq!(ctx.live_plans(), 0);
        assert_eq!(ctx.plans_created(), 2);
    }

    #[test]
    fn independent_contexts() {
        let a = TransformEngineContext::acquire(EngineConfig::with_threads(1)).unwrap();
        let b = TransformEngineContext::acquire(EngineConfig {
            threads: 3,
            policy: PlanPolicy::Reuse,
            ..EngineConfig::default()
        })
        .unwrap();
        let shape = Shape::new(vec![8]).unwrap();
        let _p = b.plan_forward(&shape).unwrap();
        assert_eq!(a.live_plans(), 0);
        assert_eq!(b.live_plans(), 1);
        assert_eq!(b.threads(), 3);
    }
}
