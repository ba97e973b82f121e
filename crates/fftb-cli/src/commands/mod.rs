//! CLI command implementations

pub mod blur;
pub mod cosine;

use anyhow::{Context, Result, bail};
use fftb_ops::engine::{EngineConfig, PlanPolicy, TransformEngineContext};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Checks the arguments shared by every harness.
pub fn validate_common(threads: usize, iterations: usize, time_limit: f64) -> Result<()> {
    if threads == 0 {
        bail!("THREADS must be at least 1 (got 0); pass the number of worker threads, e.g. `4`");
    }
    if iterations == 0 {
        bail!("ITERATIONS must be at least 1 (got 0); pass how many times to run, e.g. `10`");
    }
    if !time_limit.is_finite() || time_limit < 0.0 {
        bail!("--time-limit must be a non-negative number of seconds (got {time_limit})");
    }
    Ok(())
}

/// Acquires the transform engine.
pub fn acquire_engine(threads: usize, time_limit: f64, reuse_plans: bool) -> Result<TransformEngineContext> {
    let plan_time_limit = Duration::try_from_secs_f64(time_limit)
        .with_context(|| format!("Invalid time limit: {time_limit}"))?;
    let config = EngineConfig {
        threads,
        plan_time_limit,
        policy: if reuse_plans {
            PlanPolicy::Reuse
        } else {
            PlanPolicy::Replan
        },
    };
    TransformEngineContext::acquire(config).context("Failed to start transform engine")
}

/// Appends a record to the results log and reports where it went.
pub fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let key = fftb_io::ResultLog::new(path)
        .append(record)
        .with_context(|| format!("Failed to append results to: {}", path.display()))?;
    println!("\nResults appended to {} under \"{key}\"", path.display());
    Ok(())
}
