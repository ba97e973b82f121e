//! Aggregated run statistics.
//!
//! [`BlurReport`] and [`RoundTripReport`] are built once a harness finishes.
//! Their `Display` impls render the summary printed at the end of a run;
//! `to_record` produces the serializable entry appended to the results log.

use crate::timing::{Phase, PhaseTotals, gflops_estimate};
use serde::Serialize;
use std::fmt;

/// Statistics of an image-blur run.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurReport {
    /// Image width
    pub width: usize,
    /// Image height
    pub height: usize,
    /// Number of blurred images (iterations)
    pub iterations: usize,
    /// Engine worker threads
    pub threads: usize,
    /// Kernel extent actually used
    pub kernel_size: usize,
    /// Kernel sigma
    pub sigma: f64,
    /// Whether plans shared planner caches across iterations
    pub reused_plans: bool,
    /// Buffer allocation time (s)
    pub allocation_secs: f64,
    /// Total forward transform time over all iterations (s)
    pub forward_secs: f64,
    /// Total multiply time (s)
    pub multiply_secs: f64,
    /// Total inverse transform time (s)
    pub inverse_secs: f64,
    /// Wall time of the iteration loop (s)
    pub wall_secs: f64,
}

impl BlurReport {
    /// Builds a report from phase totals and loop wall time.
    #[allow(clippy::too_many_arguments)]
    pub fn from_totals(
        width: usize,
        height: usize,
        threads: usize,
        kernel_size: usize,
        sigma: f64,
        reused_plans: bool,
        totals: &PhaseTotals,
        wall_secs: f64,
    ) -> Self {
        Self {
            width,
            height,
            iterations: totals.count(Phase::Forward),
            threads,
            kernel_size,
            sigma,
            reused_plans,
            allocation_secs: totals.total_secs(Phase::Allocation),
            forward_secs: totals.total_secs(Phase::Forward),
            multiply_secs: totals.total_secs(Phase::Multiply),
            inverse_secs: totals.total_secs(Phase::Inverse),
            wall_secs,
        }
    }

    /// Samples per channel.
    #[inline]
    pub fn samples(&self) -> usize {
        self.width * self.height
    }

    fn per_image(&self, secs: f64) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            secs / self.iterations as f64
        }
    }

    /// Average forward time per channel transform (s).
    pub fn average_forward_secs(&self) -> f64 {
        self.per_image(self.forward_secs) / 3.0
    }

    /// Average inverse time per channel transform (s).
    pub fn average_inverse_secs(&self) -> f64 {
        self.per_image(self.inverse_secs) / 3.0
    }

    /// Forward throughput estimate (GFLOP/s) of one channel transform.
    ///
    /// Each forward phase sample covers three channels, so this is derived
    /// from a third of the per-image forward time.
    pub fn forward_gflops_per_transform(&self) -> Option<f64> {
        gflops_estimate(self.samples(), self.average_forward_secs())
    }

    /// Inverse throughput estimate (GFLOP/s) of one channel transform.
    pub fn inverse_gflops_per_transform(&self) -> Option<f64> {
        gflops_estimate(self.samples(), self.average_inverse_secs())
    }

    /// Loop time not spent executing transforms or multiplying (planning,
    /// refills, bookkeeping).
    pub fn setup_secs(&self) -> f64 {
        self.wall_secs - (self.forward_secs + self.inverse_secs + self.multiply_secs)
    }

    /// Wall time minus multiply time.
    pub fn wall_without_multiply_secs(&self) -> f64 {
        self.wall_secs - self.multiply_secs
    }

    /// Average wall time per image.
    pub fn average_wall_secs(&self) -> f64 {
        self.per_image(self.wall_secs)
    }

    /// Average wall time per image, excluding the multiply.
    pub fn average_wall_without_multiply_secs(&self) -> f64 {
        self.per_image(self.wall_without_multiply_secs())
    }

    /// Serializable results-log entry.
    pub fn to_record(&self) -> BlurRecord {
        BlurRecord {
            performance_results: BlurResults {
                inputs: BlurInputs {
                    num_images: self.iterations,
                    image_dims: [self.width, self.height],
                    threads: self.threads,
                    kernel_size: self.kernel_size,
                    sigma: self.sigma,
                    reused_plans: self.reused_plans,
                },
                forward_dft_results: DftTotals {
                    total_execution_time_seconds: self.forward_secs,
                    average_per_transform_seconds: self.average_forward_secs(),
                    per_transform_gflops: self.forward_gflops_per_transform(),
                },
                backward_dft_results: DftTotals {
                    total_execution_time_seconds: self.inverse_secs,
                    average_per_transform_seconds: self.average_inverse_secs(),
                    per_transform_gflops: self.inverse_gflops_per_transform(),
                },
                misc: BlurMisc {
                    allocation_time_seconds: self.allocation_secs,
                    overall_setup_time_seconds: self.setup_secs(),
                    blur_time_seconds: self.multiply_secs,
                    wall_time_without_blur_seconds: self.wall_without_multiply_secs(),
                    wall_time_seconds: self.wall_secs,
                },
            },
        }
    }
}

fn fmt_gflops(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |g| format!("{g:.3}"))
}

impl fmt::Display for BlurReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.iterations;
        writeln!(f, "PERFORMANCE RESULTS")?;
        writeln!(f, "===================")?;
        writeln!(f, "Operations:")?;
        writeln!(f, "    {n} images of size {}x{} analyzed", self.width, self.height)?;
        writeln!(f, "    {} threads used", self.threads)?;
        writeln!(f, "    {0}x{0} kernel, sigma {1}", self.kernel_size, self.sigma)?;
        writeln!(f, "Allocation")?;
        writeln!(f, "    {:.3} sec to allocate buffers", self.allocation_secs)?;
        writeln!(f, "FFT Performance Results")?;
        writeln!(
            f,
            "    {} FFT performance GFlops per channel transform",
            fmt_gflops(self.forward_gflops_per_transform())
        )?;
        writeln!(f, "    {:.3} sec FFT execution time", self.forward_secs)?;
        writeln!(f, "Inverse FFT Performance Results")?;
        writeln!(
            f,
            "    {} IFFT performance GFlops per channel transform",
            fmt_gflops(self.inverse_gflops_per_transform())
        )?;
        writeln!(f, "    {:.3} sec IFFT execution time", self.inverse_secs)?;
        writeln!(f, "FFT + IFFT Setup time")?;
        writeln!(f, "    Took {:.3} sec to setup {n} images", self.setup_secs())?;
        writeln!(f, "    Took {:.3} sec to setup a single image", self.per_image(self.setup_secs()))?;
        writeln!(f, "Blur time (frequency-domain multiply)")?;
        writeln!(f, "    Took {:.3} sec to blur {n} images", self.multiply_secs)?;
        writeln!(f, "    Took {:.3} sec to blur a single image", self.per_image(self.multiply_secs))?;
        writeln!(f, "Wall time")?;
        writeln!(f, "    Took {:.3} sec to blur {n} images", self.wall_secs)?;
        writeln!(f, "    Took {:.3} sec to blur a single image", self.average_wall_secs())?;
        writeln!(f, "Wall time (excluding multiply)")?;
        writeln!(f, "    Took {:.3} sec for {n} images", self.wall_without_multiply_secs())?;
        write!(f, "    Took {:.3} sec for a single image", self.average_wall_without_multiply_secs())
    }
}

/// Results-log entry of a blur run.
#[derive(Debug, Clone, Serialize)]
pub struct BlurRecord {
    /// Nested results
    pub performance_results: BlurResults,
}

/// Body of a [`BlurRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct BlurResults {
    /// Run inputs
    pub inputs: BlurInputs,
    /// Forward transform statistics
    pub forward_dft_results: DftTotals,
    /// Inverse transform statistics
    pub backward_dft_results: DftTotals,
    /// Remaining timings
    pub misc: BlurMisc,
}

/// Inputs of a blur run.
#[derive(Debug, Clone, Serialize)]
pub struct BlurInputs {
    /// Iterations
    pub num_images: usize,
    /// `[width, height]`
    pub image_dims: [usize; 2],
    /// Worker threads
    pub threads: usize,
    /// Kernel extent
    pub kernel_size: usize,
    /// Kernel sigma
    pub sigma: f64,
    /// Planner caches shared across iterations
    pub reused_plans: bool,
}

/// Transform timing of a blur run.
#[derive(Debug, Clone, Serialize)]
pub struct DftTotals {
    /// Sum over all iterations (s)
    pub total_execution_time_seconds: f64,
    /// Mean of one channel transform (s)
    pub average_per_transform_seconds: f64,
    /// Throughput of one channel transform, `null` when undefined
    pub per_transform_gflops: Option<f64>,
}

/// Non-transform timings of a blur run.
#[derive(Debug, Clone, Serialize)]
pub struct BlurMisc {
    /// Buffer allocation (s)
    pub allocation_time_seconds: f64,
    /// Loop time outside transforms and multiply (s)
    pub overall_setup_time_seconds: f64,
    /// Multiply total (s)
    pub blur_time_seconds: f64,
    /// Wall minus multiply (s)
    pub wall_time_without_blur_seconds: f64,
    /// Loop wall time (s)
    pub wall_time_seconds: f64,
}

/// Statistics of an N-D round-trip run.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTripReport {
    /// Dimension sizes
    pub dims: Vec<usize>,
    /// Sampling frequency of the generated signal
    pub fs: f64,
    /// Iterations
    pub iterations: usize,
    /// Engine worker threads
    pub threads: usize,
    /// Mean forward execution time (s)
    pub average_forward_secs: f64,
    /// Mean inverse execution time (s)
    pub average_inverse_secs: f64,
    /// Largest `|output/N - input|` after the final iteration
    pub max_abs_error: f64,
}

impl RoundTripReport {
    /// Total samples.
    pub fn samples(&self) -> usize {
        self.dims.iter().product()
    }

    /// Forward throughput estimate (GFLOP/s).
    pub fn forward_gflops(&self) -> Option<f64> {
        gflops_estimate(self.samples(), self.average_forward_secs)
    }

    /// Inverse throughput estimate (GFLOP/s).
    pub fn inverse_gflops(&self) -> Option<f64> {
        gflops_estimate(self.samples(), self.average_inverse_secs)
    }

    /// Serializable results-log entry.
    pub fn to_record(&self) -> RoundTripRecord {
        RoundTripRecord {
            performance_results: RoundTripResults {
                inputs: RoundTripInputs {
                    rank: self.dims.len(),
                    dims: self.dims.clone(),
                    fs_hz: self.fs,
                    iterations: self.iterations,
                    threads: self.threads,
                },
                forward_dft_results: DftAverages {
                    average_execution_time_seconds: self.average_forward_secs,
                    average_gflops: self.forward_gflops(),
                },
                backward_dft_results: DftAverages {
                    average_execution_time_seconds: self.average_inverse_secs,
                    average_gflops: self.inverse_gflops(),
                },
                round_trip: RoundTripFidelity {
                    max_abs_error: self.max_abs_error,
                },
            },
        }
    }
}

impl fmt::Display for RoundTripReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.dims.iter().map(|d| d.to_string()).collect();
        writeln!(f, "PERFORMANCE RESULTS")?;
        writeln!(f, "===================")?;
        writeln!(f, "Input Info:")?;
        writeln!(f, "    One {}D cosine: {} samples", self.dims.len(), dims.join(" x "))?;
        writeln!(f, "    fs = {:.2e} Hz", self.fs)?;
        writeln!(f, "    {} iterations", self.iterations)?;
        writeln!(f, "    {} threads used", self.threads)?;
        writeln!(f, "DFT Results")?;
        writeln!(f, "    Forward DFT execution time: {:.6} sec", self.average_forward_secs)?;
        writeln!(f, "    Forward DFT GFlops: {}", fmt_gflops(self.forward_gflops()))?;
        writeln!(f, "    Backward DFT execution time: {:.6} sec", self.average_inverse_secs)?;
        writeln!(f, "    Backward DFT GFlops: {}", fmt_gflops(self.inverse_gflops()))?;
        write!(f, "    Round-trip max abs error: {:.3e}", self.max_abs_error)
    }
}

/// Results-log entry of a round-trip run.
#[derive(Debug, Clone, Serialize)]
pub struct RoundTripRecord {
    /// Nested results
    pub performance_results: RoundTripResults,
}

/// Body of a [`RoundTripRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct RoundTripResults {
    /// Run inputs
    pub inputs: RoundTripInputs,
    /// Forward transform statistics
    pub forward_dft_results: DftAverages,
    /// Inverse transform statistics
    pub backward_dft_results: DftAverages,
    /// Reconstruction fidelity
    pub round_trip: RoundTripFidelity,
}

/// Inputs of a round-trip run.
#[derive(Debug, Clone, Serialize)]
pub struct RoundTripInputs {
    /// Number of dimensions
    pub rank: usize,
    /// Dimension sizes
    pub dims: Vec<usize>,
    /// Sampling frequency
    #[serde(rename = "fs_Hz")]
    pub fs_hz: f64,
    /// Iterations
    pub iterations: usize,
    /// Worker threads
    pub threads: usize,
}

/// Mean transform timing.
#[derive(Debug, Clone, Serialize)]
pub struct DftAverages {
    /// Mean execution time (s)
    pub average_execution_time_seconds: f64,
    /// Throughput estimate, `null` when undefined
    pub average_gflops: Option<f64>,
}

/// Round-trip reconstruction error.
#[derive(Debug, Clone, Serialize)]
pub struct RoundTripFidelity {
    /// Largest absolute deviation from the input
    pub max_abs_error: f64,
}
