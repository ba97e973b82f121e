//! Phase timers and running totals.
//!
//! Each iteration of a harness is split into [`Phase`]s. A [`PhaseTimer`]
//! brackets one phase with a monotonic clock; the resulting
//! [`PhaseSample`]s accumulate into [`PhaseTotals`], from which averages and
//! throughput estimates are derived once the run completes.

use std::fmt;
use std::time::{Duration, Instant};

/// Measured phases of a benchmark iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Buffer allocation.
    Allocation,
    /// Forward transform execution.
    Forward,
    /// Frequency-domain multiply.
    Multiply,
    /// Inverse transform execution.
    Inverse,
}

impl Phase {
    /// All phases in pipeline order.
    pub const ALL: [Phase; 4] = [Phase::Allocation, Phase::Forward, Phase::Multiply, Phase::Inverse];

    #[inline]
    fn index(self) -> usize {
        match self {
            Phase::Allocation => 0,
            Phase::Forward => 1,
            Phase::Multiply => 2,
            Phase::Inverse => 3,
        }
    }

    /// Lowercase phase name.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Allocation => "allocation",
            Phase::Forward => "forward",
            Phase::Multiply => "multiply",
            Phase::Inverse => "inverse",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Elapsed time of one phase in one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSample {
    /// Phase measured
    pub phase: Phase,
    /// Elapsed wall-clock time
    pub elapsed: Duration,
}

/// Running timer for one phase.
#[derive(Debug)]
pub struct PhaseTimer {
    phase: Phase,
    start: Instant,
}

impl PhaseTimer {
    /// Starts timing `phase`.
    #[inline]
    pub fn start(phase: Phase) -> Self {
        Self {
            phase,
            start: Instant::now(),
        }
    }

    /// Stops the timer.
    #[inline]
    pub fn stop(self) -> PhaseSample {
        PhaseSample {
            phase: self.phase,
            elapsed: self.start.elapsed(),
        }
    }
}

/// Per-phase running totals across iterations.
#[derive(Debug, Clone, Default)]
pub struct PhaseTotals {
    totals: [Duration; 4],
    counts: [usize; 4],
}

impl PhaseTotals {
    /// Empty totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one sample.
    pub fn record(&mut self, sample: PhaseSample) {
        let i = sample.phase.index();
        self.totals[i] += sample.elapsed;
        self.counts[i] += 1;
    }

    /// Total time spent in `phase`.
    #[inline]
    pub fn total(&self, phase: Phase) -> Duration {
        self.totals[phase.index()]
    }

    /// Number of samples recorded for `phase`.
    #[inline]
    pub fn count(&self, phase: Phase) -> usize {
        self.counts[phase.index()]
    }

    /// Mean time per sample of `phase`, zero if nothing was recorded.
    pub fn average(&self, phase: Phase) -> Duration {
        match self.count(phase) {
            0 => Duration::ZERO,
            n => self.total(phase) / n as u32,
        }
    }

    /// Total in seconds.
    #[inline]
    pub fn total_secs(&self, phase: Phase) -> f64 {
        self.total(phase).as_secs_f64()
    }

    /// Mean in seconds.
    #[inline]
    pub fn average_secs(&self, phase: Phase) -> f64 {
        match self.count(phase) {
            0 => 0.0,
            n => self.total_secs(phase) / n as f64,
        }
    }
}

/// Operation-count throughput estimate for an FFT of `n` samples.
///
/// Returns `5·n·log2(n) / average_secs` floating-point operations per
/// second (the usual FFT flop-count heuristic, not a hardware counter).
/// `None` when the average time is not a positive finite number or when
/// `n < 2`, where the heuristic has no operations to count.
pub fn throughput_estimate(n: usize, average_secs: f64) -> Option<f64> {
    if !average_secs.is_finite() || average_secs <= 0.0 || n < 2 {
        return None;
    }
    let n = n as f64;
    let flops = 5.0 * n * n.log2() / average_secs;
    flops.is_finite().then_some(flops)
}

/// [`throughput_estimate`] in GFLOP/s.
pub fn gflops_estimate(n: usize, average_secs: f64) -> Option<f64> {
    throughput_estimate(n, average_secs).map(|f| f * 1e-9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_accumulate() {
        let mut t = PhaseTotals::new();
        t.record(PhaseSample { phase: Phase::Forward, elapsed: Duration::from_millis(10) });
        t.record(PhaseSample { phase: Phase::Forward, elapsed: Duration::from_millis(30) });
        t.record(PhaseSample { phase: Phase::Inverse, elapsed: Duration::from_millis(5) });
        assert_eq!(t.total(Phase::Forward), Duration::from_millis(40));
        assert_eq!(t.average(Phase::Forward), Duration::from_millis(20));
        assert_eq!(t.count(Phase::Inverse), 1);
        assert_eq!(t.average(Phase::Multiply), Duration::ZERO);
        assert_eq!(t.average_secs(Phase::Multiply), 0.0);
        assert!((t.average_secs(Phase::Forward) - 0.02).abs() < 1e-12);
    }

    #[test]
    fn timer_measures_elapsed() {
        let timer = PhaseTimer::start(Phase::Multiply);
        std::thread::sleep(Duration::from_millis(2));
        let sample = timer.stop();
        assert_eq!(sample.phase, Phase::Multiply);
        assert!(sample.elapsed >= Duration::from_millis(2));
    }

    #[test]
    fn throughput_positive_and_finite() {
        for n in [2, 16, 1 << 20, 1920 * 1080] {
            for t in [1e-9, 1e-3, 1.0, 1e3] {
                let f = throughput_estimate(n, t).unwrap();
                assert!(f > 0.0 && f.is_finite());
            }
        }
        assert_eq!(throughput_estimate(1024, 1.0), Some(5.0 * 1024.0 * 10.0));
    }

    #[test]
    fn throughput_guards() {
        assert_eq!(throughput_estimate(1024, 0.0), None);
        assert_eq!(throughput_estimate(1024, -1.0), None);
        assert_eq!(throughput_estimate(1024, f64::NAN), None);
        assert_eq!(throughput_estimate(1, 1.0), None);
        assert_eq!(gflops_estimate(1024, 0.0), None);
    }
}
