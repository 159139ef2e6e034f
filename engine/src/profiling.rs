use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct StepTimings {
    pub step: Duration,
    pub record: Duration,
    pub total: Duration,
}

/// Optional hook interface for capturing engine step timings.
///
/// Kept independent of game-specific State/Input types so the same collector
/// works for any `GameLogic`.
pub trait Profiler {
    fn on_step(&mut self, _frame: usize, _timings: StepTimings) {}
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[derive(Debug, Default, Clone)]
pub struct Samples {
    xs: Vec<f64>,
}

impl Samples {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            xs: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, d: Duration) {
        self.xs.push(ms(d));
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn stats(&mut self) -> Stats {
        Stats::from_samples(&mut self.xs)
    }
}

/// Summary of a sample set, all values in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
    pub n: usize,
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

impl Stats {
    fn from_samples(xs: &mut [f64]) -> Self {
        if xs.is_empty() {
            return Self::default();
        }

        xs.sort_by(|a, b| a.total_cmp(b));

        let n = xs.len();
        let sum: f64 = xs.iter().sum();

        Self {
            n,
            avg: sum / (n as f64),
            p50: percentile_sorted(xs, 0.50),
            p95: percentile_sorted(xs, 0.95),
            p99: percentile_sorted(xs, 0.99),
            max: xs[n - 1],
        }
    }
}

fn percentile_sorted(xs: &[f64], p: f64) -> f64 {
    debug_assert!(!xs.is_empty());
    debug_assert!((0.0..=1.0).contains(&p));

    if xs.len() == 1 {
        return xs[0];
    }

    // Nearest-rank percentile on [0, n-1].
    let rank = ((xs.len() - 1) as f64 * p).round() as usize;
    xs[rank.min(xs.len() - 1)]
}

/// Collects step timings, ignoring the first `warmup_frames` frames.
#[derive(Debug)]
pub struct StepSampler {
    warmup_frames: usize,
    pub step: Samples,
    pub record: Samples,
    pub total: Samples,
}

impl StepSampler {
    pub fn new(warmup_frames: usize, frames: usize) -> Self {
        Self {
            warmup_frames,
            step: Samples::with_capacity(frames),
            record: Samples::with_capacity(frames),
            total: Samples::with_capacity(frames),
        }
    }
}

impl Profiler for StepSampler {
    fn on_step(&mut self, frame: usize, timings: StepTimings) {
        if frame <= self.warmup_frames {
            return;
        }
        self.step.push(timings.step);
        self.record.push(timings.record);
        self.total.push(timings.total);
    }
}
