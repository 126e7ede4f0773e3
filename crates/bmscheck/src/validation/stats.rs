//! Streaming statistics for spike detection.

use std::collections::VecDeque;

// =============================================================================
// STREAMING STATISTICS
// =============================================================================
// Welford's online algorithm for mean and variance in a single pass, plus a
// reservoir sample for quantiles.

/// Seed for reservoir sampling. Fixed so repeated runs sample identically.
const RESERVOIR_SEED: u64 = 0x6d73_6368_6563_6b21;

/// Streaming statistics accumulator using Welford's algorithm.
///
/// Mean and variance are exact. Quantiles come from a reservoir sample and
/// are exact while the number of values seen stays within its capacity.
#[derive(Debug, Clone)]
pub struct StreamingStats {
    count: usize,
    mean: f64,
    m2: f64, // Sum of squared differences from mean
    min: f64,
    max: f64,
    reservoir: Vec<f64>,
    reservoir_capacity: usize,
    rng: fastrand::Rng,
}

impl StreamingStats {
    /// Create an accumulator keeping at most `reservoir_capacity` values.
    pub fn new(reservoir_capacity: usize, salt: u64) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            reservoir: Vec::new(),
            reservoir_capacity: reservoir_capacity.max(1),
            rng: fastrand::Rng::with_seed(RESERVOIR_SEED ^ salt),
        }
    }

    /// Create an accumulator that keeps every value.
    pub fn exact() -> Self {
        Self::new(usize::MAX, 0)
    }

    /// Add a value.
    pub fn add(&mut self, value: f64) {
        self.count += 1;

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }

        if self.reservoir.len() < self.reservoir_capacity {
            self.reservoir.push(value);
        } else {
            // Algorithm R: keep the new value with probability capacity / count.
            let j = self.rng.usize(0..self.count);
            if j < self.reservoir_capacity {
                self.reservoir[j] = value;
            }
        }
    }

    /// Number of values seen.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Check whether quantiles will be estimated from a sample.
    pub fn is_approximate(&self) -> bool {
        self.count > self.reservoir.len()
    }

    /// Get the population variance.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Get the standard deviation.
    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Consume the accumulator into a summary.
    pub fn summarize(self) -> ColumnSummary {
        let approximate = self.is_approximate();
        let std = self.std();
        let mut sample = self.reservoir;
        sample.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile(&sample, 0.25);
        let median = quantile(&sample, 0.5);
        let q3 = quantile(&sample, 0.75);

        let mut deviations: Vec<f64> = sample.iter().map(|v| (v - median).abs()).collect();
        deviations.sort_by(|a, b| a.total_cmp(b));
        let mad = quantile(&deviations, 0.5);

        ColumnSummary {
            count: self.count,
            mean: if self.count == 0 { 0.0 } else { self.mean },
            std,
            min: if self.count == 0 { 0.0 } else { self.min },
            max: if self.count == 0 { 0.0 } else { self.max },
            q1,
            median,
            q3,
            mad,
            approximate,
        }
    }
}

/// Linear-interpolation quantile of sorted values (0.0 when empty).
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

/// Distribution summary of a column's readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Median absolute deviation from the median.
    pub mad: f64,
    /// Quantiles and MAD were estimated from a sample.
    pub approximate: bool,
}

impl ColumnSummary {
    /// Interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Trailing window of readings.
///
/// Moments are taken from the held values on demand. A window of equal
/// readings has a standard deviation of exactly zero.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// Create a window holding at most `capacity` values.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, evicting the oldest when full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean of the held values.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.values.iter().sum::<f64>() / self.values.len() as f64
        }
    }

    /// Population standard deviation of the held values.
    pub fn std(&self) -> f64 {
        let n = self.values.len();
        let first = self.values.front().copied().unwrap_or(0.0);
        if n < 2 || self.values.iter().all(|&v| v == first) {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f64 = self.values.iter().map(|v| (v - mean) * (v - mean)).sum();
        (sum_sq / n as f64).sqrt()
    }
}
