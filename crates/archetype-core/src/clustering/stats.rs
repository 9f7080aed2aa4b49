//! Incremental statistics.
//!
//! All online updates in the crate go through [`ema`] or [`RunningStats`];
//! nothing replays history.

use serde::{Deserialize, Serialize};

/// Move `current` toward `target` by `alpha`.
///
/// Non-finite targets leave `current` unchanged.
#[inline]
pub fn ema(current: f32, target: f32, alpha: f32) -> f32 {
    if !target.is_finite() {
        return current;
    }
    current + alpha.clamp(0.0, 1.0) * (target - current)
}

/// Welford running mean and variance.
///
/// # Example
///
/// ```
/// use archetype_core::clustering::RunningStats;
///
/// let mut stats = RunningStats::new();
/// for x in [1.0, 2.0, 3.0] {
///     stats.push(x);
/// }
/// assert_eq!(stats.count(), 3);
/// assert!((stats.mean() - 2.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    #[serde(default)]
    min: Option<f32>,
    #[serde(default)]
    max: Option<f32>,
}

impl RunningStats {
    /// Empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample. Non-finite samples are ignored.
    pub fn push(&mut self, value: f32) {
        if !value.is_finite() {
            return;
        }
        self.count += 1;
        let x = value as f64;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Number of samples.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean, or 0.0 without samples.
    #[inline]
    pub fn mean(&self) -> f32 {
        self.mean as f32
    }

    /// Population variance, or 0.0 with fewer than two samples.
    pub fn variance(&self) -> f32 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / self.count as f64).max(0.0) as f32
        }
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> f32 {
        self.variance().sqrt()
    }

    /// Smallest sample seen.
    pub fn min(&self) -> Option<f32> {
        self.min
    }

    /// Largest sample seen.
    pub fn max(&self) -> Option<f32> {
        self.max
    }
}
