//! Online clustering settings.
//!
//! One struct parameterizes every clustering population (families,
//! transition families, pathways): distance metric, population-adaptive
//! threshold, centroid EMA rate, membership cap and maturity thresholds.

use serde::{Deserialize, Serialize};

use crate::clustering::{DistanceMetric, ThresholdPolicy};

/// Maturity tier thresholds on member count.
///
/// ```text
/// Nascent:      count < established_at
/// Established:  established_at <= count < mature_at
/// Mature:       count >= mature_at
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaturityConfig {
    /// Member count at which a cluster becomes established (M1).
    pub established_at: usize,

    /// Member count at which a cluster becomes mature (M2).
    pub mature_at: usize,
}

impl Default for MaturityConfig {
    fn default() -> Self {
        Self {
            established_at: 3,
            mature_at: 10,
        }
    }
}

impl MaturityConfig {
    /// Validate the maturity thresholds.
    pub fn validate(&self) -> Result<(), String> {
        if self.established_at == 0 {
            return Err("established_at must be greater than 0".to_string());
        }
        if self.mature_at <= self.established_at {
            return Err(format!(
                "mature_at must exceed established_at: {} <= {}",
                self.mature_at, self.established_at
            ));
        }
        Ok(())
    }
}

/// Settings for one online clustering population.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Distance metric. Centroids are kept on the scale this metric expects.
    pub metric: DistanceMetric,

    /// Population-adaptive match threshold (a distance).
    pub threshold: ThresholdPolicy,

    /// Centroid EMA rate toward each matched vector.
    /// Range: `(0.0, 1.0]`
    pub ema_alpha: f32,

    /// Use a running mean (rate `1/(n+1)`) while it exceeds `ema_alpha`.
    pub warm_start: bool,

    /// Maximum retained member ids per cluster; the oldest is evicted.
    ///
    /// This bounds cluster records only. The replay index behind
    /// `cluster_of` keeps every id ever assigned.
    pub member_cap: usize,

    /// Maturity thresholds.
    pub maturity: MaturityConfig,

    /// Number of top-weighted channels recorded per cluster.
    pub top_channels: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self::families()
    }
}

impl ClusteringConfig {
    /// Defaults for the family registry.
    pub fn families() -> Self {
        Self {
            metric: DistanceMetric::Euclidean,
            threshold: ThresholdPolicy::default(),
            ema_alpha: 0.1,
            warm_start: true,
            member_cap: 200,
            maturity: MaturityConfig::default(),
            top_channels: 3,
        }
    }

    /// Defaults for transition families over the drive + channel-delta projection.
    pub fn transitions() -> Self {
        Self {
            threshold: ThresholdPolicy {
                base: 0.8,
                ..ThresholdPolicy::default()
            },
            member_cap: 100,
            ..Self::families()
        }
    }

    /// Defaults for the pathway population.
    pub fn pathways() -> Self {
        Self {
            threshold: ThresholdPolicy {
                base: 1.0,
                consolidation_above: 60,
                ..ThresholdPolicy::default()
            },
            ema_alpha: 0.15,
            member_cap: 100,
            ..Self::families()
        }
    }

    /// Validate the clustering configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.threshold.validate()?;
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(format!("ema_alpha must be in (0, 1], got {}", self.ema_alpha));
        }
        if self.member_cap == 0 {
            return Err("member_cap must be greater than 0".to_string());
        }
        self.maturity.validate()?;
        if self.member_cap < self.maturity.mature_at {
            return Err(format!(
                "member_cap {} is below mature_at {}; clusters could never mature",
                self.member_cap, self.maturity.mature_at
            ));
        }
        Ok(())
    }
}
