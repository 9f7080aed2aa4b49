//! Preference and pathway learning settings.

use serde::{Deserialize, Serialize};

use super::clustering::ClusteringConfig;

/// Per-family preference learning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceConfig {
    /// EMA rate of channel weights toward observed importance.
    /// Range: `(0.0, 1.0]`
    pub weight_alpha: f32,

    /// EMA rate of the target outcome.
    /// Range: `(0.0, 1.0]`
    pub target_alpha: f32,

    /// EMA rate of the quality expectation.
    /// Range: `(0.0, 1.0]`
    pub quality_alpha: f32,

    /// Floor for a single channel's raw importance before normalization.
    pub min_importance: f32,
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        Self {
            weight_alpha: 0.2,
            target_alpha: 0.1,
            quality_alpha: 0.1,
            min_importance: 0.05,
        }
    }
}

impl PreferenceConfig {
    /// Validate the preference configuration.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("weight_alpha", self.weight_alpha),
            ("target_alpha", self.target_alpha),
            ("quality_alpha", self.quality_alpha),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(format!("{} must be in (0, 1], got {}", name, value));
            }
        }
        if !(self.min_importance > 0.0 && self.min_importance < 1.0) {
            return Err(format!(
                "min_importance must be in (0, 1), got {}",
                self.min_importance
            ));
        }
        Ok(())
    }
}

/// Pathway confidence learning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathwayConfig {
    /// Clustering of the pathway population (independent of families).
    #[serde(default = "ClusteringConfig::pathways")]
    pub clustering: ClusteringConfig,

    /// EMA rate of confidence toward 1.0 (success) or 0.0 (failure).
    /// Range: `(0.0, 1.0]`
    pub confidence_alpha: f32,

    /// Confidence assigned to a freshly created pathway.
    /// Range: `[0.0, 1.0]`
    pub initial_confidence: f32,

    /// Minimum samples before a pathway may be recommended.
    pub min_samples: u64,

    /// Default length of the recommendation list.
    pub recommendation_limit: usize,
}

impl Default for PathwayConfig {
    fn default() -> Self {
        Self {
            clustering: ClusteringConfig::pathways(),
            confidence_alpha: 0.2,
            initial_confidence: 0.5,
            min_samples: 3,
            recommendation_limit: 3,
        }
    }
}

impl PathwayConfig {
    /// Validate the pathway configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.clustering.validate()?;
        if !(self.confidence_alpha > 0.0 && self.confidence_alpha <= 1.0) {
            return Err(format!(
                "confidence_alpha must be in (0, 1], got {}",
                self.confidence_alpha
            ));
        }
        if !(0.0..=1.0).contains(&self.initial_confidence) {
            return Err(format!(
                "initial_confidence must be in [0, 1], got {}",
                self.initial_confidence
            ));
        }
        if self.min_samples == 0 {
            return Err("min_samples must be greater than 0".to_string());
        }
        if self.recommendation_limit == 0 {
            return Err("recommendation_limit must be greater than 0".to_string());
        }
        Ok(())
    }
}
