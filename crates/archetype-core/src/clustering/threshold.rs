//! Population-adaptive match threshold.
//!
//! A small population uses a tighter threshold so new clusters form easily
//! instead of everything collapsing into the first one. A large population
//! uses a looser threshold so matches are preferred over proliferation.

use serde::{Deserialize, Serialize};

/// Which band of the threshold policy a population falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdRegime {
    /// Population below `exploration_below`: favors creating clusters.
    Exploring,
    /// Medium population: base threshold.
    Balanced,
    /// Population above `consolidation_above`: favors matching.
    Consolidating,
}

/// Population-adaptive distance threshold.
///
/// ```text
/// population <  exploration_below    -> base × exploration_factor
/// population >  consolidation_above  -> base × consolidation_factor
/// otherwise                          -> base
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdPolicy {
    /// Base match distance.
    pub base: f32,

    /// Population size below which the policy explores.
    pub exploration_below: usize,

    /// Multiplier applied while exploring. Range: `(0.0, 1.0]`
    pub exploration_factor: f32,

    /// Population size above which the policy consolidates.
    pub consolidation_above: usize,

    /// Multiplier applied while consolidating. Range: `[1.0, 4.0]`
    pub consolidation_factor: f32,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            base: 1.5,
            exploration_below: 4,
            exploration_factor: 0.8,
            consolidation_above: 40,
            consolidation_factor: 1.5,
        }
    }
}

impl ThresholdPolicy {
    /// Regime for a given population size.
    pub fn regime(&self, population: usize) -> ThresholdRegime {
        if population < self.exploration_below {
            ThresholdRegime::Exploring
        } else if population > self.consolidation_above {
            ThresholdRegime::Consolidating
        } else {
            ThresholdRegime::Balanced
        }
    }

    /// Match distance for a given population size.
    ///
    /// # Example
    ///
    /// ```
    /// use archetype_core::clustering::ThresholdPolicy;
    ///
    /// let policy = ThresholdPolicy::default();
    /// assert!(policy.threshold_for(1) < policy.threshold_for(10));
    /// assert!(policy.threshold_for(10) < policy.threshold_for(100));
    /// ```
    pub fn threshold_for(&self, population: usize) -> f32 {
        match self.regime(population) {
            ThresholdRegime::Exploring => self.base * self.exploration_factor,
            ThresholdRegime::Balanced => self.base,
            ThresholdRegime::Consolidating => self.base * self.consolidation_factor,
        }
    }

    /// Validate the policy.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base > 0.0 && self.base.is_finite()) {
            return Err(format!("threshold base must be positive, got {}", self.base));
        }
        if !(self.exploration_factor > 0.0 && self.exploration_factor <= 1.0) {
            return Err(format!(
                "exploration_factor must be in (0, 1], got {}",
                self.exploration_factor
            ));
        }
        if !(1.0..=4.0).contains(&self.consolidation_factor) {
            return Err(format!(
                "consolidation_factor must be in [1, 4], got {}",
                self.consolidation_factor
            ));
        }
        if self.consolidation_above <= self.exploration_below {
            return Err(format!(
                "consolidation_above must exceed exploration_below: {} <= {}",
                self.consolidation_above, self.exploration_below
            ));
        }
        Ok(())
    }
}
