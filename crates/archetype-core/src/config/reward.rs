//! Fractal reward rollup settings.

use serde::{Deserialize, Serialize};

/// Reward rollup settings.
///
/// ```text
/// epoch reward  = success_weight × success_rate + confidence_weight × mean_confidence
/// global (n>1)  = global + global_alpha × (epoch reward − global)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Number of task results per epoch (N).
    pub epoch_size: usize,

    /// Weight of the batch success rate in the epoch reward.
    /// Range: `[0.0, 1.0]`
    pub success_weight: f32,

    /// Weight of the batch mean confidence in the epoch reward.
    /// Range: `[0.0, 1.0]`
    pub confidence_weight: f32,

    /// EMA rate of global confidence toward each new epoch reward.
    /// Range: `(0.0, 1.0]`
    pub global_alpha: f32,

    /// Number of epoch records retained in the ledger. The reward history
    /// itself is never truncated.
    pub epoch_history_cap: usize,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            epoch_size: 10,
            success_weight: 0.6,
            confidence_weight: 0.4,
            global_alpha: 0.3,
            epoch_history_cap: 500,
        }
    }
}

impl RewardConfig {
    /// Validate the reward configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.epoch_size == 0 {
            return Err("epoch_size must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.success_weight)
            || !(0.0..=1.0).contains(&self.confidence_weight)
        {
            return Err(format!(
                "reward weights must be in [0, 1], got {} / {}",
                self.success_weight, self.confidence_weight
            ));
        }
        let sum = self.success_weight + self.confidence_weight;
        if (sum - 1.0).abs() > 1e-3 {
            return Err(format!("reward weights must sum to 1.0, got {}", sum));
        }
        if !(self.global_alpha > 0.0 && self.global_alpha <= 1.0) {
            return Err(format!(
                "global_alpha must be in (0, 1], got {}",
                self.global_alpha
            ));
        }
        if self.epoch_history_cap == 0 {
            return Err("epoch_history_cap must be greater than 0".to_string());
        }
        Ok(())
    }
}
