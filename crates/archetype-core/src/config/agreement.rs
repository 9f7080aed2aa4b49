//! Agreement computer settings.
//!
//! Controls how the "nexus coherence" composite blends the mean channel
//! score, pairwise agreement and a priority subset of channels.

use serde::{Deserialize, Serialize};

/// Agreement computer settings.
///
/// ```text
/// nexus = mean_weight × mean + agreement_weight × A + priority_weight × mean(priority)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgreementConfig {
    /// Channels whose mean score feeds the priority term.
    pub priority_channels: Vec<String>,

    /// Weight of the overall mean score.
    /// Range: `[0.0, 1.0]`
    pub mean_weight: f32,

    /// Weight of pairwise agreement.
    /// Range: `[0.0, 1.0]`
    pub agreement_weight: f32,

    /// Weight of the priority channel mean.
    /// Range: `[0.0, 1.0]`
    pub priority_weight: f32,
}

impl Default for AgreementConfig {
    fn default() -> Self {
        Self {
            priority_channels: vec![
                "safety".to_string(),
                "grounding".to_string(),
                "connection".to_string(),
            ],
            mean_weight: 0.4,
            agreement_weight: 0.3,
            priority_weight: 0.3,
        }
    }
}

impl AgreementConfig {
    /// Validate the agreement configuration.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("mean_weight", self.mean_weight),
            ("agreement_weight", self.agreement_weight),
            ("priority_weight", self.priority_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be in [0, 1], got {}", name, value));
            }
        }
        let sum = self.mean_weight + self.agreement_weight + self.priority_weight;
        if (sum - 1.0).abs() > 1e-3 {
            return Err(format!("nexus weights must sum to 1.0, got {}", sum));
        }
        Ok(())
    }
}
