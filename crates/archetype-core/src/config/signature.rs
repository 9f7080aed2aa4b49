//! Signature extraction settings.
//!
//! The channel list and state vocabulary fix the signature layout, so
//! changing either changes the dimension `D` and invalidates stored
//! centroids.

use serde::{Deserialize, Serialize};

/// Default ordered channel list.
pub const DEFAULT_CHANNELS: [&str; 12] = [
    "safety",
    "connection",
    "agency",
    "clarity",
    "grounding",
    "meaning",
    "regulation",
    "trust",
    "curiosity",
    "boundaries",
    "expression",
    "integration",
];

/// Default discrete state vocabulary.
pub const DEFAULT_STATES: [&str; 4] = ["settled", "engaged", "activated", "withdrawn"];

/// Signature extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Fixed channel order for the delta and dominant-channel blocks.
    pub channels: Vec<String>,

    /// Known final-state labels for the one-hot block.
    pub state_vocabulary: Vec<String>,

    /// Upper bound of the drive scale; drive values are divided by it.
    pub max_drive_level: f32,

    /// Cycle count at which the cycle features saturate.
    pub max_cycles: u32,

    /// Multiplier applied to urgency before/after so that urgency carries
    /// more weight in distance computations than other unit-range scalars.
    pub urgency_amplification: f32,

    /// Top-two after-score gap below which the dominant channel is a tie.
    /// Range: `[0.0, 0.5]`
    pub tie_epsilon: f32,

    /// Reserve the trajectory block in the layout.
    pub include_trajectory: bool,

    /// Mean step score below which a trajectory step counts as crisis.
    /// Range: `[0.0, 1.0]`
    pub crisis_floor: f32,

    /// Per-step channel jump that counts as a threshold breach.
    /// Range: `(0.0, 1.0]`
    pub breach_threshold: f32,

    /// Channel read as the grounding factor of the activation score.
    pub grounding_channel: String,

    /// Unit-normalize the final vector. Off by default.
    pub normalize: bool,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect(),
            state_vocabulary: DEFAULT_STATES.iter().map(|s| s.to_string()).collect(),
            max_drive_level: 5.0,
            max_cycles: 20,
            urgency_amplification: 3.0,
            tie_epsilon: 0.02,
            include_trajectory: true,
            crisis_floor: 0.3,
            breach_threshold: 0.3,
            grounding_channel: "grounding".to_string(),
            normalize: false,
        }
    }
}

impl SignatureConfig {
    /// Validate the signature configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.channels.is_empty() {
            return Err("at least one channel is required".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel.as_str()) {
                return Err(format!("duplicate channel '{}'", channel));
            }
        }
        if self.state_vocabulary.is_empty() {
            return Err("state_vocabulary must not be empty".to_string());
        }
        if self.max_drive_level <= 0.0 || !self.max_drive_level.is_finite() {
            return Err(format!(
                "max_drive_level must be positive, got {}",
                self.max_drive_level
            ));
        }
        if self.max_cycles == 0 {
            return Err("max_cycles must be greater than 0".to_string());
        }
        if !(1.0..=10.0).contains(&self.urgency_amplification) {
            return Err(format!(
                "urgency_amplification must be in [1, 10], got {}",
                self.urgency_amplification
            ));
        }
        if !(0.0..=0.5).contains(&self.tie_epsilon) {
            return Err(format!(
                "tie_epsilon must be in [0, 0.5], got {}",
                self.tie_epsilon
            ));
        }
        if !(0.0..=1.0).contains(&self.crisis_floor) {
            return Err(format!(
                "crisis_floor must be in [0, 1], got {}",
                self.crisis_floor
            ));
        }
        if !(self.breach_threshold > 0.0 && self.breach_threshold <= 1.0) {
            return Err(format!(
                "breach_threshold must be in (0, 1], got {}",
                self.breach_threshold
            ));
        }
        Ok(())
    }
}
