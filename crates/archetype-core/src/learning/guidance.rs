//! Guidance handed to emission logic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Learned preferences of one established family.
///
/// Only produced for families with enough members to be trusted; callers
/// receive `None` otherwise and should fall back to their own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guidance {
    /// Family the guidance belongs to.
    pub family_id: u64,
    /// Channel importance weights, mean 1.0.
    pub channel_weights: BTreeMap<String, f32>,
    /// Outcome level successful turns in this family reach.
    pub target_outcome: f32,
    /// Expected quality of a successful turn.
    pub quality_expectation: f32,
    /// Fraction of observed turns that succeeded.
    pub success_rate: f32,
    /// Turns observed since the first success.
    pub sample_count: u64,
}

impl Guidance {
    /// Channels ordered by weight, heaviest first.
    pub fn ranked_channels(&self) -> Vec<(&str, f32)> {
        let mut ranked: Vec<(&str, f32)> = self
            .channel_weights
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(b.0)));
        ranked
    }

    /// Weight of one channel, 1.0 when unknown.
    pub fn weight(&self, channel: &str) -> f32 {
        self.channel_weights.get(channel).copied().unwrap_or(1.0)
    }
}
