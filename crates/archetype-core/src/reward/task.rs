//! Task level: one result per processed turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Observation the result belongs to.
    pub observation_id: String,
    /// Outcome scalar in `[0, 1]`.
    pub outcome: f32,
    /// Whether `outcome` reached the success threshold.
    pub success: bool,
    /// Family the turn was attributed to.
    pub family_id: Option<u64>,
    /// Pathway confidence after the turn.
    pub confidence: f32,
    /// Quality of the turn (agreement nexus of the final channels).
    pub quality: f32,
    /// When the result was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl TaskResult {
    /// Build a result, deciding success against `success_threshold`.
    ///
    /// ```
    /// use archetype_core::reward::TaskResult;
    ///
    /// let task = TaskResult::from_outcome("turn-1", 0.7, 0.6, Some(2), 0.5, 0.8);
    /// assert!(task.success);
    /// assert!(!TaskResult::from_outcome("turn-2", 0.59, 0.6, None, 0.5, 0.8).success);
    /// ```
    pub fn from_outcome(
        observation_id: impl Into<String>,
        outcome: f32,
        success_threshold: f32,
        family_id: Option<u64>,
        confidence: f32,
        quality: f32,
    ) -> Self {
        let outcome = unit(outcome);
        Self {
            observation_id: observation_id.into(),
            outcome,
            success: outcome >= success_threshold,
            family_id,
            confidence: unit(confidence),
            quality: unit(quality),
            recorded_at: Utc::now(),
        }
    }
}

fn unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
