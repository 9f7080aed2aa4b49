//! Epoch level: fixed-size batch aggregates.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RewardConfig;

use super::task::TaskResult;

/// Aggregate of one full batch of task results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochResult {
    /// Zero-based epoch number.
    pub epoch_index: u64,
    /// Tasks in the batch.
    pub task_count: usize,
    /// Successful tasks; never exceeds `task_count`.
    pub success_count: usize,
    /// `success_count / task_count`.
    pub success_rate: f32,
    /// Mean task outcome.
    pub mean_outcome: f32,
    /// Mean task confidence.
    pub mean_confidence: f32,
    /// Mean task quality.
    pub mean_quality: f32,
    /// Distinct families referenced by the batch.
    pub distinct_families: usize,
    /// `success_weight * success_rate + confidence_weight * mean_confidence`.
    pub reward: f32,
    /// When the batch was consolidated.
    pub completed_at: DateTime<Utc>,
}

impl EpochResult {
    /// Aggregate a batch. Returns `None` for an empty batch.
    pub fn from_tasks(
        epoch_index: u64,
        tasks: &[TaskResult],
        config: &RewardConfig,
    ) -> Option<Self> {
        if tasks.is_empty() {
            return None;
        }
        let n = tasks.len() as f32;
        let success_count = tasks.iter().filter(|t| t.success).count();
        let success_rate = success_count as f32 / n;
        let mean_outcome = tasks.iter().map(|t| t.outcome).sum::<f32>() / n;
        let mean_confidence = tasks.iter().map(|t| t.confidence).sum::<f32>() / n;
        let mean_quality = tasks.iter().map(|t| t.quality).sum::<f32>() / n;
        let distinct_families = tasks
            .iter()
            .filter_map(|t| t.family_id)
            .collect::<BTreeSet<_>>()
            .len();
        let reward =
            config.success_weight * success_rate + config.confidence_weight * mean_confidence;

        Some(Self {
            epoch_index,
            task_count: tasks.len(),
            success_count,
            success_rate,
            mean_outcome,
            mean_confidence,
            mean_quality,
            distinct_families,
            reward,
            completed_at: Utc::now(),
        })
    }
}
