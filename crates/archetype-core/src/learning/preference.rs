//! Per-family channel preference learning.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clustering::{ema, MaturityTier};
use crate::config::PreferenceConfig;
use crate::error::{ArchetypeError, ArchetypeResult};
use crate::observation::Observation;
use crate::persistence::{read_json, write_json_atomic};

use super::guidance::Guidance;

/// Preference snapshot format version.
pub const PREFERENCE_SNAPSHOT_VERSION: u32 = 1;

/// Learned channel preferences of one family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPreference {
    /// Owning family.
    pub family_id: u64,
    /// Channel importance weights, mean 1.0.
    pub channel_weights: BTreeMap<String, f32>,
    /// EMA of successful outcomes.
    pub target_outcome: f32,
    /// EMA of the quality of successful turns.
    pub quality_expectation: f32,
    /// `successes / sample_count`.
    pub success_rate: f32,
    /// Successful turns.
    pub successes: u64,
    /// Turns observed since the preference was created.
    pub sample_count: u64,
    /// Whether the owning family has reached the established tier.
    pub mature: bool,
    /// Creation time (first success).
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl ClusterPreference {
    /// Mean of the channel weights.
    pub fn mean_weight(&self) -> f32 {
        if self.channel_weights.is_empty() {
            return 1.0;
        }
        self.channel_weights.values().sum::<f32>() / self.channel_weights.len() as f32
    }

    fn guidance(&self) -> Guidance {
        Guidance {
            family_id: self.family_id,
            channel_weights: self.channel_weights.clone(),
            target_outcome: self.target_outcome,
            quality_expectation: self.quality_expectation,
            success_rate: self.success_rate,
            sample_count: self.sample_count,
        }
    }
}

/// Serialized preference learner state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSnapshot {
    /// Snapshot format version.
    pub version: u32,
    /// Every preference, ordered by family id.
    pub preferences: Vec<ClusterPreference>,
    /// When the learner last changed.
    pub last_updated: DateTime<Utc>,
}

/// Learns which channels matter to each family from its successful turns.
#[derive(Debug, Clone)]
pub struct PreferenceLearner {
    config: PreferenceConfig,
    success_threshold: f32,
    channels: Vec<String>,
    preferences: BTreeMap<u64, ClusterPreference>,
    last_updated: DateTime<Utc>,
}

impl PreferenceLearner {
    /// Create a learner over the given ordered channel list.
    pub fn new(config: PreferenceConfig, success_threshold: f32, channels: Vec<String>) -> Self {
        Self {
            config,
            success_threshold,
            channels,
            preferences: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }

    /// Per-channel importance of one observation, normalized to mean 1.0.
    ///
    /// A channel matters when it ended high or rose: `after + max(delta, 0)`,
    /// floored at `min_importance`. Missing channels are neutral.
    pub fn channel_importance(&self, obs: &Observation) -> BTreeMap<String, f32> {
        let mut importance: BTreeMap<String, f32> = self
            .channels
            .iter()
            .map(|name| {
                let after = obs.score_after(name);
                let delta = after - obs.score_before(name);
                let value = (after + delta.max(0.0)).max(self.config.min_importance);
                (name.clone(), if value.is_finite() { value } else { 1.0 })
            })
            .collect();
        normalize_mean_one(&mut importance);
        importance
    }

    /// Observe one turn attributed to `family_id`.
    ///
    /// A success creates or updates the family's preference; a failure only
    /// counts against an existing one. Returns the preference afterwards.
    pub fn observe(
        &mut self,
        family_id: u64,
        tier: MaturityTier,
        obs: &Observation,
        quality: f32,
    ) -> Option<&ClusterPreference> {
        self.observe_at(family_id, tier, obs, quality, Utc::now())
    }

    /// [`observe`](Self::observe) at an explicit time.
    pub fn observe_at(
        &mut self,
        family_id: u64,
        tier: MaturityTier,
        obs: &Observation,
        quality: f32,
        now: DateTime<Utc>,
    ) -> Option<&ClusterPreference> {
        let success = obs.outcome >= self.success_threshold;
        let quality = if quality.is_finite() { quality.clamp(0.0, 1.0) } else { 0.0 };

        if !success {
            let preference = self.preferences.get_mut(&family_id)?;
            preference.sample_count += 1;
            preference.success_rate = preference.successes as f32 / preference.sample_count as f32;
            preference.mature |= tier.is_trusted();
            preference.updated_at = now;
            self.last_updated = now;
            tracing::debug!(
                family_id,
                success_rate = preference.success_rate,
                "PREFERENCE_LEARNER: recorded failure"
            );
            return Some(preference);
        }

        let importance = self.channel_importance(obs);
        let config = &self.config;
        let preference = self
            .preferences
            .entry(family_id)
            .and_modify(|p| {
                for (channel, target) in &importance {
                    let weight = p.channel_weights.entry(channel.clone()).or_insert(1.0);
                    *weight = ema(*weight, *target, config.weight_alpha);
                }
                normalize_mean_one(&mut p.channel_weights);
                p.target_outcome = ema(p.target_outcome, obs.outcome, config.target_alpha);
                p.quality_expectation = ema(p.quality_expectation, quality, config.quality_alpha);
                p.successes += 1;
                p.sample_count += 1;
            })
            .or_insert_with(|| {
                tracing::info!(family_id, "PREFERENCE_LEARNER: created preference");
                ClusterPreference {
                    family_id,
                    channel_weights: importance.clone(),
                    target_outcome: obs.outcome,
                    quality_expectation: quality,
                    success_rate: 1.0,
                    successes: 1,
                    sample_count: 1,
                    mature: false,
                    created_at: now,
                    updated_at: now,
                }
            });

        preference.success_rate = preference.successes as f32 / preference.sample_count as f32;
        if !preference.mature && tier.is_trusted() {
            preference.mature = true;
            tracing::info!(
                family_id,
                samples = preference.sample_count,
                "PREFERENCE_LEARNER: preference is now mature"
            );
        }
        preference.updated_at = now;
        self.last_updated = now;
        Some(preference)
    }

    /// Guidance for a family, `None` until its preference is mature.
    pub fn guidance(&self, family_id: u64) -> Option<Guidance> {
        self.preferences
            .get(&family_id)
            .filter(|p| p.mature)
            .map(ClusterPreference::guidance)
    }

    /// Preference by family id, mature or not.
    pub fn get(&self, family_id: u64) -> Option<&ClusterPreference> {
        self.preferences.get(&family_id)
    }

    /// All preferences ordered by family id.
    pub fn preferences(&self) -> impl Iterator<Item = &ClusterPreference> {
        self.preferences.values()
    }

    /// Number of families with a preference.
    pub fn len(&self) -> usize {
        self.preferences.len()
    }

    /// Whether no preference exists yet.
    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }

    /// Capture the full state.
    pub fn snapshot(&self) -> PreferenceSnapshot {
        PreferenceSnapshot {
            version: PREFERENCE_SNAPSHOT_VERSION,
            preferences: self.preferences.values().cloned().collect(),
            last_updated: self.last_updated,
        }
    }

    /// Restore from a snapshot, re-normalizing drifted weights.
    pub fn from_snapshot(
        config: PreferenceConfig,
        success_threshold: f32,
        channels: Vec<String>,
        snapshot: PreferenceSnapshot,
    ) -> Self {
        let mut learner = Self::new(config, success_threshold, channels);
        for mut preference in snapshot.preferences {
            if (preference.mean_weight() - 1.0).abs() > 1e-3 {
                tracing::warn!(
                    family_id = preference.family_id,
                    mean = preference.mean_weight(),
                    "PREFERENCE_LEARNER: re-normalized weights on load"
                );
                normalize_mean_one(&mut preference.channel_weights);
            }
            learner.preferences.insert(preference.family_id, preference);
        }
        learner.last_updated = snapshot.last_updated;
        learner
    }

    /// Write the snapshot atomically.
    pub fn save(&self, path: &Path) -> ArchetypeResult<()> {
        write_json_atomic(path, &self.snapshot())
    }

    /// Load a learner; `Ok(None)` when no snapshot exists.
    pub fn try_load(
        config: PreferenceConfig,
        success_threshold: f32,
        channels: Vec<String>,
        path: &Path,
    ) -> ArchetypeResult<Option<Self>> {
        let snapshot: PreferenceSnapshot = match read_json(path)? {
            Some(snapshot) => snapshot,
            None => return Ok(None),
        };
        if snapshot.version > PREFERENCE_SNAPSHOT_VERSION {
            return Err(ArchetypeError::corrupt(
                path,
                format!("unsupported snapshot version {}", snapshot.version),
            ));
        }
        Ok(Some(Self::from_snapshot(
            config,
            success_threshold,
            channels,
            snapshot,
        )))
    }

    /// Load a learner, starting empty when the snapshot is missing or unreadable.
    pub fn load(
        config: PreferenceConfig,
        success_threshold: f32,
        channels: Vec<String>,
        path: &Path,
    ) -> Self {
        match Self::try_load(config.clone(), success_threshold, channels.clone(), path) {
            Ok(Some(learner)) => learner,
            Ok(None) => Self::new(config, success_threshold, channels),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "PREFERENCE_LEARNER: unreadable snapshot, starting empty"
                );
                Self::new(config, success_threshold, channels)
            }
        }
    }
}

/// Scale a weight map to mean 1.0; a degenerate map becomes all ones.
pub fn normalize_mean_one(weights: &mut BTreeMap<String, f32>) {
    if weights.is_empty() {
        return;
    }
    let mean = weights.values().sum::<f32>() / weights.len() as f32;
    if !(mean.is_finite() && mean > f32::EPSILON) {
        for w in weights.values_mut() {
            *w = 1.0;
        }
        return;
    }
    for w in weights.values_mut() {
        *w /= mean;
    }
}
