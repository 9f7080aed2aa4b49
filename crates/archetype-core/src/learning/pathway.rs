//! Pathway confidence learning.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clustering::{
    ema, Assignment, ClusterRecord, ClusterSnapshot, OnlineClusterer, RepairReport, RunningStats,
};
use crate::config::PathwayConfig;
use crate::error::{ArchetypeError, ArchetypeResult};
use crate::observation::Observation;
use crate::signature::Signature;

const LABEL: &str = "PATHWAY_LEARNER";

/// Pathway-specific state carried on each cluster record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayState {
    /// EMA toward 1.0 on success and 0.0 on failure.
    pub confidence: f32,
    /// Successful turns.
    pub successes: u64,
    /// Failed turns.
    pub failures: u64,
    /// Cycle counts of successful turns.
    #[serde(default)]
    pub convergence: RunningStats,
    /// Turns flagged as a breakthrough.
    #[serde(default)]
    pub breakthroughs: u64,
    /// Turns flagged as a crisis or rupture.
    #[serde(default)]
    pub crises: u64,
}

impl Default for PathwayState {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            successes: 0,
            failures: 0,
            convergence: RunningStats::new(),
            breakthroughs: 0,
            crises: 0,
        }
    }
}

impl PathwayState {
    /// Turns observed.
    #[inline]
    pub fn sample_count(&self) -> u64 {
        self.successes + self.failures
    }

    /// Fraction of successful turns; 0.0 before any.
    pub fn success_rate(&self) -> f32 {
        match self.sample_count() {
            0 => 0.0,
            n => self.successes as f32 / n as f32,
        }
    }

    /// Mean cycles to success, `None` before the first success.
    pub fn mean_cycles_to_success(&self) -> Option<f32> {
        (self.convergence.count() > 0).then(|| self.convergence.mean())
    }
}

/// A cluster of similar signatures with a success confidence.
pub type Pathway = ClusterRecord<PathwayState>;

/// Serialized pathway state.
pub type PathwaySnapshot = ClusterSnapshot<PathwayState>;

/// Outcome of observing one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct PathwayUpdate {
    /// Clustering result.
    pub assignment: Assignment,
    /// Whether the turn counted as a success.
    pub success: bool,
    /// Pathway confidence after the update.
    pub confidence: f32,
}

/// A ranked pathway candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct PathwayMatch {
    /// Pathway id.
    pub pathway_id: u64,
    /// Similarity of the candidate signature to the pathway centroid.
    pub similarity: f32,
    /// Pathway confidence.
    pub confidence: f32,
    /// `similarity * confidence`, the ranking key.
    pub score: f32,
    /// Turns observed on the pathway.
    pub sample_count: u64,
    /// Fraction of successful turns.
    pub success_rate: f32,
}

/// Tracks how reliably similar signatures lead to success.
#[derive(Debug, Clone)]
pub struct PathwayLearner {
    clusters: OnlineClusterer<PathwayState>,
    config: PathwayConfig,
    success_threshold: f32,
}

impl PathwayLearner {
    /// Create an empty learner.
    pub fn new(config: PathwayConfig, success_threshold: f32) -> Self {
        Self {
            clusters: OnlineClusterer::new(LABEL, config.clustering.clone()),
            config,
            success_threshold,
        }
    }

    /// Create an empty learner after validating the configuration.
    pub fn try_new(config: PathwayConfig, success_threshold: f32) -> ArchetypeResult<Self> {
        config
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("pathways: {}", e)))?;
        Ok(Self::new(config, success_threshold))
    }

    /// Observe one turn using the current time.
    pub fn observe(
        &mut self,
        member_id: &str,
        signature: &Signature,
        obs: &Observation,
    ) -> PathwayUpdate {
        self.observe_at(member_id, signature, obs, Utc::now())
    }

    /// Match or create a pathway and update its confidence.
    ///
    /// A replayed member id leaves confidence and counters untouched.
    pub fn observe_at(
        &mut self,
        member_id: &str,
        signature: &Signature,
        obs: &Observation,
        now: DateTime<Utc>,
    ) -> PathwayUpdate {
        let success = obs.outcome >= self.success_threshold;
        let assignment = self
            .clusters
            .assign_at(member_id, signature.values(), obs.outcome, now);

        let alpha = self.config.confidence_alpha;
        let initial = self.config.initial_confidence;
        let pathway = match self.clusters.get_mut(assignment.cluster_id) {
            Some(pathway) => pathway,
            None => {
                return PathwayUpdate {
                    assignment,
                    success,
                    confidence: initial,
                }
            }
        };

        if assignment.replayed {
            let confidence = pathway.extension.confidence;
            return PathwayUpdate {
                assignment,
                success,
                confidence,
            };
        }

        let state = &mut pathway.extension;
        if assignment.created {
            state.confidence = initial;
        }
        state.confidence = ema(state.confidence, if success { 1.0 } else { 0.0 }, alpha);
        if success {
            state.successes += 1;
            state.convergence.push(obs.cycle_count as f32);
        } else {
            state.failures += 1;
        }
        if obs.events.breakthrough {
            state.breakthroughs += 1;
        }
        if obs.events.crisis || obs.events.rupture {
            state.crises += 1;
        }

        tracing::debug!(
            pathway_id = assignment.cluster_id,
            success,
            confidence = state.confidence,
            "PATHWAY_LEARNER: updated confidence"
        );
        let confidence = state.confidence;
        PathwayUpdate {
            assignment,
            success,
            confidence,
        }
    }

    /// Best pathway for a candidate signature.
    ///
    /// Only pathways with at least `min_samples` observations are
    /// considered; they are ranked by `similarity * confidence`.
    pub fn best_pathway(&self, signature: &Signature) -> Option<PathwayMatch> {
        self.recommendations(signature, 1).into_iter().next()
    }

    /// Up to `limit` ranked pathway candidates for a signature.
    pub fn recommendations(&self, signature: &Signature, limit: usize) -> Vec<PathwayMatch> {
        let mut matches: Vec<PathwayMatch> = self
            .clusters
            .similarities(signature.values())
            .into_iter()
            .filter_map(|(id, similarity)| {
                let pathway = self.clusters.get(id)?;
                let state = &pathway.extension;
                if state.sample_count() < self.config.min_samples {
                    return None;
                }
                Some(PathwayMatch {
                    pathway_id: id,
                    similarity,
                    confidence: state.confidence,
                    score: similarity * state.confidence,
                    sample_count: state.sample_count(),
                    success_rate: state.success_rate(),
                })
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.pathway_id.cmp(&b.pathway_id))
        });
        matches.truncate(limit);
        matches
    }

    /// Recommendations with the configured default length.
    pub fn default_recommendations(&self, signature: &Signature) -> Vec<PathwayMatch> {
        self.recommendations(signature, self.config.recommendation_limit)
    }

    /// Pathway by id.
    pub fn get(&self, id: u64) -> Option<&Pathway> {
        self.clusters.get(id)
    }

    /// All pathways in creation order.
    pub fn pathways(&self) -> &[Pathway] {
        self.clusters.clusters()
    }

    /// Mean confidence over all pathways, `None` when there are none.
    pub fn mean_confidence(&self) -> Option<f32> {
        let pathways = self.pathways();
        if pathways.is_empty() {
            return None;
        }
        Some(pathways.iter().map(|p| p.extension.confidence).sum::<f32>() / pathways.len() as f32)
    }

    /// Number of pathways.
    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether no pathway exists yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Capture the full state.
    pub fn snapshot(&self) -> PathwaySnapshot {
        self.clusters.snapshot()
    }

    /// Restore from a snapshot.
    pub fn from_snapshot(
        config: PathwayConfig,
        success_threshold: f32,
        snapshot: PathwaySnapshot,
    ) -> (Self, RepairReport) {
        let (clusters, report) =
            OnlineClusterer::from_snapshot(LABEL, config.clustering.clone(), snapshot);
        let learner = Self {
            clusters,
            config,
            success_threshold,
        };
        (learner, report)
    }

    /// Write the snapshot atomically.
    pub fn save(&self, path: &Path) -> ArchetypeResult<()> {
        self.clusters.save(path)
    }

    /// Load a learner, starting empty when the snapshot is missing or
    /// unreadable. `dimension` is the expected signature length.
    pub fn load(
        config: PathwayConfig,
        success_threshold: f32,
        path: &Path,
        dimension: usize,
    ) -> Self {
        let clusters =
            OnlineClusterer::load_or_empty(LABEL, config.clustering.clone(), path, Some(dimension));
        Self {
            clusters,
            config,
            success_threshold,
        }
    }
}
