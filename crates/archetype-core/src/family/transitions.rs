//! Transition families over the compact drive + channel-delta projection.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::clustering::{Assignment, ClusterRecord, ClusterSnapshot, OnlineClusterer, RepairReport};
use crate::config::ClusteringConfig;
use crate::error::ArchetypeResult;
use crate::signature::{Signature, SignatureLayout};

const LABEL: &str = "TRANSITION_FAMILIES";

/// A cluster of similar transitions.
pub type TransitionFamily = ClusterRecord<()>;

/// Serialized transition family state.
pub type TransitionSnapshot = ClusterSnapshot<()>;

/// Clusters how an interaction moved (drive and channel deltas), ignoring
/// where it ended up.
#[derive(Debug, Clone)]
pub struct TransitionFamilies {
    clusters: OnlineClusterer<()>,
    layout: SignatureLayout,
}

impl TransitionFamilies {
    /// Create an empty population.
    pub fn new(config: ClusteringConfig, layout: SignatureLayout) -> Self {
        Self {
            clusters: OnlineClusterer::new(LABEL, config),
            layout,
        }
    }

    /// Assign using the current time.
    pub fn assign(&mut self, member_id: &str, signature: &Signature, outcome: f32) -> Assignment {
        self.assign_at(member_id, signature, outcome, Utc::now())
    }

    /// Project the signature and assign it.
    pub fn assign_at(
        &mut self,
        member_id: &str,
        signature: &Signature,
        outcome: f32,
        now: DateTime<Utc>,
    ) -> Assignment {
        let projected = self.layout.project_transition(signature.values());
        self.clusters.assign_at(member_id, &projected, outcome, now)
    }

    /// Transition family by id.
    pub fn get(&self, id: u64) -> Option<&TransitionFamily> {
        self.clusters.get(id)
    }

    /// All transition families in creation order.
    pub fn families(&self) -> &[TransitionFamily] {
        self.clusters.clusters()
    }

    /// Transition family a member id was assigned to.
    pub fn family_of(&self, member_id: &str) -> Option<u64> {
        self.clusters.cluster_of(member_id)
    }

    /// Number of transition families.
    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether the population is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Capture the full state.
    pub fn snapshot(&self) -> TransitionSnapshot {
        self.clusters.snapshot()
    }

    /// Restore from a snapshot.
    pub fn from_snapshot(
        config: ClusteringConfig,
        layout: SignatureLayout,
        snapshot: TransitionSnapshot,
    ) -> (Self, RepairReport) {
        let (clusters, report) = OnlineClusterer::from_snapshot(LABEL, config, snapshot);
        (Self { clusters, layout }, report)
    }

    /// Write the snapshot atomically.
    pub fn save(&self, path: &Path) -> ArchetypeResult<()> {
        self.clusters.save(path)
    }

    /// Load, starting empty when the snapshot is missing or unreadable.
    pub fn load(config: ClusteringConfig, layout: SignatureLayout, path: &Path) -> Self {
        let dimension = layout.transition_dimension();
        Self {
            clusters: OnlineClusterer::load_or_empty(LABEL, config, path, Some(dimension)),
            layout,
        }
    }
}
