//! Family registry.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clustering::{
    Assignment, ClusterRecord, ClusterSnapshot, MaturityTier, OnlineClusterer, RepairReport,
};
use crate::config::ClusteringConfig;
use crate::error::{ArchetypeError, ArchetypeResult};
use crate::signature::{Signature, SignatureLayout};

const LABEL: &str = "FAMILY_REGISTRY";

/// Family-specific state carried on each cluster record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyTraits {
    /// Channels with the largest centroid delta, largest first.
    #[serde(default)]
    pub top_channels: Vec<String>,
}

/// A discovered behavior archetype.
pub type Family = ClusterRecord<FamilyTraits>;

/// Serialized registry state.
pub type RegistrySnapshot = ClusterSnapshot<FamilyTraits>;

/// Online registry of families over full signatures.
#[derive(Debug, Clone)]
pub struct FamilyRegistry {
    clusters: OnlineClusterer<FamilyTraits>,
    layout: SignatureLayout,
}

impl FamilyRegistry {
    /// Create an empty registry for signatures with `layout`.
    pub fn new(config: ClusteringConfig, layout: SignatureLayout) -> Self {
        Self {
            clusters: OnlineClusterer::new(LABEL, config),
            layout,
        }
    }

    /// Create an empty registry after validating the configuration.
    pub fn try_new(config: ClusteringConfig, layout: SignatureLayout) -> ArchetypeResult<Self> {
        config
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("families: {}", e)))?;
        Ok(Self::new(config, layout))
    }

    /// Assign a signature using the current time.
    pub fn assign(&mut self, member_id: &str, signature: &Signature, outcome: f32) -> Assignment {
        self.assign_at(member_id, signature, outcome, Utc::now())
    }

    /// Assign a signature to its family, creating one when nothing is
    /// within the adaptive threshold.
    pub fn assign_at(
        &mut self,
        member_id: &str,
        signature: &Signature,
        outcome: f32,
        now: DateTime<Utc>,
    ) -> Assignment {
        if signature.len() != self.layout.dimension() {
            tracing::warn!(
                member_id,
                expected = self.layout.dimension(),
                actual = signature.len(),
                "FAMILY_REGISTRY: signature does not match layout"
            );
        }
        let assignment = self
            .clusters
            .assign_at(member_id, signature.values(), outcome, now);
        if !assignment.replayed {
            self.refresh_traits(assignment.cluster_id);
        }
        assignment
    }

    fn refresh_traits(&mut self, family_id: u64) {
        let limit = self.clusters.config().top_channels;
        let layout = &self.layout;
        if let Some(family) = self.clusters.get_mut(family_id) {
            family.extension.top_channels = layout.top_channels(&family.centroid, limit);
        }
    }

    /// Family by id.
    pub fn get(&self, id: u64) -> Option<&Family> {
        self.clusters.get(id)
    }

    /// All families in creation order.
    pub fn families(&self) -> &[Family] {
        self.clusters.clusters()
    }

    /// Family a member id was assigned to.
    pub fn family_of(&self, member_id: &str) -> Option<u64> {
        self.clusters.cluster_of(member_id)
    }

    /// Maturity tier of a family.
    pub fn tier(&self, id: u64) -> Option<MaturityTier> {
        self.get(id).map(|f| f.maturity)
    }

    /// Families at a given tier or above.
    pub fn at_least(&self, tier: MaturityTier) -> impl Iterator<Item = &Family> {
        self.families().iter().filter(move |f| f.maturity >= tier)
    }

    /// Number of families.
    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether no family exists yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Threshold applied to the next assignment.
    pub fn current_threshold(&self) -> f32 {
        self.clusters.current_threshold()
    }

    /// Distance from a signature to a family centroid.
    pub fn distance_to(&self, signature: &Signature, family_id: u64) -> Option<f32> {
        self.clusters.distance_to(signature.values(), family_id)
    }

    /// Signature layout the centroids follow.
    pub fn layout(&self) -> &SignatureLayout {
        &self.layout
    }

    /// Underlying clustering population.
    pub fn clusterer(&self) -> &OnlineClusterer<FamilyTraits> {
        &self.clusters
    }

    /// Capture the full registry state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.clusters.snapshot()
    }

    /// Restore from a snapshot, repairing duplicates and the index.
    pub fn from_snapshot(
        config: ClusteringConfig,
        layout: SignatureLayout,
        snapshot: RegistrySnapshot,
    ) -> (Self, RepairReport) {
        let (clusters, report) = OnlineClusterer::from_snapshot(LABEL, config, snapshot);
        (Self::restored(clusters, layout), report)
    }

    fn restored(clusters: OnlineClusterer<FamilyTraits>, layout: SignatureLayout) -> Self {
        let mut registry = Self { clusters, layout };
        let ids: Vec<u64> = registry.families().iter().map(|f| f.id).collect();
        for id in ids {
            registry.refresh_traits(id);
        }
        registry
    }

    /// Write the registry snapshot atomically.
    pub fn save(&self, path: &Path) -> ArchetypeResult<()> {
        self.clusters.save(path)
    }

    /// Load a registry; `Ok(None)` when no snapshot exists.
    pub fn try_load(
        config: ClusteringConfig,
        layout: SignatureLayout,
        path: &Path,
    ) -> ArchetypeResult<Option<(Self, RepairReport)>> {
        let loaded = OnlineClusterer::try_load(LABEL, config, path, Some(layout.dimension()))?;
        Ok(loaded.map(|(clusters, report)| (Self::restored(clusters, layout), report)))
    }

    /// Load a registry, starting empty when the snapshot is missing or
    /// unreadable.
    pub fn load(config: ClusteringConfig, layout: SignatureLayout, path: &Path) -> Self {
        let dimension = layout.dimension();
        let clusters = OnlineClusterer::load_or_empty(LABEL, config, path, Some(dimension));
        Self::restored(clusters, layout)
    }
}
