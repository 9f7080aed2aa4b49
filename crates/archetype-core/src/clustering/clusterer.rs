//! Generic online centroid clustering.
//!
//! One implementation of assign-or-create serves every population in the
//! crate. A population is configured by [`ClusteringConfig`] (metric,
//! adaptive threshold, EMA rate, membership cap, maturity thresholds) and
//! carries its own per-cluster state in the extension type `E`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClusteringConfig;
use crate::error::{ArchetypeError, ArchetypeResult};
use crate::persistence::{read_json, write_json_atomic};

use super::maturity::MaturityTier;
use super::membership::MembershipChange;
use super::metric::{normalize_in_place, DistanceMetric};
use super::record::ClusterRecord;
use super::snapshot::{ClusterSnapshot, RepairReport, SNAPSHOT_VERSION};

/// Result of assigning one vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Cluster the vector now belongs to.
    pub cluster_id: u64,

    /// Distance to that cluster's centroid before the update. For a newly
    /// created cluster this is the distance to the nearest pre-existing
    /// centroid (0.0 when the population was empty).
    pub distance: f32,

    /// `distance` mapped to `[0, 1]` by the active metric.
    pub similarity: f32,

    /// Threshold the distance was compared against.
    pub threshold: f32,

    /// Whether a new cluster was created.
    pub created: bool,

    /// Whether the member id had already been assigned; nothing was mutated.
    pub replayed: bool,

    /// Maturity transition caused by this assignment.
    pub promoted: Option<(MaturityTier, MaturityTier)>,
}

/// Online centroid clustering over fixed-length vectors.
#[derive(Debug, Clone)]
pub struct OnlineClusterer<E> {
    label: &'static str,
    config: ClusteringConfig,
    clusters: Vec<ClusterRecord<E>>,
    positions: HashMap<u64, usize>,
    /// Every member id ever assigned, including ids evicted by `member_cap`,
    /// so replays are recognized for the life of the population. Grows with
    /// distinct observations and is persisted in full.
    member_index: BTreeMap<String, u64>,
    next_id: u64,
    last_updated: DateTime<Utc>,
}

impl<E: Default> OnlineClusterer<E> {
    /// Create an empty population.
    ///
    /// `label` prefixes every log line emitted for this population.
    pub fn new(label: &'static str, config: ClusteringConfig) -> Self {
        Self {
            label,
            config,
            clusters: Vec::new(),
            positions: HashMap::new(),
            member_index: BTreeMap::new(),
            next_id: 1,
            last_updated: Utc::now(),
        }
    }

    /// Assign a vector using the current time.
    pub fn assign(&mut self, member_id: &str, vector: &[f32], outcome: f32) -> Assignment {
        self.assign_at(member_id, vector, outcome, Utc::now())
    }

    /// Assign a vector to the best matching cluster or create a new one.
    ///
    /// A member id seen before is a replay: its indexed cluster is returned
    /// and no state changes, so replaying a stream never inflates counts.
    pub fn assign_at(
        &mut self,
        member_id: &str,
        vector: &[f32],
        outcome: f32,
        now: DateTime<Utc>,
    ) -> Assignment {
        let vector = self.prepare(vector);
        let threshold = self.current_threshold();

        if let Some(cluster) = self
            .member_index
            .get(member_id)
            .and_then(|id| self.get(*id))
        {
            let distance = self.config.metric.distance(&vector, &cluster.centroid);
            tracing::debug!(
                member_id,
                cluster_id = cluster.id,
                "{}: replayed member, assignment unchanged",
                self.label
            );
            return Assignment {
                cluster_id: cluster.id,
                distance,
                similarity: self.config.metric.similarity_from_distance(distance),
                threshold,
                created: false,
                replayed: true,
                promoted: None,
            };
        }

        match self.nearest(&vector) {
            Some((position, distance)) if distance <= threshold => {
                let promoted = self.absorb(position, member_id, &vector, outcome, now);
                let cluster_id = self.clusters[position].id;
                self.member_index.insert(member_id.to_string(), cluster_id);
                self.last_updated = now;
                tracing::debug!(
                    member_id,
                    cluster_id,
                    distance,
                    threshold,
                    "{}: matched cluster",
                    self.label
                );
                Assignment {
                    cluster_id,
                    distance,
                    similarity: self.config.metric.similarity_from_distance(distance),
                    threshold,
                    created: false,
                    replayed: false,
                    promoted,
                }
            }
            nearest => {
                let distance = nearest.map(|(_, d)| d).unwrap_or(0.0);
                let (cluster_id, promoted) = self.create(member_id, vector, outcome, now);
                tracing::info!(
                    member_id,
                    cluster_id,
                    nearest_distance = distance,
                    threshold,
                    population = self.clusters.len(),
                    "{}: created cluster",
                    self.label
                );
                Assignment {
                    cluster_id,
                    distance,
                    similarity: self.config.metric.similarity_from_distance(distance),
                    threshold,
                    created: true,
                    replayed: false,
                    promoted,
                }
            }
        }
    }

    fn create(
        &mut self,
        member_id: &str,
        vector: Vec<f32>,
        outcome: f32,
        now: DateTime<Utc>,
    ) -> (u64, Option<(MaturityTier, MaturityTier)>) {
        let id = self.next_id;
        self.next_id += 1;

        let mut record = ClusterRecord::new(id, vector, now);
        record.members.insert(member_id, self.config.member_cap);
        record.outcome.push(outcome);
        record.total_assignments = 1;
        let promoted = record
            .maturity
            .advance(record.member_count(), &self.config.maturity);

        self.positions.insert(id, self.clusters.len());
        self.clusters.push(record);
        self.member_index.insert(member_id.to_string(), id);
        self.last_updated = now;
        (id, promoted)
    }

    fn absorb(
        &mut self,
        position: usize,
        member_id: &str,
        vector: &[f32],
        outcome: f32,
        now: DateTime<Utc>,
    ) -> Option<(MaturityTier, MaturityTier)> {
        let config = &self.config;
        let record = &mut self.clusters[position];

        let alpha = if config.warm_start {
            config
                .ema_alpha
                .max(1.0 / (record.total_assignments as f32 + 1.0))
        } else {
            config.ema_alpha
        };
        for (c, v) in record.centroid.iter_mut().zip(vector) {
            *c += alpha * (v - *c);
        }
        if config.metric.requires_unit_length() {
            normalize_in_place(&mut record.centroid);
        }

        if let MembershipChange::AddedWithEviction(evicted) =
            record.members.insert(member_id, config.member_cap)
        {
            tracing::debug!(
                cluster_id = record.id,
                evicted = %evicted,
                "{}: membership cap reached, evicted oldest member",
                self.label
            );
        }
        record.outcome.push(outcome);
        record.total_assignments += 1;
        record.updated_at = now;

        let promoted = record
            .maturity
            .advance(record.member_count(), &config.maturity);
        if let Some((from, to)) = promoted {
            tracing::info!(
                cluster_id = record.id,
                from = %from,
                to = %to,
                members = record.member_count(),
                "{}: maturity advanced",
                self.label
            );
        }
        promoted
    }

    /// Rebuild a population from a snapshot, repairing what it can.
    ///
    /// Exact duplicate member ids are removed, caps re-applied, maturity
    /// raised to match member counts, `next_id` kept above every id and the
    /// member index reconciled with cluster membership. Centroids are
    /// normalized when the configured metric needs unit length; clusters
    /// saved under cosine cannot be restored under euclidean and are dropped.
    pub fn from_snapshot(
        label: &'static str,
        config: ClusteringConfig,
        snapshot: ClusterSnapshot<E>,
    ) -> (Self, RepairReport) {
        let mut report = RepairReport::default();
        let mut clusters = snapshot.clusters;

        let mut member_index = snapshot.member_index;

        let convert = snapshot.metric != config.metric;
        if convert {
            report.metric_converted = true;
            tracing::warn!(
                snapshot_metric = %snapshot.metric,
                configured_metric = %config.metric,
                "{}: snapshot metric differs from configuration",
                label
            );
        }
        if !snapshot.metric.converts_to(config.metric) {
            report.clusters_discarded = clusters.len();
            tracing::warn!(
                snapshot_metric = %snapshot.metric,
                configured_metric = %config.metric,
                discarded = clusters.len(),
                "{}: snapshot centroids cannot be rescaled, starting empty",
                label
            );
            clusters.clear();
            member_index.clear();
        }

        for cluster in clusters.iter_mut() {
            if convert && config.metric.requires_unit_length() {
                normalize_in_place(&mut cluster.centroid);
            }
            for value in cluster.centroid.iter_mut() {
                if !value.is_finite() {
                    *value = 0.0;
                }
            }

            let removed = cluster.members.dedup();
            if removed > 0 {
                tracing::warn!(
                    cluster_id = cluster.id,
                    removed,
                    "{}: removed duplicate member ids on load",
                    label
                );
            }
            report.duplicates_removed += removed;
            report.members_evicted += cluster.members.enforce_cap(config.member_cap).len();

            if cluster
                .maturity
                .advance(cluster.member_count(), &config.maturity)
                .is_some()
            {
                report.maturity_raised += 1;
            }
        }

        let max_id = clusters.iter().map(|c| c.id).max().unwrap_or(0);
        let mut next_id = snapshot.next_id;
        if next_id <= max_id {
            next_id = max_id + 1;
            report.next_id_repaired = true;
        }

        let positions: HashMap<u64, usize> = clusters
            .iter()
            .enumerate()
            .map(|(pos, c)| (c.id, pos))
            .collect();

        let before = member_index.len();
        member_index.retain(|_, id| positions.contains_key(id));
        report.index_entries_dropped = before - member_index.len();
        for cluster in &clusters {
            for member in cluster.members.iter() {
                if !member_index.contains_key(member) {
                    member_index.insert(member.to_string(), cluster.id);
                    report.index_entries_added += 1;
                }
            }
        }

        if !report.is_clean() {
            tracing::warn!(
                duplicates_removed = report.duplicates_removed,
                members_evicted = report.members_evicted,
                index_entries_added = report.index_entries_added,
                index_entries_dropped = report.index_entries_dropped,
                next_id_repaired = report.next_id_repaired,
                clusters_discarded = report.clusters_discarded,
                "{}: snapshot repaired on load",
                label
            );
        }

        let clusterer = Self {
            label,
            config,
            clusters,
            positions,
            member_index,
            next_id,
            last_updated: snapshot.last_updated,
        };
        (clusterer, report)
    }
}

impl<E> OnlineClusterer<E> {
    /// Copy a vector onto the active metric's scale, replacing non-finite
    /// entries and fitting it to the established dimension.
    fn prepare(&self, vector: &[f32]) -> Vec<f32> {
        let mut prepared: Vec<f32> = vector
            .iter()
            .map(|v| if v.is_finite() { *v } else { 0.0 })
            .collect();

        if let Some(dim) = self.dimension() {
            if prepared.len() != dim {
                tracing::warn!(
                    expected = dim,
                    actual = prepared.len(),
                    "{}: vector dimension mismatch, fitting best-effort",
                    self.label
                );
                prepared.resize(dim, 0.0);
            }
        }
        self.config.metric.prepare(&mut prepared);
        prepared
    }

    /// Nearest centroid as `(position, distance)`; ties keep the oldest.
    fn nearest(&self, vector: &[f32]) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (position, cluster) in self.clusters.iter().enumerate() {
            let d = self.config.metric.distance(vector, &cluster.centroid);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((position, d)),
            }
        }
        best
    }

    /// Distance from `vector` to a cluster's centroid on this population's scale.
    pub fn distance_to(&self, vector: &[f32], cluster_id: u64) -> Option<f32> {
        let prepared = self.prepare(vector);
        self.get(cluster_id)
            .map(|c| self.config.metric.distance(&prepared, &c.centroid))
    }

    /// Similarity in `[0, 1]` of `vector` to every cluster, in population order.
    pub fn similarities(&self, vector: &[f32]) -> Vec<(u64, f32)> {
        let prepared = self.prepare(vector);
        self.clusters
            .iter()
            .map(|c| (c.id, self.config.metric.similarity(&prepared, &c.centroid)))
            .collect()
    }

    /// Threshold for the current population size.
    pub fn current_threshold(&self) -> f32 {
        self.config.threshold.threshold_for(self.clusters.len())
    }

    /// Dimension established by the first cluster.
    pub fn dimension(&self) -> Option<usize> {
        self.clusters.first().map(|c| c.centroid.len())
    }

    /// Cluster by id.
    pub fn get(&self, id: u64) -> Option<&ClusterRecord<E>> {
        self.positions.get(&id).and_then(|p| self.clusters.get(*p))
    }

    /// Mutable cluster by id, for population-specific extension updates.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut ClusterRecord<E>> {
        match self.positions.get(&id) {
            Some(p) => self.clusters.get_mut(*p),
            None => None,
        }
    }

    /// Cluster a member id was assigned to, even after `member_cap` evicted it.
    pub fn cluster_of(&self, member_id: &str) -> Option<u64> {
        self.member_index.get(member_id).copied()
    }

    /// All clusters in creation order.
    pub fn clusters(&self) -> &[ClusterRecord<E>] {
        &self.clusters
    }

    /// Number of clusters.
    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether the population is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Next id that will be handed out.
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Active metric.
    #[inline]
    pub fn metric(&self) -> DistanceMetric {
        self.config.metric
    }

    /// Clustering configuration.
    #[inline]
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// When the population last changed.
    #[inline]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Capture the full state.
    pub fn snapshot(&self) -> ClusterSnapshot<E>
    where
        E: Clone,
    {
        ClusterSnapshot {
            version: SNAPSHOT_VERSION,
            metric: self.config.metric,
            clusters: self.clusters.clone(),
            next_id: self.next_id,
            member_index: self.member_index.clone(),
            last_updated: self.last_updated,
        }
    }
}

impl<E> OnlineClusterer<E>
where
    E: Default + Clone + Serialize + DeserializeOwned,
{
    /// Write the snapshot atomically to `path`.
    pub fn save(&self, path: &Path) -> ArchetypeResult<()> {
        write_json_atomic(path, &self.snapshot())?;
        tracing::debug!(
            path = %path.display(),
            clusters = self.clusters.len(),
            "{}: saved snapshot",
            self.label
        );
        Ok(())
    }

    /// Load a population from `path`.
    ///
    /// `Ok(None)` when no snapshot exists. A snapshot from a newer format,
    /// with centroids of the wrong `dimension`, or built under a unit-length
    /// metric the configuration no longer uses is rejected.
    pub fn try_load(
        label: &'static str,
        config: ClusteringConfig,
        path: &Path,
        dimension: Option<usize>,
    ) -> ArchetypeResult<Option<(Self, RepairReport)>> {
        let snapshot: ClusterSnapshot<E> = match read_json(path)? {
            Some(snapshot) => snapshot,
            None => return Ok(None),
        };
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(ArchetypeError::corrupt(
                path,
                format!("unsupported snapshot version {}", snapshot.version),
            ));
        }
        if !snapshot.metric.converts_to(config.metric) {
            return Err(ArchetypeError::corrupt(
                path,
                format!(
                    "snapshot metric {} cannot be restored under {}",
                    snapshot.metric, config.metric
                ),
            ));
        }
        if let Some(expected) = dimension {
            if let Some(bad) = snapshot
                .clusters
                .iter()
                .find(|c| c.centroid.len() != expected)
            {
                return Err(ArchetypeError::DimensionMismatch {
                    expected,
                    actual: bad.centroid.len(),
                });
            }
        }
        Ok(Some(Self::from_snapshot(label, config, snapshot)))
    }

    /// Load a population, degrading any failure to an empty one.
    pub fn load_or_empty(
        label: &'static str,
        config: ClusteringConfig,
        path: &Path,
        dimension: Option<usize>,
    ) -> Self {
        match Self::try_load(label, config.clone(), path, dimension) {
            Ok(Some((clusterer, _))) => {
                tracing::info!(
                    path = %path.display(),
                    clusters = clusterer.len(),
                    "{}: restored snapshot",
                    label
                );
                clusterer
            }
            Ok(None) => Self::new(label, config),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "{}: unreadable snapshot, starting empty",
                    label
                );
                Self::new(label, config)
            }
        }
    }
}
