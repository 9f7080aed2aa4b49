//! Serializable clustering state and load-time repair.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::metric::DistanceMetric;
use super::record::ClusterRecord;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full state of one clustering population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "E: Serialize",
    deserialize = "E: Deserialize<'de> + Default"
))]
pub struct ClusterSnapshot<E> {
    /// Snapshot format version.
    pub version: u32,

    /// Metric the centroids were maintained under.
    pub metric: DistanceMetric,

    /// Every cluster record.
    pub clusters: Vec<ClusterRecord<E>>,

    /// Next id to hand out.
    pub next_id: u64,

    /// Member id to cluster id index.
    pub member_index: BTreeMap<String, u64>,

    /// When the population last changed.
    pub last_updated: DateTime<Utc>,
}

/// What had to be fixed while restoring a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Exact duplicate member ids removed across all clusters.
    pub duplicates_removed: usize,
    /// Member ids evicted to respect the configured cap.
    pub members_evicted: usize,
    /// Index entries added for members missing from the index.
    pub index_entries_added: usize,
    /// Index entries dropped because their cluster does not exist.
    pub index_entries_dropped: usize,
    /// Whether `next_id` had to be raised above the largest cluster id.
    pub next_id_repaired: bool,
    /// Whether centroids were rescaled to the configured metric.
    pub metric_converted: bool,
    /// Maturity tiers raised to match member counts.
    pub maturity_raised: usize,
    /// Clusters dropped because their centroids could not be brought onto
    /// the configured metric's scale.
    pub clusters_discarded: usize,
}

impl RepairReport {
    /// Whether the snapshot loaded without modification.
    pub fn is_clean(&self) -> bool {
        *self == RepairReport::default()
    }
}
