//! A single cluster record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::maturity::MaturityTier;
use super::membership::CappedMembership;
use super::stats::RunningStats;

/// One cluster of an online clustering population.
///
/// `E` carries population-specific state (family traits, pathway
/// confidence); the shared fields are maintained by
/// [`OnlineClusterer`](super::OnlineClusterer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "E: Serialize",
    deserialize = "E: Deserialize<'de> + Default"
))]
pub struct ClusterRecord<E> {
    /// Monotonically assigned id, starting at 1.
    pub id: u64,

    /// EMA centroid on the population's metric scale.
    pub centroid: Vec<f32>,

    /// Deduplicated, capped member ids (oldest first).
    pub members: CappedMembership,

    /// Running outcome statistics over every accepted assignment.
    pub outcome: RunningStats,

    /// Monotonic maturity tier.
    pub maturity: MaturityTier,

    /// Accepted assignments, including members since evicted by the cap.
    pub total_assignments: u64,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Last accepted assignment.
    pub updated_at: DateTime<Utc>,

    /// Population-specific state.
    #[serde(default)]
    pub extension: E,
}

impl<E: Default> ClusterRecord<E> {
    pub(crate) fn new(id: u64, centroid: Vec<f32>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            centroid,
            members: CappedMembership::new(),
            outcome: RunningStats::new(),
            maturity: MaturityTier::Nascent,
            total_assignments: 0,
            created_at: now,
            updated_at: now,
            extension: E::default(),
        }
    }
}

impl<E> ClusterRecord<E> {
    /// Member count; always equal to the member list length.
    #[inline]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Running mean outcome.
    #[inline]
    pub fn mean_outcome(&self) -> f32 {
        self.outcome.mean()
    }

    /// Running outcome variance.
    #[inline]
    pub fn outcome_variance(&self) -> f32 {
        self.outcome.variance()
    }
}
