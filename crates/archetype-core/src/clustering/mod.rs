//! Online centroid clustering.
//!
//! Families, transition families and pathways all discover clusters the
//! same way: compare a vector to every centroid, accept the best match if it
//! lies within a population-adaptive threshold, otherwise start a new
//! cluster. This module holds that one implementation, parameterized by
//! [`ClusteringConfig`](crate::config::ClusteringConfig):
//!
//! - [`metric`]: Euclidean (raw) or cosine (unit-normalized) distance
//! - [`threshold`]: exploration / balanced / consolidation bands
//! - [`stats`]: EMA helper and Welford running statistics
//! - [`membership`]: deduplicated, capped member lists
//! - [`maturity`]: monotonic maturity tiers
//! - [`clusterer`]: the assign-or-create engine
//! - [`snapshot`]: serializable state with load-time repair

pub mod clusterer;
pub mod maturity;
pub mod membership;
pub mod metric;
pub mod record;
pub mod snapshot;
pub mod stats;
pub mod threshold;

#[cfg(test)]
mod tests;

pub use self::clusterer::{Assignment, OnlineClusterer};
pub use self::maturity::MaturityTier;
pub use self::membership::{CappedMembership, MembershipChange};
pub use self::metric::{cosine_similarity, euclidean_distance, l2_norm, DistanceMetric};
pub use self::record::ClusterRecord;
pub use self::snapshot::{ClusterSnapshot, RepairReport, SNAPSHOT_VERSION};
pub use self::stats::{ema, RunningStats};
pub use self::threshold::{ThresholdPolicy, ThresholdRegime};
