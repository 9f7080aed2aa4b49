//! Tests for the generic online clusterer.

use chrono::Utc;

use crate::config::ClusteringConfig;
use crate::error::ArchetypeError;

use super::*;

fn clusterer() -> OnlineClusterer<()> {
    OnlineClusterer::new("TEST", ClusteringConfig::families())
}

fn point(x: f32, y: f32) -> Vec<f32> {
    vec![x, y, 0.0, 0.0]
}

#[test]
fn test_first_assignment_creates_cluster_one() {
    let mut c = clusterer();
    let a = c.assign("m1", &point(1.0, 1.0), 0.5);
    assert!(a.created);
    assert!(!a.replayed);
    assert_eq!(a.cluster_id, 1);
    assert_eq!(a.distance, 0.0);
    assert_eq!(c.len(), 1);
    assert_eq!(c.get(1).unwrap().centroid, point(1.0, 1.0));
}

#[test]
fn test_close_vector_matches() {
    let mut c = clusterer();
    c.assign("m1", &point(1.0, 1.0), 0.5);
    let a = c.assign("m2", &point(1.1, 1.0), 0.7);
    assert!(!a.created);
    assert_eq!(a.cluster_id, 1);
    assert!((a.distance - 0.1).abs() < 1e-5);

    let cluster = c.get(1).unwrap();
    assert_eq!(cluster.member_count(), 2);
    assert_eq!(cluster.total_assignments, 2);
    // Warm start: second member pulls the centroid half way.
    assert!((cluster.centroid[0] - 1.05).abs() < 1e-5);
    assert!((cluster.mean_outcome() - 0.6).abs() < 1e-5);
}

#[test]
fn test_far_vector_creates_new_cluster() {
    let mut c = clusterer();
    c.assign("m1", &point(0.0, 0.0), 0.5);
    let a = c.assign("m2", &point(5.0, 5.0), 0.5);
    assert!(a.created);
    assert_eq!(a.cluster_id, 2);
    assert!(a.distance > a.threshold);
}

#[test]
fn test_replay_is_idempotent() {
    let mut c = clusterer();
    c.assign("m1", &point(0.0, 0.0), 0.5);
    c.assign("m2", &point(0.1, 0.0), 0.5);
    let before = c.get(1).unwrap().clone();

    let a = c.assign("m2", &point(0.1, 0.0), 0.9);
    assert!(a.replayed);
    assert_eq!(a.cluster_id, 1);
    assert_eq!(c.get(1).unwrap(), &before);
}

#[test]
fn test_cluster_count_never_decreases() {
    let mut c = clusterer();
    let mut last = 0;
    for i in 0..40 {
        let v = point((i % 7) as f32 * 2.0, (i % 3) as f32);
        c.assign(&format!("m{}", i), &v, 0.5);
        assert!(c.len() >= last);
        last = c.len();
    }
}

#[test]
fn test_member_cap_evicts_but_keeps_index() {
    let config = ClusteringConfig {
        member_cap: 10,
        ..ClusteringConfig::families()
    };
    let mut c: OnlineClusterer<()> = OnlineClusterer::new("TEST", config);
    for i in 0..15 {
        c.assign(&format!("m{}", i), &point(1.0, 1.0), 0.5);
    }
    let cluster = c.get(1).unwrap();
    assert_eq!(cluster.member_count(), 10);
    assert_eq!(cluster.total_assignments, 15);
    assert!(!cluster.members.contains("m0"));
    // Evicted members still replay to their cluster.
    assert!(c.assign("m0", &point(1.0, 1.0), 0.5).replayed);
}

#[test]
fn test_evicted_members_stay_indexed_across_snapshots() {
    let config = ClusteringConfig {
        member_cap: 10,
        ..ClusteringConfig::families()
    };
    let mut c: OnlineClusterer<()> = OnlineClusterer::new("TEST", config.clone());
    for i in 0..15 {
        c.assign(&format!("m{}", i), &point(1.0, 1.0), 0.5);
    }
    let snapshot = c.snapshot();
    assert_eq!(snapshot.member_index.len(), 15);

    let (mut reloaded, report) = OnlineClusterer::from_snapshot("TEST", config, snapshot);
    assert!(report.is_clean(), "unexpected repair: {:?}", report);
    assert_eq!(reloaded.cluster_of("m0"), Some(1));
    assert!(reloaded.assign("m0", &point(1.0, 1.0), 0.5).replayed);
    assert_eq!(reloaded.get(1).unwrap().total_assignments, 15);
}

#[test]
fn test_maturity_promotions_reported_once() {
    let mut c = clusterer();
    let mut promotions = Vec::new();
    for i in 0..12 {
        let a = c.assign(&format!("m{}", i), &point(1.0, 1.0), 0.5);
        if let Some(p) = a.promoted {
            promotions.push(p);
        }
    }
    assert_eq!(
        promotions,
        vec![
            (MaturityTier::Nascent, MaturityTier::Established),
            (MaturityTier::Established, MaturityTier::Mature),
        ]
    );
}

#[test]
fn test_threshold_tightens_for_small_population() {
    let c = clusterer();
    let empty_threshold = c.current_threshold();
    let policy = ThresholdPolicy::default();
    assert!((empty_threshold - policy.base * policy.exploration_factor).abs() < 1e-6);
}

#[test]
fn test_cosine_centroids_stay_unit_length() {
    let config = ClusteringConfig {
        metric: DistanceMetric::Cosine,
        threshold: ThresholdPolicy {
            base: 0.2,
            ..ThresholdPolicy::default()
        },
        ..ClusteringConfig::families()
    };
    let mut c: OnlineClusterer<()> = OnlineClusterer::new("TEST", config);
    c.assign("m1", &[3.0, 4.0, 0.0], 0.5);
    c.assign("m2", &[3.2, 4.1, 0.1], 0.5);
    let centroid = &c.get(1).unwrap().centroid;
    assert_eq!(c.len(), 1);
    assert!((l2_norm(centroid) - 1.0).abs() < 1e-5);
}

#[test]
fn test_dimension_mismatch_is_best_effort() {
    let mut c = clusterer();
    c.assign("m1", &point(1.0, 1.0), 0.5);
    let a = c.assign("m2", &[1.0, 1.0], 0.5);
    assert_eq!(a.cluster_id, 1);
    assert_eq!(c.get(1).unwrap().centroid.len(), 4);
}

#[test]
fn test_non_finite_entries_do_not_poison_centroid() {
    let mut c = clusterer();
    c.assign("m1", &point(1.0, 1.0), 0.5);
    c.assign("m2", &[1.0, f32::NAN, 0.0, 0.0], 0.5);
    assert!(c.get(1).unwrap().centroid.iter().all(|v| v.is_finite()));
}

#[test]
fn test_snapshot_round_trip_is_clean() {
    let mut c = clusterer();
    for i in 0..6 {
        c.assign(&format!("m{}", i), &point((i % 2) as f32 * 4.0, 1.0), 0.5);
    }
    let snapshot = c.snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let restored: ClusterSnapshot<()> = serde_json::from_str(&json).unwrap();

    let (reloaded, report) =
        OnlineClusterer::from_snapshot("TEST", ClusteringConfig::families(), restored);
    assert!(report.is_clean(), "unexpected repair: {:?}", report);
    assert_eq!(reloaded.clusters(), c.clusters());
    assert_eq!(reloaded.next_id(), c.next_id());
    assert_eq!(reloaded.cluster_of("m3"), c.cluster_of("m3"));
}

#[test]
fn test_snapshot_dedup_on_load() {
    let mut c = clusterer();
    for i in 0..3 {
        c.assign(&format!("m{}", i), &point(1.0, 1.0), 0.5);
    }
    let mut snapshot = c.snapshot();
    // Simulate a historical snapshot where replays inflated membership.
    let duplicated: CappedMembership = ["m0", "m1", "m1", "m2", "m0"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    snapshot.clusters[0].members = duplicated;

    let (reloaded, report) =
        OnlineClusterer::from_snapshot("TEST", ClusteringConfig::families(), snapshot);
    assert_eq!(report.duplicates_removed, 2);
    let cluster = reloaded.get(1).unwrap();
    assert_eq!(cluster.member_count(), 3);
    assert_eq!(cluster.members.iter().collect::<Vec<_>>(), vec!["m0", "m1", "m2"]);
}

#[test]
fn test_snapshot_repairs_next_id_and_index() {
    let mut c = clusterer();
    c.assign("m1", &point(0.0, 0.0), 0.5);
    c.assign("m2", &point(9.0, 9.0), 0.5);
    let mut snapshot = c.snapshot();
    snapshot.next_id = 1;
    snapshot.member_index.clear();
    snapshot.member_index.insert("ghost".to_string(), 99);
    snapshot.last_updated = Utc::now();

    let (reloaded, report) =
        OnlineClusterer::from_snapshot("TEST", ClusteringConfig::families(), snapshot);
    assert!(report.next_id_repaired);
    assert_eq!(report.index_entries_dropped, 1);
    assert_eq!(report.index_entries_added, 2);
    assert_eq!(reloaded.next_id(), 3);
    assert_eq!(reloaded.cluster_of("m2"), Some(2));
}

fn cosine_config() -> ClusteringConfig {
    ClusteringConfig {
        metric: DistanceMetric::Cosine,
        ..ClusteringConfig::families()
    }
}

#[test]
fn test_euclidean_snapshot_normalized_under_cosine() {
    let mut c = clusterer();
    c.assign("m1", &[3.0, 4.0, 0.0, 0.0], 0.5);
    let snapshot = c.snapshot();

    let (reloaded, report) = OnlineClusterer::from_snapshot("TEST", cosine_config(), snapshot);
    assert!(report.metric_converted);
    assert_eq!(report.clusters_discarded, 0);
    let centroid = &reloaded.get(1).unwrap().centroid;
    assert!((l2_norm(centroid) - 1.0).abs() < 1e-5);
    assert!((centroid[0] - 0.6).abs() < 1e-5);
    assert_eq!(reloaded.cluster_of("m1"), Some(1));
}

#[test]
fn test_cosine_snapshot_not_reused_under_euclidean() {
    let mut c: OnlineClusterer<()> = OnlineClusterer::new("TEST", cosine_config());
    c.assign("m1", &[3.0, 4.0, 0.0, 0.0], 0.5);
    let snapshot = c.snapshot();
    let next_id = snapshot.next_id;

    let (mut reloaded, report) =
        OnlineClusterer::from_snapshot("TEST", ClusteringConfig::families(), snapshot);
    assert!(report.metric_converted);
    assert_eq!(report.clusters_discarded, 1);
    assert!(reloaded.is_empty());
    assert_eq!(reloaded.cluster_of("m1"), None);
    assert_eq!(reloaded.next_id(), next_id);

    // The raw vector must not be compared against a unit-length centroid.
    let a = reloaded.assign("m2", &[3.0, 4.0, 0.0, 0.0], 0.5);
    assert!(a.created);
    assert_eq!(a.distance, 0.0);
}

#[test]
fn test_cosine_snapshot_file_rejected_under_euclidean() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("clusters.json");
    let mut c: OnlineClusterer<()> = OnlineClusterer::new("TEST", cosine_config());
    c.assign("m1", &[3.0, 4.0, 0.0, 0.0], 0.5);
    c.save(&path).unwrap();

    let err = OnlineClusterer::<()>::try_load("TEST", ClusteringConfig::families(), &path, None)
        .unwrap_err();
    assert!(matches!(err, ArchetypeError::CorruptSnapshot { .. }));

    let loaded: OnlineClusterer<()> =
        OnlineClusterer::load_or_empty("TEST", ClusteringConfig::families(), &path, None);
    assert!(loaded.is_empty());

    let same_metric: OnlineClusterer<()> =
        OnlineClusterer::load_or_empty("TEST", cosine_config(), &path, None);
    assert_eq!(same_metric.len(), 1);
}
