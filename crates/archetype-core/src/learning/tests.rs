//! Tests for preference and pathway learning.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

use crate::clustering::MaturityTier;
use crate::config::{PathwayConfig, PreferenceConfig, DEFAULT_CHANNELS};
use crate::observation::{EventFlags, Observation, ObservationBuilder};
use crate::signature::{Signature, SignatureExtractor};

use super::*;

fn channels() -> Vec<String> {
    DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect()
}

fn preferences() -> PreferenceLearner {
    PreferenceLearner::new(PreferenceConfig::default(), 0.6, channels())
}

fn turn(id: &str, outcome: f32) -> Observation {
    ObservationBuilder::new(id)
        .channel("safety", 0.2, 0.9)
        .channel("trust", 0.5, 0.5)
        .channel("agency", 0.6, 0.3)
        .cycles(4)
        .outcome(outcome)
        .build()
}

fn mean(weights: &std::collections::BTreeMap<String, f32>) -> f32 {
    weights.values().sum::<f32>() / weights.len() as f32
}

#[test]
fn test_channel_importance_has_mean_one() {
    let learner = preferences();
    let importance = learner.channel_importance(&turn("t", 0.9));
    assert_eq!(importance.len(), 12);
    assert!((mean(&importance) - 1.0).abs() < 1e-5);
    // Rising safety outweighs falling agency.
    assert!(importance["safety"] > importance["agency"]);
    assert!(importance["safety"] > importance["trust"]);
}

#[test]
fn test_failure_without_preference_is_ignored() {
    let mut learner = preferences();
    assert!(learner
        .observe(1, MaturityTier::Nascent, &turn("t", 0.2), 0.5)
        .is_none());
    assert!(learner.is_empty());
}

#[test]
fn test_first_success_creates_preference() {
    let mut learner = preferences();
    let pref = learner
        .observe(1, MaturityTier::Nascent, &turn("t", 0.8), 0.7)
        .expect("created")
        .clone();
    assert_eq!(pref.family_id, 1);
    assert_eq!(pref.successes, 1);
    assert_eq!(pref.sample_count, 1);
    assert_eq!(pref.success_rate, 1.0);
    assert_eq!(pref.target_outcome, 0.8);
    assert_eq!(pref.quality_expectation, 0.7);
    assert!(!pref.mature);
    assert!((pref.mean_weight() - 1.0).abs() < 1e-5);
}

#[test]
fn test_failure_updates_success_rate() {
    let mut learner = preferences();
    learner.observe(1, MaturityTier::Nascent, &turn("a", 0.9), 0.5);
    let pref = learner
        .observe(1, MaturityTier::Nascent, &turn("b", 0.1), 0.5)
        .expect("exists");
    assert_eq!(pref.sample_count, 2);
    assert_eq!(pref.successes, 1);
    assert_eq!(pref.success_rate, 0.5);
    // Failures do not move the target.
    assert_eq!(pref.target_outcome, 0.9);
}

#[test]
fn test_target_outcome_ema() {
    let mut learner = preferences();
    learner.observe(1, MaturityTier::Nascent, &turn("a", 0.6), 0.5);
    let pref = learner
        .observe(1, MaturityTier::Nascent, &turn("b", 1.0), 0.5)
        .expect("exists");
    // 0.6 + 0.1 * (1.0 - 0.6)
    assert!((pref.target_outcome - 0.64).abs() < 1e-6);
}

#[test]
fn test_guidance_requires_established_family() {
    let mut learner = preferences();
    learner.observe(3, MaturityTier::Nascent, &turn("a", 0.9), 0.5);
    assert!(learner.guidance(3).is_none());

    learner.observe(3, MaturityTier::Established, &turn("b", 0.9), 0.5);
    let guidance = learner.guidance(3).expect("mature");
    assert_eq!(guidance.family_id, 3);
    assert_eq!(guidance.sample_count, 2);
    assert_eq!(guidance.ranked_channels()[0].0, "safety");
    assert!(learner.guidance(99).is_none());
}

#[test]
fn test_weights_keep_mean_one_under_random_inputs() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let mut learner = preferences();
    for i in 0..300 {
        let mut builder = ObservationBuilder::new(format!("r{}", i));
        for name in DEFAULT_CHANNELS {
            if rng.gen_bool(0.7) {
                builder = builder.channel(name, rng.gen(), rng.gen());
            }
        }
        let obs = builder.outcome(rng.gen()).build();
        let family = rng.gen_range(1..4);
        if let Some(pref) = learner.observe(family, MaturityTier::Nascent, &obs, rng.gen()) {
            assert!(
                (pref.mean_weight() - 1.0).abs() < 1e-4,
                "mean {} after update {}",
                pref.mean_weight(),
                i
            );
            assert!(pref.channel_weights.values().all(|w| w.is_finite() && *w > 0.0));
        }
    }
}

#[test]
fn test_normalize_mean_one_degenerate() {
    let mut weights: std::collections::BTreeMap<String, f32> =
        [("a".to_string(), 0.0), ("b".to_string(), 0.0)].into_iter().collect();
    normalize_mean_one(&mut weights);
    assert!(weights.values().all(|w| *w == 1.0));
}

#[test]
fn test_preference_roundtrip() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("preferences.json");
    let mut learner = preferences();
    learner.observe(1, MaturityTier::Established, &turn("a", 0.9), 0.5);
    learner.observe(2, MaturityTier::Nascent, &turn("b", 0.7), 0.4);
    learner.save(&path).expect("save");

    let restored = PreferenceLearner::load(PreferenceConfig::default(), 0.6, channels(), &path);
    assert_eq!(restored.snapshot(), learner.snapshot());
    assert!(restored.guidance(1).is_some());
    assert!(restored.guidance(2).is_none());
}

#[test]
fn test_preference_load_corrupt_is_empty() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("preferences.json");
    std::fs::write(&path, "[]").expect("write");
    let restored = PreferenceLearner::load(PreferenceConfig::default(), 0.6, channels(), &path);
    assert!(restored.is_empty());
}

fn signature(extractor: &SignatureExtractor, obs: &Observation) -> Signature {
    extractor.extract(obs)
}

fn pathways() -> PathwayLearner {
    PathwayLearner::new(PathwayConfig::default(), 0.6)
}

#[test]
fn test_pathway_confidence_moves_toward_outcome() {
    let extractor = SignatureExtractor::default();
    let mut learner = pathways();

    let first = turn("a", 0.9);
    let update = learner.observe(&first.id, &signature(&extractor, &first), &first);
    assert!(update.assignment.created);
    assert!(update.success);
    // 0.5 + 0.2 * (1.0 - 0.5)
    assert!((update.confidence - 0.6).abs() < 1e-6);

    let second = turn("b", 0.1);
    let update = learner.observe(&second.id, &signature(&extractor, &second), &second);
    assert!(!update.assignment.created);
    assert!(!update.success);
    // 0.6 + 0.2 * (0.0 - 0.6)
    assert!((update.confidence - 0.48).abs() < 1e-6);

    let state = &learner.get(update.assignment.cluster_id).expect("pathway").extension;
    assert_eq!(state.successes, 1);
    assert_eq!(state.failures, 1);
    assert_eq!(state.mean_cycles_to_success(), Some(4.0));
}

#[test]
fn test_pathway_replay_keeps_confidence() {
    let extractor = SignatureExtractor::default();
    let mut learner = pathways();
    let obs = turn("a", 0.9);
    let sig = signature(&extractor, &obs);
    let first = learner.observe(&obs.id, &sig, &obs);
    let again = learner.observe(&obs.id, &sig, &obs);
    assert!(again.assignment.replayed);
    assert_eq!(first.confidence, again.confidence);
    assert_eq!(
        learner
            .get(first.assignment.cluster_id)
            .expect("pathway")
            .extension
            .sample_count(),
        1
    );
}

#[test]
fn test_pathway_event_counters() {
    let extractor = SignatureExtractor::default();
    let mut learner = pathways();
    let obs = ObservationBuilder::new("e")
        .events(EventFlags {
            breakthrough: true,
            rupture: true,
            crisis: false,
        })
        .outcome(0.9)
        .build();
    let update = learner.observe(&obs.id, &signature(&extractor, &obs), &obs);
    let state = &learner.get(update.assignment.cluster_id).expect("pathway").extension;
    assert_eq!(state.breakthroughs, 1);
    assert_eq!(state.crises, 1);
}

#[test]
fn test_best_pathway_requires_min_samples() {
    let extractor = SignatureExtractor::default();
    let mut learner = pathways();
    for i in 0..2 {
        let obs = turn(&format!("a{}", i), 0.9);
        learner.observe(&obs.id, &signature(&extractor, &obs), &obs);
    }
    let query = signature(&extractor, &turn("query", 0.9));
    assert!(learner.best_pathway(&query).is_none());

    let obs = turn("a2", 0.9);
    learner.observe(&obs.id, &signature(&extractor, &obs), &obs);
    let best = learner.best_pathway(&query).expect("eligible");
    assert_eq!(best.sample_count, 3);
    assert!((best.score - best.similarity * best.confidence).abs() < 1e-6);
    assert_eq!(best.success_rate, 1.0);
}

#[test]
fn test_recommendations_rank_by_score() {
    let extractor = SignatureExtractor::default();
    let mut learner = pathways();

    // Two well separated pathways: one reliable, one failing.
    for i in 0..4 {
        let good = turn(&format!("g{}", i), 0.9);
        learner.observe(&good.id, &signature(&extractor, &good), &good);
        let bad = ObservationBuilder::new(format!("b{}", i))
            .urgency(1.0, 1.0)
            .drive(5.0, 5.0)
            .outcome(0.1)
            .build();
        learner.observe(&bad.id, &signature(&extractor, &bad), &bad);
    }
    assert_eq!(learner.len(), 2);

    let query = signature(&extractor, &turn("query", 0.9));
    let ranked = learner.recommendations(&query, 5);
    assert_eq!(ranked.len(), 2);
    assert!(ranked[0].score >= ranked[1].score);
    assert!(ranked[0].confidence > ranked[1].confidence);
    assert_eq!(learner.recommendations(&query, 1).len(), 1);
    assert!(learner.mean_confidence().is_some());
}

#[test]
fn test_pathway_roundtrip() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("pathways.json");
    let extractor = SignatureExtractor::default();
    let mut learner = pathways();
    let obs = turn("a", 0.9);
    learner.observe(&obs.id, &signature(&extractor, &obs), &obs);
    learner.save(&path).expect("save");

    let restored =
        PathwayLearner::load(PathwayConfig::default(), 0.6, &path, extractor.dimension());
    assert_eq!(restored.snapshot(), learner.snapshot());
}
