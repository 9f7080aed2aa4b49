//! Family Discovery Tests

use archetype_core::clustering::MaturityTier;
use archetype_core::{ArchetypeConfig, LearningStream};

use super::helpers::{crisis_like, ids, safety_like};

#[test]
fn test_ten_near_identical_signatures_form_one_mature_family() {
    let mut stream = LearningStream::new(ArchetypeConfig::default());
    for (i, id) in ids("calm", 10).iter().enumerate() {
        stream.process(&safety_like(id, i, 0.8));
    }

    let families = stream.families();
    assert_eq!(families.len(), 1);
    let family = &families.families()[0];
    assert_eq!(family.member_count(), 10);
    assert_eq!(family.maturity, MaturityTier::Mature);
    assert_eq!(family.extension.top_channels[0], "safety");
}

#[test]
fn test_crisis_and_safety_get_distinct_families() {
    let mut stream = LearningStream::new(ArchetypeConfig::default());
    let calm = stream.process(&safety_like("calm", 0, 0.8));
    let crisis = stream.process(&crisis_like("crisis", 0, 0.2));

    assert!(calm.family.created);
    assert!(crisis.family.created);
    assert_ne!(calm.family.cluster_id, crisis.family.cluster_id);
    assert!(crisis.family.distance > crisis.family.threshold);
}

#[test]
fn test_interleaved_classes_stay_separated() {
    let mut stream = LearningStream::new(ArchetypeConfig::default());
    for i in 0..10 {
        stream.process(&safety_like(&format!("calm-{}", i), i, 0.8));
        stream.process(&crisis_like(&format!("crisis-{}", i), i, 0.2));
    }

    let families = stream.families();
    assert_eq!(families.len(), 2);
    for family in families.families() {
        assert_eq!(family.member_count(), 10);
        let prefix = family.members.iter().next().unwrap().split('-').next().unwrap().to_string();
        assert!(family.members.iter().all(|m| m.starts_with(&prefix)));
    }

    let calm = families.family_of("calm-3").unwrap();
    let crisis = families.family_of("crisis-3").unwrap();
    let calm_outcome = families.get(calm).unwrap().mean_outcome();
    assert!(calm_outcome > families.get(crisis).unwrap().mean_outcome());
}

#[test]
fn test_replayed_stream_does_not_inflate_counts() {
    let mut stream = LearningStream::new(ArchetypeConfig::default());
    let observations: Vec<_> = ids("calm", 4)
        .iter()
        .enumerate()
        .map(|(i, id)| safety_like(id, i, 0.8))
        .collect();

    for obs in &observations {
        stream.process(obs);
    }
    for obs in &observations {
        assert!(stream.process(obs).is_replay());
    }

    let family = &stream.families().families()[0];
    assert_eq!(family.member_count(), 4);
    assert_eq!(family.total_assignments, 4);
    assert_eq!(stream.turn_count(), 4);
    assert_eq!(stream.rewards().pending().len(), 4);
}

#[test]
fn test_transition_families_follow_movement() {
    let mut stream = LearningStream::new(ArchetypeConfig::default());
    let a = stream.process(&safety_like("calm-0", 0, 0.8));
    let b = stream.process(&safety_like("calm-1", 1, 0.8));
    let c = stream.process(&crisis_like("crisis-0", 0, 0.2));

    assert_eq!(a.transition.cluster_id, b.transition.cluster_id);
    assert_ne!(a.transition.cluster_id, c.transition.cluster_id);
    assert_eq!(stream.transitions().len(), 2);
}

#[test]
fn test_guidance_only_for_established_families() {
    let mut stream = LearningStream::new(ArchetypeConfig::default());
    let first = stream.process(&safety_like("calm-0", 0, 0.8));
    assert!(first.guidance.is_none());
    stream.process(&safety_like("calm-1", 1, 0.8));
    let third = stream.process(&safety_like("calm-2", 2, 0.8));

    let guidance = third.guidance.expect("established family has guidance");
    assert_eq!(guidance.sample_count, 3);
    assert_eq!(guidance.success_rate, 1.0);
    assert!(guidance.weight("safety") > guidance.weight("trust"));
    let weights = &guidance.channel_weights;
    let mean = weights.values().sum::<f32>() / weights.len() as f32;
    assert!((mean - 1.0).abs() < 1e-4);
}
