//! Reward Rollup Tests

use tempfile::TempDir;

use archetype_core::persistence::StreamStorage;
use archetype_core::{ArchetypeConfig, LearningStream};

use super::helpers::{crisis_like, safety_like};

#[test]
fn test_epochs_roll_up_every_ten_turns() {
    let mut stream = LearningStream::new(ArchetypeConfig::default());
    let mut epochs = Vec::new();
    for i in 0..25 {
        let obs = if i % 4 == 3 {
            crisis_like(&format!("t-{}", i), i, 0.2)
        } else {
            safety_like(&format!("t-{}", i), i, 0.8)
        };
        if let Some(epoch) = stream.process(&obs).epoch {
            epochs.push((i, epoch));
        }
    }

    assert_eq!(epochs.len(), 2);
    assert_eq!(epochs[0].0, 9);
    assert_eq!(epochs[1].0, 19);
    for (_, epoch) in &epochs {
        assert_eq!(epoch.task_count, 10);
        assert!(epoch.success_count <= epoch.task_count);
        assert_eq!(epoch.distinct_families, 2);
        assert!((0.0..=1.0).contains(&epoch.reward));
    }
    assert_eq!(stream.rewards().pending().len(), 5);

    let global = stream.rewards().global();
    let r0 = epochs[0].1.reward;
    let r1 = epochs[1].1.reward;
    let expected = r0 + 0.3 * (r1 - r0);
    assert!((global.global_confidence.unwrap() - expected).abs() < 1e-5);
    assert!((global.growth_rate.unwrap() - (r1 / r0 - 1.0)).abs() < 1e-5);
}

#[test]
fn test_task_confidence_is_pathway_confidence() {
    let mut config = ArchetypeConfig::default();
    config.reward.epoch_size = 1;
    let mut stream = LearningStream::new(config);

    let report = stream.process(&safety_like("t-0", 0, 0.8));
    let epoch = report.epoch.expect("epoch of one");
    assert!((epoch.mean_confidence - report.pathway.confidence).abs() < 1e-6);
    // Initial 0.5 moved toward 1.0 at alpha 0.2
    assert!((report.pathway.confidence - 0.6).abs() < 1e-6);
}

#[test]
fn test_ledger_survives_restart() {
    let dir = TempDir::new().expect("tempdir");
    let config = ArchetypeConfig::default();
    let storage = StreamStorage::in_dir(dir.path().join("s"), &config.storage);

    let global = {
        let mut stream = LearningStream::open("s", config.clone(), storage.clone()).expect("open");
        for i in 0..20 {
            stream.process(&safety_like(&format!("t-{}", i), i, 0.8));
        }
        stream.rewards().global().clone()
    };
    assert_eq!(global.epochs_completed, 2);

    let mut stream = LearningStream::open("s", config, storage).expect("reopen");
    assert_eq!(stream.rewards().global(), &global);

    for i in 20..30 {
        stream.process(&safety_like(&format!("t-{}", i), i, 0.8));
    }
    let epochs = stream.rewards().epochs();
    assert_eq!(epochs.len(), 3);
    assert_eq!(epochs.back().unwrap().epoch_index, 2);
}
