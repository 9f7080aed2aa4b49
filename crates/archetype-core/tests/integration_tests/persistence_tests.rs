//! Snapshot Persistence Tests

use tempfile::TempDir;

use archetype_core::persistence::StreamStorage;
use archetype_core::{ArchetypeConfig, LearningStream};

use super::helpers::{crisis_like, init_tracing, safety_like};

fn storage(dir: &TempDir, config: &ArchetypeConfig) -> StreamStorage {
    StreamStorage::new(dir.path(), "session-1", &config.storage)
}

#[test]
fn test_restart_restores_identical_families() {
    let dir = TempDir::new().expect("tempdir");
    let config = ArchetypeConfig::default();

    let before = {
        let storage = storage(&dir, &config);
        let mut stream = LearningStream::open("session-1", config.clone(), storage).expect("open");
        for i in 0..6 {
            stream.process(&safety_like(&format!("calm-{}", i), i, 0.8));
        }
        for i in 0..4 {
            stream.process(&crisis_like(&format!("crisis-{}", i), i, 0.2));
        }
        stream.families().snapshot()
    };

    let stream =
        LearningStream::open("session-1", config.clone(), storage(&dir, &config)).expect("reopen");
    let after = stream.families().snapshot();
    assert_eq!(after.clusters, before.clusters);
    assert_eq!(after.next_id, before.next_id);
    assert_eq!(stream.families().family_of("crisis-2"), Some(2));
}

#[test]
fn test_writes_leave_no_temporary_files() {
    let dir = TempDir::new().expect("tempdir");
    let config = ArchetypeConfig::default();
    let storage = storage(&dir, &config);
    let mut stream = LearningStream::open("session-1", config, storage.clone()).expect("open");
    for i in 0..3 {
        stream.process(&safety_like(&format!("calm-{}", i), i, 0.8));
    }

    let names: Vec<String> = std::fs::read_dir(storage.dir())
        .expect("read_dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 5, "unexpected files: {:?}", names);
    assert!(names.iter().all(|n| n.ends_with(".json")));
}

#[test]
fn test_corrupt_snapshots_load_as_empty() {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let config = ArchetypeConfig::default();
    let storage = storage(&dir, &config);
    std::fs::create_dir_all(storage.dir()).expect("mkdir");
    std::fs::write(storage.families_path(), "not json at all").expect("write");
    std::fs::write(storage.pathways_path(), "[]").expect("write");
    std::fs::write(storage.rewards_path(), "{\"version\": 1").expect("write");

    let mut stream = LearningStream::open("session-1", config, storage).expect("open");
    assert!(stream.families().is_empty());
    assert!(stream.pathways().is_empty());
    assert_eq!(stream.rewards().global().epochs_completed, 0);

    // The stream keeps working and overwrites the bad snapshots.
    let report = stream.process(&safety_like("calm-0", 0, 0.8));
    assert!(report.family.created);
    assert_eq!(report.family.cluster_id, 1);
}

#[test]
fn test_layout_change_discards_stored_centroids() {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let config = ArchetypeConfig::default();
    {
        let storage = storage(&dir, &config);
        let mut stream = LearningStream::open("session-1", config.clone(), storage).expect("open");
        stream.process(&safety_like("calm-0", 0, 0.8));
    }

    let mut reduced = config.clone();
    reduced.signature.include_trajectory = false;
    let reduced_storage = storage(&dir, &reduced);
    let stream =
        LearningStream::open("session-1", reduced.clone(), reduced_storage).expect("reopen");
    assert_eq!(stream.extractor().dimension(), 50);
    assert!(stream.families().is_empty());
    assert!(stream.pathways().is_empty());
}
