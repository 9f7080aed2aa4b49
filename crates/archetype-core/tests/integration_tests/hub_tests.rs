//! Stream Hub Tests

use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use archetype_core::{ArchetypeConfig, StreamHub};

use super::helpers::{crisis_like, safety_like};

#[test]
fn test_streams_learn_independently() {
    let hub = StreamHub::new(ArchetypeConfig::default()).expect("hub");
    for i in 0..5 {
        hub.process("calm-user", &safety_like(&format!("t-{}", i), i, 0.8));
        hub.process("crisis-user", &crisis_like(&format!("t-{}", i), i, 0.2));
    }

    let calm = hub.get("calm-user").expect("stream");
    let crisis = hub.get("crisis-user").expect("stream");
    let calm = calm.lock();
    let crisis = crisis.lock();
    assert_eq!(calm.families().len(), 1);
    assert_eq!(crisis.families().len(), 1);
    assert!(calm.guidance(1).is_some());
    // Failures never create a preference.
    assert!(crisis.guidance(1).is_none());
    assert!(crisis.preferences().is_empty());
}

#[test]
fn test_persistent_hub_resumes_streams() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = ArchetypeConfig::default();
    config.storage.root = Some(dir.path().to_path_buf());

    {
        let hub = StreamHub::new(config.clone()).expect("hub");
        for i in 0..3 {
            hub.process("alice", &safety_like(&format!("t-{}", i), i, 0.8));
        }
    }

    let hub = StreamHub::new(config).expect("hub");
    let report = hub.process("alice", &safety_like("t-0", 0, 0.8));
    assert!(report.is_replay());
    let stream = hub.get("alice").expect("stream");
    assert_eq!(stream.lock().families().get(1).unwrap().member_count(), 3);
}

#[test]
fn test_concurrent_streams() {
    let hub = Arc::new(StreamHub::new(ArchetypeConfig::default()).expect("hub"));
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let hub = Arc::clone(&hub);
            thread::spawn(move || {
                let name = format!("user-{}", worker);
                for i in 0..10 {
                    hub.process(&name, &safety_like(&format!("t-{}", i), i, 0.8));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker");
    }

    assert_eq!(hub.len(), 4);
    for name in hub.names() {
        let stream = hub.get(&name).expect("stream");
        let stream = stream.lock();
        assert_eq!(stream.turn_count(), 10);
        assert_eq!(stream.rewards().global().epochs_completed, 1);
    }
}
