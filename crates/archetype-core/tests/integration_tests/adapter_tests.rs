//! Boundary Adapter Tests

use archetype_core::observation::NEUTRAL_SCORE;
use archetype_core::{ArchetypeConfig, LearningStream, RawObservation};

#[test]
fn test_loosely_typed_record_is_processed() {
    let raw = RawObservation::from_json(
        r#"{
            "id": "turn-1",
            "channels_before": {"safety": "0.3", "trust": {"value": 0.4}},
            "channels_after": {"safety": 0.9, "trust": true, "clarity": null},
            "drive_before": "3.5",
            "drive_after": 1,
            "state_after": "Settled",
            "urgency_before": 0.6,
            "events": {"breakthrough": 1},
            "outcome": "0.75"
        }"#,
    )
    .expect("parse");
    let obs = raw.normalize();

    assert_eq!(obs.score_before("safety"), 0.3);
    assert_eq!(obs.score_after("trust"), 1.0);
    assert_eq!(obs.score_after("clarity"), NEUTRAL_SCORE);
    assert_eq!(obs.state.after.as_deref(), Some("settled"));
    assert!(obs.events.breakthrough);
    assert_eq!(obs.outcome, 0.75);

    let mut stream = LearningStream::new(ArchetypeConfig::default());
    let report = stream.process(&obs);
    assert!(report.signature.is_finite());
    assert_eq!(report.signature.len(), 57);
    assert!(report.pathway.success);
}

#[test]
fn test_garbage_values_resolve_to_neutral() {
    let raw = RawObservation::from_json(
        r#"{
            "channels_after": {
                "safety": "high", "trust": [0.2], "agency": {"nested": {"score": 1}}
            },
            "drive_before": "lots",
            "outcome": {"unexpected": "shape"}
        }"#,
    )
    .expect("parse");
    let obs = raw.normalize();

    assert!(obs.channels.after.is_empty());
    assert_eq!(obs.drive.before, 0.0);
    assert_eq!(obs.outcome, NEUTRAL_SCORE);
    assert!(uuid::Uuid::parse_str(&obs.id).is_ok());

    let mut stream = LearningStream::new(ArchetypeConfig::default());
    let report = stream.process(&obs);
    assert!(report.signature.is_finite());
    assert!(!report.pathway.success);
}
