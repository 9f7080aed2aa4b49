//! Helper Functions: Deterministic Observation Generation

use archetype_core::config::DEFAULT_CHANNELS;
use archetype_core::observation::{EventFlags, Observation, ObservationBuilder};

/// Route library logs to the test writer; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Small sin-based offset, reproducible per `(seed, channel)`.
pub fn perturbation(seed: usize, channel: usize) -> f32 {
    let x = (seed * 13 + channel) as f64 * 0.7;
    (0.005 * x.sin()) as f32
}

/// A settling interaction: every channel rises, safety most, drive falls.
pub fn safety_like(id: &str, seed: usize, outcome: f32) -> Observation {
    let mut builder = ObservationBuilder::new(id);
    for (k, name) in DEFAULT_CHANNELS.iter().enumerate() {
        let p = perturbation(seed, k);
        let (before, after) = if *name == "safety" { (0.4, 0.9) } else { (0.45, 0.6) };
        builder = builder.channel(*name, before + p, after + p);
    }
    builder
        .drive(3.0, 1.0)
        .state(Some("activated"), Some("settled"))
        .satisfaction(0.4, 0.8)
        .urgency(0.2, 0.1)
        .cycles(5)
        .events(EventFlags {
            breakthrough: true,
            ..Default::default()
        })
        .outcome(outcome)
        .build()
}

/// An escalating interaction: channels collapse, urgency and drive climb.
pub fn crisis_like(id: &str, seed: usize, outcome: f32) -> Observation {
    let mut builder = ObservationBuilder::new(id);
    for (k, name) in DEFAULT_CHANNELS.iter().enumerate() {
        let p = perturbation(seed, k);
        let (before, after) = match *name {
            "safety" => (0.6, 0.15),
            "expression" => (0.5, 0.6),
            _ => (0.5, 0.3),
        };
        builder = builder.channel(*name, before + p, after + p);
    }
    builder
        .drive(2.0, 4.5)
        .state(Some("engaged"), Some("withdrawn"))
        .satisfaction(0.5, 0.1)
        .urgency(0.9, 1.0)
        .cycles(14)
        .events(EventFlags {
            crisis: true,
            ..Default::default()
        })
        .outcome(outcome)
        .build()
}

/// Ids `prefix-0`, `prefix-1`, ...
pub fn ids(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}-{}", prefix, i)).collect()
}
