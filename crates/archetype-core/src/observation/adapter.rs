//! Boundary adapter from loosely typed upstream records.
//!
//! Upstream scorers report channel results in several shapes: bare numbers,
//! numeric strings, booleans, or objects carrying the score under one of a
//! few keys. [`RawObservation::normalize`] resolves all of them once, so the
//! rest of the crate only ever sees a strongly typed [`Observation`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::types::{
    ChannelScores, EventFlags, ModulationMarkers, Observation, TrajectoryStep, Transition,
    NEUTRAL_SCORE,
};

/// Keys tried, in order, when a channel result is an object.
pub const SCORE_KEYS: [&str; 3] = ["score", "coherence", "value"];

/// Keys tried, in order, when a state label is an object.
const LABEL_KEYS: [&str; 3] = ["label", "state", "name"];

/// One intermediate step as reported upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTrajectoryStep {
    /// Channel results at this step.
    #[serde(default)]
    pub channels: BTreeMap<String, Value>,
    /// Modulation markers by name.
    #[serde(default)]
    pub markers: BTreeMap<String, Value>,
}

/// Loosely typed observation as produced by the upstream pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawObservation {
    /// Identifier; generated when missing.
    #[serde(default)]
    pub id: Option<String>,
    /// Timestamp; now when missing.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Channel results before the interaction.
    #[serde(default)]
    pub channels_before: BTreeMap<String, Value>,
    /// Channel results after the interaction.
    #[serde(default)]
    pub channels_after: BTreeMap<String, Value>,
    #[serde(default)]
    pub drive_before: Option<Value>,
    #[serde(default)]
    pub drive_after: Option<Value>,
    #[serde(default)]
    pub state_before: Option<Value>,
    #[serde(default)]
    pub state_after: Option<Value>,
    #[serde(default)]
    pub satisfaction_before: Option<Value>,
    #[serde(default)]
    pub satisfaction_after: Option<Value>,
    #[serde(default)]
    pub urgency_before: Option<Value>,
    #[serde(default)]
    pub urgency_after: Option<Value>,
    #[serde(default)]
    pub cycle_count: Option<Value>,
    /// Either a list of event names or an object of booleans.
    #[serde(default)]
    pub events: Option<Value>,
    #[serde(default)]
    pub trajectory: Vec<RawTrajectoryStep>,
    #[serde(default)]
    pub outcome: Option<Value>,
}

impl RawObservation {
    /// Parse a JSON document into a raw observation.
    pub fn from_json(text: &str) -> crate::error::ArchetypeResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolve into the canonical observation.
    ///
    /// Never fails: unusable values are dropped or replaced by neutral
    /// defaults and the result is clamped into range.
    pub fn normalize(self) -> Observation {
        let id = self
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| {
                let generated = Uuid::new_v4().to_string();
                tracing::debug!(id = %generated, "OBSERVATION: generated missing id");
                generated
            });

        let observation = Observation {
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            channels: Transition::new(
                coerce_channels(&id, self.channels_before),
                coerce_channels(&id, self.channels_after),
            ),
            drive: Transition::new(
                scalar_or(self.drive_before.as_ref(), 0.0),
                scalar_or(self.drive_after.as_ref(), 0.0),
            ),
            state: Transition::new(
                self.state_before.as_ref().and_then(coerce_label),
                self.state_after.as_ref().and_then(coerce_label),
            ),
            satisfaction: Transition::new(
                scalar_or(self.satisfaction_before.as_ref(), NEUTRAL_SCORE),
                scalar_or(self.satisfaction_after.as_ref(), NEUTRAL_SCORE),
            ),
            urgency: Transition::new(
                scalar_or(self.urgency_before.as_ref(), NEUTRAL_SCORE),
                scalar_or(self.urgency_after.as_ref(), NEUTRAL_SCORE),
            ),
            cycle_count: self
                .cycle_count
                .as_ref()
                .and_then(coerce_score)
                .map(|c| c.max(0.0).round() as u32)
                .unwrap_or(0),
            events: self.events.as_ref().map(coerce_events).unwrap_or_default(),
            trajectory: self
                .trajectory
                .into_iter()
                .map(|step| TrajectoryStep {
                    channels: coerce_channels(&id, step.channels),
                    markers: coerce_markers(&step.markers),
                })
                .collect(),
            outcome: scalar_or(self.outcome.as_ref(), NEUTRAL_SCORE),
            id,
        };
        observation.sanitized()
    }
}

impl From<RawObservation> for Observation {
    fn from(raw: RawObservation) -> Self {
        raw.normalize()
    }
}

/// Interpret one upstream value as a number.
///
/// Numbers, numeric strings and booleans convert directly; objects are
/// searched for a [`SCORE_KEYS`] entry. Non-finite results are rejected.
pub fn coerce_score(value: &Value) -> Option<f32> {
    let score = match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Object(map) => SCORE_KEYS
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(|inner| match inner {
                Value::Object(_) => None,
                other => coerce_score(other),
            }),
        Value::Null | Value::Array(_) => None,
    };
    score.filter(|v| v.is_finite())
}

fn scalar_or(value: Option<&Value>, default: f32) -> f32 {
    value.and_then(coerce_score).unwrap_or(default)
}

fn coerce_channels(id: &str, raw: BTreeMap<String, Value>) -> ChannelScores {
    let mut scores = ChannelScores::new();
    for (name, value) in raw {
        match coerce_score(&value) {
            Some(score) => {
                scores.insert(name, score);
            }
            None => {
                tracing::debug!(
                    observation_id = id,
                    channel = %name,
                    "OBSERVATION: dropped unusable channel value"
                );
            }
        }
    }
    scores
}

fn coerce_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => LABEL_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

fn coerce_events(value: &Value) -> EventFlags {
    let mut flags = EventFlags::default();
    let mut set = |name: &str| match name.trim().to_lowercase().as_str() {
        "breakthrough" => flags.breakthrough = true,
        "crisis" => flags.crisis = true,
        "rupture" => flags.rupture = true,
        other => tracing::debug!(event = other, "OBSERVATION: ignored unknown event"),
    };
    match value {
        Value::Array(items) => {
            for name in items.iter().filter_map(Value::as_str) {
                set(name);
            }
        }
        Value::Object(map) => {
            for (name, v) in map {
                if coerce_score(v).map(|s| s > 0.0).unwrap_or(false) {
                    set(name);
                }
            }
        }
        Value::String(name) => set(name),
        _ => {}
    }
    flags
}

fn coerce_markers(raw: &BTreeMap<String, Value>) -> ModulationMarkers {
    let get = |name: &str| raw.get(name).and_then(coerce_score).unwrap_or(NEUTRAL_SCORE);
    ModulationMarkers {
        warmth: get("warmth"),
        pacing: get("pacing"),
        containment: get("containment"),
        directness: get("directness"),
    }
}
