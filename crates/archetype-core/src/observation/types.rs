//! Canonical observation types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Neutral value for a missing channel score, satisfaction or urgency.
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Channel name to coherence score in `[0, 1]`.
pub type ChannelScores = BTreeMap<String, f32>;

/// A before/after pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transition<T> {
    /// Value at the start of the interaction.
    pub before: T,
    /// Value at the end of the interaction.
    pub after: T,
}

impl<T> Transition<T> {
    /// Create a transition.
    pub fn new(before: T, after: T) -> Self {
        Self { before, after }
    }
}

impl Transition<f32> {
    /// `after − before`.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.after - self.before
    }
}

/// Notable events flagged by the upstream pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventFlags {
    /// A marked positive shift.
    #[serde(default)]
    pub breakthrough: bool,
    /// An acute distress signal.
    #[serde(default)]
    pub crisis: bool,
    /// A break in the interaction.
    #[serde(default)]
    pub rupture: bool,
}

impl EventFlags {
    /// Number of flags that are set.
    pub fn active_count(&self) -> usize {
        [self.breakthrough, self.crisis, self.rupture]
            .iter()
            .filter(|f| **f)
            .count()
    }

    /// Total number of flags.
    pub const COUNT: usize = 3;
}

/// Four modulation markers attached to an intermediate step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModulationMarkers {
    /// Warmth of the response. Range: `[0, 1]`
    pub warmth: f32,
    /// Pacing (slow = 0, fast = 1). Range: `[0, 1]`
    pub pacing: f32,
    /// Containment of intensity. Range: `[0, 1]`
    pub containment: f32,
    /// Directness. Range: `[0, 1]`
    pub directness: f32,
}

impl Default for ModulationMarkers {
    fn default() -> Self {
        Self {
            warmth: NEUTRAL_SCORE,
            pacing: NEUTRAL_SCORE,
            containment: NEUTRAL_SCORE,
            directness: NEUTRAL_SCORE,
        }
    }
}

impl ModulationMarkers {
    /// Markers as an ordered array.
    pub fn to_array(&self) -> [f32; 4] {
        [self.warmth, self.pacing, self.containment, self.directness]
    }

    pub(crate) fn sanitized(self) -> Self {
        Self {
            warmth: unit_or_neutral(self.warmth),
            pacing: unit_or_neutral(self.pacing),
            containment: unit_or_neutral(self.containment),
            directness: unit_or_neutral(self.directness),
        }
    }
}

/// One intermediate step of an interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    /// Channel scores at this step (same shape as the before/after maps).
    pub channels: ChannelScores,
    /// Modulation markers at this step.
    #[serde(default)]
    pub markers: ModulationMarkers,
}

/// A normalized interaction record.
///
/// Produced once at the system boundary (see
/// [`RawObservation`](super::RawObservation) and
/// [`ObservationBuilder`](super::ObservationBuilder)) and only read after
/// that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Identifier; replaying the same id never inflates membership.
    pub id: String,
    /// When the interaction happened.
    pub timestamp: DateTime<Utc>,
    /// Per-channel coherence scores before and after.
    pub channels: Transition<ChannelScores>,
    /// Scalar drive level (0 up to the configured maximum).
    pub drive: Transition<f32>,
    /// Discrete state labels.
    pub state: Transition<Option<String>>,
    /// Satisfaction in `[0, 1]`.
    pub satisfaction: Transition<f32>,
    /// Urgency in `[0, 1]`.
    pub urgency: Transition<f32>,
    /// Number of exchange cycles in the interaction.
    pub cycle_count: u32,
    /// Event flags.
    pub events: EventFlags,
    /// Ordered intermediate steps; empty when not supplied.
    #[serde(default)]
    pub trajectory: Vec<TrajectoryStep>,
    /// Outcome scalar in `[0, 1]`.
    pub outcome: f32,
}

impl Observation {
    /// Whether an intermediate trajectory was supplied.
    #[inline]
    pub fn has_trajectory(&self) -> bool {
        !self.trajectory.is_empty()
    }

    /// Before score for a channel, neutral when missing.
    pub fn score_before(&self, channel: &str) -> f32 {
        self.channels
            .before
            .get(channel)
            .copied()
            .unwrap_or(NEUTRAL_SCORE)
    }

    /// After score for a channel, neutral when missing.
    pub fn score_after(&self, channel: &str) -> f32 {
        self.channels
            .after
            .get(channel)
            .copied()
            .unwrap_or(NEUTRAL_SCORE)
    }

    /// Clamp every field into its documented range, replacing non-finite
    /// values with neutral defaults.
    pub(crate) fn sanitized(mut self) -> Self {
        sanitize_scores(&mut self.channels.before);
        sanitize_scores(&mut self.channels.after);
        self.drive = Transition::new(
            drive_or_zero(self.drive.before),
            drive_or_zero(self.drive.after),
        );
        self.satisfaction = Transition::new(
            unit_or_neutral(self.satisfaction.before),
            unit_or_neutral(self.satisfaction.after),
        );
        self.urgency = Transition::new(
            unit_or_neutral(self.urgency.before),
            unit_or_neutral(self.urgency.after),
        );
        self.state = Transition::new(
            normalize_label(self.state.before),
            normalize_label(self.state.after),
        );
        for step in self.trajectory.iter_mut() {
            sanitize_scores(&mut step.channels);
            step.markers = step.markers.sanitized();
        }
        self.outcome = unit_or_neutral(self.outcome);
        self
    }
}

fn sanitize_scores(scores: &mut ChannelScores) {
    scores.retain(|_, v| v.is_finite());
    for v in scores.values_mut() {
        *v = v.clamp(0.0, 1.0);
    }
}

fn unit_or_neutral(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        NEUTRAL_SCORE
    }
}

fn drive_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

fn normalize_label(label: Option<String>) -> Option<String> {
    label
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
}
