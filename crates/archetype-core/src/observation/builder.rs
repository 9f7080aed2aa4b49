//! Programmatic construction of observations.

use chrono::{DateTime, Utc};

use super::types::{
    ChannelScores, EventFlags, Observation, TrajectoryStep, Transition, NEUTRAL_SCORE,
};

/// Builder for [`Observation`].
///
/// Every field has a neutral default, so a builder with only an id produces
/// a valid observation. [`build`](Self::build) clamps values into range.
///
/// # Example
///
/// ```
/// use archetype_core::observation::ObservationBuilder;
///
/// let obs = ObservationBuilder::new("turn-1")
///     .channel("safety", 0.2, 0.7)
///     .drive(4.0, 2.0)
///     .outcome(0.8)
///     .build();
///
/// assert_eq!(obs.score_after("safety"), 0.7);
/// assert_eq!(obs.drive.delta(), -2.0);
/// ```
#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    inner: Observation,
}

impl ObservationBuilder {
    /// Start an observation with the given id, stamped now.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            inner: Observation {
                id: id.into(),
                timestamp: Utc::now(),
                channels: Transition::default(),
                drive: Transition::new(0.0, 0.0),
                state: Transition::new(None, None),
                satisfaction: Transition::new(NEUTRAL_SCORE, NEUTRAL_SCORE),
                urgency: Transition::new(NEUTRAL_SCORE, NEUTRAL_SCORE),
                cycle_count: 0,
                events: EventFlags::default(),
                trajectory: Vec::new(),
                outcome: NEUTRAL_SCORE,
            },
        }
    }

    /// Set the timestamp.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.inner.timestamp = timestamp;
        self
    }

    /// Set one channel's before and after score.
    pub fn channel(mut self, name: impl Into<String>, before: f32, after: f32) -> Self {
        let name = name.into();
        self.inner.channels.before.insert(name.clone(), before);
        self.inner.channels.after.insert(name, after);
        self
    }

    /// Replace both channel maps.
    pub fn channels(mut self, before: ChannelScores, after: ChannelScores) -> Self {
        self.inner.channels = Transition::new(before, after);
        self
    }

    /// Set the drive level before and after.
    pub fn drive(mut self, before: f32, after: f32) -> Self {
        self.inner.drive = Transition::new(before, after);
        self
    }

    /// Set the discrete state labels.
    pub fn state(mut self, before: Option<&str>, after: Option<&str>) -> Self {
        self.inner.state = Transition::new(before.map(str::to_string), after.map(str::to_string));
        self
    }

    /// Set satisfaction before and after.
    pub fn satisfaction(mut self, before: f32, after: f32) -> Self {
        self.inner.satisfaction = Transition::new(before, after);
        self
    }

    /// Set urgency before and after.
    pub fn urgency(mut self, before: f32, after: f32) -> Self {
        self.inner.urgency = Transition::new(before, after);
        self
    }

    /// Set the exchange cycle count.
    pub fn cycles(mut self, cycle_count: u32) -> Self {
        self.inner.cycle_count = cycle_count;
        self
    }

    /// Set the event flags.
    pub fn events(mut self, events: EventFlags) -> Self {
        self.inner.events = events;
        self
    }

    /// Append an intermediate step.
    pub fn step(mut self, step: TrajectoryStep) -> Self {
        self.inner.trajectory.push(step);
        self
    }

    /// Set the outcome scalar.
    pub fn outcome(mut self, outcome: f32) -> Self {
        self.inner.outcome = outcome;
        self
    }

    /// Finish, clamping every field into range.
    pub fn build(self) -> Observation {
        self.inner.sanitized()
    }
}
