//! Observation model and boundary adapter.
//!
//! An [`Observation`] is the single strongly typed input of the learning
//! core: before/after channel scores, drive, state, satisfaction and
//! urgency, plus cycle count, event flags, an optional trajectory and the
//! turn outcome. Upstream records enter through [`RawObservation`];
//! programmatic callers use [`ObservationBuilder`].

mod adapter;
mod builder;
mod types;


pub use self::adapter::{coerce_score, RawObservation, RawTrajectoryStep, SCORE_KEYS};
pub use self::builder::ObservationBuilder;
pub use self::types::{
    ChannelScores, EventFlags, ModulationMarkers, Observation, TrajectoryStep, Transition,
    NEUTRAL_SCORE,
};
