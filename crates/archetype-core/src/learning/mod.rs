//! Learning from outcomes.
//!
//! Two learners consume each turn after family assignment:
//!
//! - [`PreferenceLearner`]: per-family channel importance weights, target
//!   outcome and quality expectation, exposed as [`Guidance`] once the
//!   family is established
//! - [`PathwayLearner`]: a similarity-keyed population whose confidence
//!   tracks how often similar signatures succeed

mod guidance;
mod pathway;
mod preference;

#[cfg(test)]
mod tests;

pub use self::guidance::Guidance;
pub use self::pathway::{
    Pathway, PathwayLearner, PathwayMatch, PathwaySnapshot, PathwayState, PathwayUpdate,
};
pub use self::preference::{
    normalize_mean_one, ClusterPreference, PreferenceLearner, PreferenceSnapshot,
    PREFERENCE_SNAPSHOT_VERSION,
};
