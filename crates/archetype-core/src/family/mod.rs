//! Family discovery.
//!
//! [`FamilyRegistry`] clusters full signatures into families and keeps
//! each family's most moved channels up to date. [`TransitionFamilies`]
//! clusters only the drive and channel-delta segments, grouping
//! interactions by how they moved rather than where they ended.

mod registry;
mod transitions;


pub use self::registry::{Family, FamilyRegistry, FamilyTraits, RegistrySnapshot};
pub use self::transitions::{TransitionFamilies, TransitionFamily, TransitionSnapshot};
