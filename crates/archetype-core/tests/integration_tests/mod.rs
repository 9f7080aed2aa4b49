//! End-to-end tests for the archetype learning core.
//!
//! Every test drives a real [`LearningStream`](archetype_core::LearningStream)
//! or [`StreamHub`](archetype_core::StreamHub) with deterministic
//! observations:
//! - family discovery and replay handling
//! - snapshot persistence and degraded loads
//! - task → epoch → global reward rollup
//! - loosely typed input through the boundary adapter
//! - stream isolation in the hub

mod helpers;
mod adapter_tests;
mod family_tests;
mod hub_tests;
mod persistence_tests;
mod reward_tests;
