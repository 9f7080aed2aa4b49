//! Turn processing.
//!
//! [`LearningStream`] runs the whole per-turn pipeline for one stream:
//! signature extraction, family and transition family assignment,
//! preference and pathway learning, then the reward rollup. It is
//! single-threaded; [`StreamHub`] shares streams across callers behind a
//! per-stream mutex so each turn's read-modify-write runs atomically.

mod hub;
mod stream;


pub use self::hub::{SharedStream, StreamHub};
pub use self::stream::{LearningStream, TurnReport};
