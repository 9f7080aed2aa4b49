//! Online family discovery and fractal reward learning.
//!
//! Each interaction arrives as an [`Observation`]: a before/after snapshot
//! of per-channel scores plus drive, satisfaction, urgency and optional
//! trajectory. The crate turns it into a fixed-length signature, clusters
//! signatures into *families* with no predefined categories, learns which
//! channels matter to each family, and rolls outcomes up task → epoch →
//! global.
//!
//! # Modules
//!
//! - [`config`]: configuration types for every subsystem
//! - [`error`]: error types and result aliases
//! - [`observation`]: the observation model and the boundary adapter
//! - [`agreement`]: cross-channel agreement, entropy and nexus metrics
//! - [`signature`]: signature layout and extraction
//! - [`clustering`]: generic online centroid clustering
//! - [`family`]: family registry and transition families
//! - [`learning`]: preference and pathway learners, guidance output
//! - [`reward`]: task / epoch / global reward rollup
//! - [`persistence`]: atomic JSON snapshots
//! - [`processor`]: the per-turn pipeline and the multi-stream hub
//!
//! # Example
//!
//! ```
//! use archetype_core::{ArchetypeConfig, LearningStream, ObservationBuilder};
//!
//! let mut stream = LearningStream::new(ArchetypeConfig::default());
//! for i in 0..3 {
//!     let obs = ObservationBuilder::new(format!("turn-{}", i))
//!         .channel("safety", 0.3, 0.8)
//!         .channel("trust", 0.4, 0.5)
//!         .drive(3.0, 1.0)
//!         .outcome(0.9)
//!         .build();
//!     stream.process(&obs);
//! }
//!
//! let family = stream.families().families()[0].id;
//! let guidance = stream.guidance(family).expect("established family");
//! assert_eq!(guidance.ranked_channels()[0].0, "safety");
//! ```

pub mod agreement;
pub mod clustering;
pub mod config;
pub mod error;
pub mod family;
pub mod learning;
pub mod observation;
pub mod persistence;
pub mod processor;
pub mod reward;
pub mod signature;

pub use config::ArchetypeConfig;
pub use error::{ArchetypeError, ArchetypeResult};

// Re-export the turn-level types for convenience
pub use clustering::{Assignment, DistanceMetric, MaturityTier};
pub use family::{Family, FamilyRegistry};
pub use learning::{Guidance, PathwayLearner, PreferenceLearner};
pub use observation::{Observation, ObservationBuilder, RawObservation};
pub use processor::{LearningStream, SharedStream, StreamHub, TurnReport};
pub use reward::{EpochResult, GlobalState, RewardOrchestrator, TaskResult};
pub use signature::{Signature, SignatureExtractor};
