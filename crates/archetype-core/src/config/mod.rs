//! Archetype configuration types.
//!
//! Every tunable constant of the learning core lives here: amplification
//! factors, maturity thresholds, EMA rates, success thresholds and the
//! clustering metric. Components are constructed from these structs, never
//! from inline literals, so historical threshold adjustments stay auditable
//! and reversible in one place.
//!
//! # Loading
//!
//! ```
//! use archetype_core::config::ArchetypeConfig;
//!
//! let config = ArchetypeConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.signature.channels.len(), 12);
//! ```

mod agreement;
mod clustering;
mod learning;
mod reward;
mod signature;
mod storage;


pub use self::agreement::AgreementConfig;
pub use self::clustering::{ClusteringConfig, MaturityConfig};
pub use self::learning::{PathwayConfig, PreferenceConfig};
pub use self::reward::RewardConfig;
pub use self::signature::{SignatureConfig, DEFAULT_CHANNELS, DEFAULT_STATES};
pub use self::storage::StorageConfig;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clustering::{DistanceMetric, ThresholdPolicy};
use crate::error::{ArchetypeError, ArchetypeResult};

/// Environment variable prefix for layered configuration overrides.
pub const ENV_PREFIX: &str = "ARCHETYPE";

/// Main configuration containing all subsystem settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    /// Outcome at or above which a turn counts as a success.
    /// Range: `[0.0, 1.0]`
    #[serde(default = "default_success_threshold")]
    pub success_threshold: f32,

    /// Agreement computer settings.
    #[serde(default)]
    pub agreement: AgreementConfig,

    /// Signature extraction settings.
    #[serde(default)]
    pub signature: SignatureConfig,

    /// Family registry clustering settings.
    #[serde(default = "ClusteringConfig::families")]
    pub families: ClusteringConfig,

    /// Transition family clustering settings (drive + channel-delta projection).
    #[serde(default = "ClusteringConfig::transitions")]
    pub transitions: ClusteringConfig,

    /// Per-family preference learning settings.
    #[serde(default)]
    pub preferences: PreferenceConfig,

    /// Pathway confidence learning settings.
    #[serde(default)]
    pub pathways: PathwayConfig,

    /// Reward rollup settings.
    #[serde(default)]
    pub reward: RewardConfig,

    /// Snapshot storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_success_threshold() -> f32 {
    0.6
}

impl Default for ArchetypeConfig {
    fn default() -> Self {
        Self {
            success_threshold: default_success_threshold(),
            agreement: AgreementConfig::default(),
            signature: SignatureConfig::default(),
            families: ClusteringConfig::families(),
            transitions: ClusteringConfig::transitions(),
            preferences: PreferenceConfig::default(),
            pathways: PathwayConfig::default(),
            reward: RewardConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl ArchetypeConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset that keeps more families apart early on.
    ///
    /// Tightens the family threshold and widens the exploration window so
    /// that distinct archetypes are not absorbed before they are seen twice.
    pub fn exploration_preset() -> Self {
        let mut config = Self::default();
        config.families.threshold = ThresholdPolicy {
            base: 1.2,
            exploration_below: 8,
            exploration_factor: 0.7,
            ..config.families.threshold
        };
        config
    }

    /// Preset that merges aggressively once a population exists.
    pub fn consolidation_preset() -> Self {
        let mut config = Self::default();
        config.families.threshold = ThresholdPolicy {
            base: 2.0,
            consolidation_above: 20,
            consolidation_factor: 1.75,
            ..config.families.threshold
        };
        config
    }

    /// Unit-normalized signatures clustered by cosine distance.
    ///
    /// Kept for compatibility with snapshots produced under the cosine
    /// regime. Raw vectors with Euclidean distance remain the default
    /// because normalization discards the magnitude clustering relies on.
    pub fn cosine_compat_preset() -> Self {
        let mut config = Self::default();
        config.signature.normalize = true;
        for clustering in [
            &mut config.families,
            &mut config.transitions,
            &mut config.pathways.clustering,
        ] {
            clustering.metric = DistanceMetric::Cosine;
            clustering.threshold.base = 0.15;
        }
        config
    }

    /// Load configuration from a TOML file and validate it.
    pub fn from_file(path: &Path) -> ArchetypeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArchetypeError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: ArchetypeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load layered configuration.
    ///
    /// Sources, later overriding earlier:
    /// 1. built-in defaults
    /// 2. `config/archetype.toml` (optional)
    /// 3. environment variables with the `ARCHETYPE__` prefix, e.g.
    ///    `ARCHETYPE__REWARD__EPOCH_SIZE=20`
    pub fn load() -> ArchetypeResult<Self> {
        let defaults = config::Config::try_from(&Self::default())?;
        let builder = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config/archetype").required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: ArchetypeConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every subsystem configuration.
    pub fn validate(&self) -> ArchetypeResult<()> {
        if !(0.0..=1.0).contains(&self.success_threshold) {
            return Err(ArchetypeError::ConfigError(format!(
                "success_threshold must be in [0, 1], got {}",
                self.success_threshold
            )));
        }
        self.agreement
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("agreement: {}", e)))?;
        self.signature
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("signature: {}", e)))?;
        self.families
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("families: {}", e)))?;
        self.transitions
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("transitions: {}", e)))?;
        self.preferences
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("preferences: {}", e)))?;
        self.pathways
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("pathways: {}", e)))?;
        self.reward
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("reward: {}", e)))?;
        self.storage
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("storage: {}", e)))?;

        if self.signature.normalize && self.families.metric == DistanceMetric::Euclidean {
            tracing::warn!(
                "CONFIG: normalized signatures under Euclidean distance discard magnitude"
            );
        }
        Ok(())
    }
}
