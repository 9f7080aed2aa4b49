//! Snapshot storage settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Snapshot storage settings.
///
/// When `root` is `None` a stream keeps its state in memory only.
/// Otherwise each stream persists under `root/<stream name>/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for stream snapshots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Family registry snapshot file name.
    pub families_file: String,

    /// Transition family snapshot file name.
    pub transitions_file: String,

    /// Pathway learner snapshot file name.
    pub pathways_file: String,

    /// Preference learner snapshot file name.
    pub preferences_file: String,

    /// Reward ledger file name.
    pub rewards_file: String,

    /// Persist clustering snapshots after every turn. The reward ledger is
    /// always persisted on consolidation.
    pub persist_every_turn: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            families_file: "families.json".to_string(),
            transitions_file: "transitions.json".to_string(),
            pathways_file: "pathways.json".to_string(),
            preferences_file: "preferences.json".to_string(),
            rewards_file: "rewards.json".to_string(),
            persist_every_turn: true,
        }
    }
}

impl StorageConfig {
    /// Validate the storage configuration.
    pub fn validate(&self) -> Result<(), String> {
        let names = [
            &self.families_file,
            &self.transitions_file,
            &self.pathways_file,
            &self.preferences_file,
            &self.rewards_file,
        ];
        for name in names {
            if name.is_empty() {
                return Err("snapshot file names must not be empty".to_string());
            }
            if name.contains('/') || name.contains('\\') {
                return Err(format!("snapshot file name '{}' must not contain a path", name));
            }
        }
        let unique: std::collections::HashSet<_> = names.iter().collect();
        if unique.len() != names.len() {
            return Err("snapshot file names must be distinct".to_string());
        }
        Ok(())
    }
}
