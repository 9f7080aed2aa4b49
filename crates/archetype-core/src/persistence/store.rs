//! Per-stream snapshot locations.

use std::path::{Path, PathBuf};

use crate::config::StorageConfig;

/// Longest stream directory name kept after sanitizing.
pub const MAX_STREAM_NAME_LEN: usize = 128;

/// Snapshot file locations for one learning stream.
///
/// ```
/// use std::path::Path;
/// use archetype_core::config::StorageConfig;
/// use archetype_core::persistence::StreamStorage;
///
/// let root = Path::new("/var/lib/archetype");
/// let storage = StreamStorage::new(root, "user/42", &StorageConfig::default());
/// assert_eq!(storage.families_path(), Path::new("/var/lib/archetype/user_42/families.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamStorage {
    dir: PathBuf,
    families: PathBuf,
    transitions: PathBuf,
    pathways: PathBuf,
    preferences: PathBuf,
    rewards: PathBuf,
}

impl StreamStorage {
    /// Locate a stream's snapshots under `root/<sanitized stream name>/`.
    pub fn new(root: &Path, stream: &str, config: &StorageConfig) -> Self {
        Self::in_dir(root.join(sanitize_stream_name(stream)), config)
    }

    /// Locate snapshots directly in `dir`.
    pub fn in_dir(dir: PathBuf, config: &StorageConfig) -> Self {
        Self {
            families: dir.join(&config.families_file),
            transitions: dir.join(&config.transitions_file),
            pathways: dir.join(&config.pathways_file),
            preferences: dir.join(&config.preferences_file),
            rewards: dir.join(&config.rewards_file),
            dir,
        }
    }

    /// Stream directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Family registry snapshot.
    pub fn families_path(&self) -> &Path {
        &self.families
    }

    /// Transition family snapshot.
    pub fn transitions_path(&self) -> &Path {
        &self.transitions
    }

    /// Pathway learner snapshot.
    pub fn pathways_path(&self) -> &Path {
        &self.pathways
    }

    /// Preference learner snapshot.
    pub fn preferences_path(&self) -> &Path {
        &self.preferences
    }

    /// Reward ledger.
    pub fn rewards_path(&self) -> &Path {
        &self.rewards
    }
}

/// Reduce a stream name to a safe single path component.
///
/// Characters other than alphanumerics, `-` and `_` become `_`; an empty
/// result becomes `default`.
pub fn sanitize_stream_name(stream: &str) -> String {
    let safe: String = stream
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STREAM_NAME_LEN)
        .collect();
    if safe.is_empty() {
        "default".to_string()
    } else {
        safe
    }
}
