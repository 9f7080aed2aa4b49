//! Archetype error types.
//!
//! Almost nothing in the turn pipeline is allowed to fail: malformed input
//! resolves to neutral defaults and degenerate numerics to guarded values.
//! These errors surface only from construction with an invalid
//! configuration and from explicit persistence calls.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the archetype learning core.
#[derive(Debug, Error)]
pub enum ArchetypeError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Vector dimension mismatch
    #[error("Signature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Filesystem failure while reading or writing a snapshot
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Snapshot content is structurally invalid
    #[error("Corrupt snapshot {path}: {reason}")]
    CorruptSnapshot {
        /// Snapshot path
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {value}. {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Parameter value as string
        value: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type for archetype operations.
pub type ArchetypeResult<T> = Result<T, ArchetypeError>;

impl From<serde_json::Error> for ArchetypeError {
    fn from(err: serde_json::Error) -> Self {
        ArchetypeError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for ArchetypeError {
    fn from(err: toml::de::Error) -> Self {
        ArchetypeError::ConfigError(err.to_string())
    }
}

impl From<config::ConfigError> for ArchetypeError {
    fn from(err: config::ConfigError) -> Self {
        ArchetypeError::ConfigError(err.to_string())
    }
}

impl ArchetypeError {
    /// Create an I/O error bound to the path that failed.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchetypeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a corrupt snapshot error.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ArchetypeError::CorruptSnapshot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_param(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        ArchetypeError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if the caller can keep going with fresh state.
    ///
    /// Storage and snapshot failures only cost the latest increment; a bad
    /// configuration does not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ArchetypeError::Io { .. }
                | ArchetypeError::SerializationError(_)
                | ArchetypeError::CorruptSnapshot { .. }
                | ArchetypeError::DimensionMismatch { .. }
        )
    }
}
