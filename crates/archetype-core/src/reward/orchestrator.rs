//! Task → epoch → global rollup.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::RewardConfig;
use crate::error::{ArchetypeError, ArchetypeResult};
use crate::persistence::{read_json, write_json_atomic};

use super::epoch::EpochResult;
use super::global::GlobalState;
use super::task::TaskResult;

/// Reward ledger format version.
pub const LEDGER_VERSION: u32 = 1;

/// Persisted epoch and global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardLedger {
    /// Ledger format version.
    pub version: u32,
    /// Most recent epoch results, oldest first, capped.
    pub epochs: VecDeque<EpochResult>,
    /// Global state.
    pub global: GlobalState,
}

impl Default for RewardLedger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            epochs: VecDeque::new(),
            global: GlobalState::default(),
        }
    }
}

/// Rolls per-turn results into epochs and a global confidence.
///
/// # Example
///
/// ```
/// use archetype_core::config::RewardConfig;
/// use archetype_core::reward::{RewardOrchestrator, TaskResult};
///
/// let config = RewardConfig { epoch_size: 2, ..Default::default() };
/// let mut orchestrator = RewardOrchestrator::new(config, 0.6);
///
/// assert!(orchestrator
///     .record_task(TaskResult::from_outcome("a", 0.9, 0.6, Some(1), 0.5, 0.5))
///     .is_none());
/// let epoch = orchestrator
///     .record_task(TaskResult::from_outcome("b", 0.1, 0.6, Some(1), 0.5, 0.5))
///     .unwrap();
///
/// assert_eq!(epoch.success_count, 1);
/// assert_eq!(orchestrator.global().global_confidence, Some(epoch.reward));
/// ```
#[derive(Debug, Clone)]
pub struct RewardOrchestrator {
    config: RewardConfig,
    success_threshold: f32,
    batch: Vec<TaskResult>,
    ledger: RewardLedger,
    path: Option<PathBuf>,
}

impl RewardOrchestrator {
    /// Create an in-memory orchestrator.
    pub fn new(config: RewardConfig, success_threshold: f32) -> Self {
        Self {
            batch: Vec::with_capacity(config.epoch_size),
            config,
            success_threshold,
            ledger: RewardLedger::default(),
            path: None,
        }
    }

    /// Create an orchestrator after validating the configuration.
    pub fn try_new(config: RewardConfig, success_threshold: f32) -> ArchetypeResult<Self> {
        config
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("reward: {}", e)))?;
        Ok(Self::new(config, success_threshold))
    }

    /// Create an orchestrator persisting its ledger at `path`.
    ///
    /// An existing ledger is resumed; a missing or unreadable one starts
    /// fresh. The in-progress batch is never persisted.
    pub fn with_ledger(config: RewardConfig, success_threshold: f32, path: &Path) -> Self {
        let mut orchestrator = Self::new(config, success_threshold);
        match Self::read_ledger(path) {
            Ok(Some(ledger)) => {
                tracing::info!(
                    path = %path.display(),
                    epochs = ledger.global.epochs_completed,
                    "REWARD: resumed ledger"
                );
                orchestrator.ledger = ledger;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "REWARD: unreadable ledger, starting fresh"
                );
            }
        }
        orchestrator.path = Some(path.to_path_buf());
        orchestrator
    }

    /// Read a ledger; `Ok(None)` when none exists.
    pub fn read_ledger(path: &Path) -> ArchetypeResult<Option<RewardLedger>> {
        let ledger: RewardLedger = match read_json(path)? {
            Some(ledger) => ledger,
            None => return Ok(None),
        };
        if ledger.version > LEDGER_VERSION {
            return Err(ArchetypeError::corrupt(
                path,
                format!("unsupported ledger version {}", ledger.version),
            ));
        }
        Ok(Some(ledger))
    }

    /// Build and record a task result from a turn outcome.
    pub fn record_outcome(
        &mut self,
        observation_id: &str,
        outcome: f32,
        family_id: Option<u64>,
        confidence: f32,
        quality: f32,
    ) -> Option<EpochResult> {
        let task = TaskResult::from_outcome(
            observation_id,
            outcome,
            self.success_threshold,
            family_id,
            confidence,
            quality,
        );
        self.record_task(task)
    }

    /// Append a task result; consolidates when the batch is full.
    pub fn record_task(&mut self, task: TaskResult) -> Option<EpochResult> {
        self.batch.push(task);
        self.consolidate_epoch()
    }

    /// Consolidate the current batch if it has reached `epoch_size`.
    ///
    /// Updates the global state and persists the ledger. Returns the new
    /// epoch, or `None` while the batch is still filling.
    pub fn consolidate_epoch(&mut self) -> Option<EpochResult> {
        if self.batch.len() < self.config.epoch_size {
            return None;
        }
        let index = self.ledger.global.epochs_completed;
        let epoch = EpochResult::from_tasks(index, &self.batch, &self.config)?;
        self.batch.clear();

        tracing::info!(
            epoch = epoch.epoch_index,
            success_rate = epoch.success_rate,
            reward = epoch.reward,
            distinct_families = epoch.distinct_families,
            "REWARD: consolidated epoch"
        );

        self.update_global(&epoch);
        self.ledger.epochs.push_back(epoch.clone());
        while self.ledger.epochs.len() > self.config.epoch_history_cap {
            self.ledger.epochs.pop_front();
        }
        self.persist();
        Some(epoch)
    }

    /// Fold an epoch into the global state.
    pub fn update_global(&mut self, epoch: &EpochResult) {
        self.ledger.global.absorb(epoch, self.config.global_alpha);
        tracing::debug!(
            global_confidence = ?self.ledger.global.global_confidence,
            growth_rate = ?self.ledger.global.growth_rate,
            "REWARD: updated global state"
        );
    }

    /// Write the ledger if a path is configured. Failures are logged.
    pub fn persist(&self) {
        if let Some(path) = &self.path {
            if let Err(e) = self.save(path) {
                tracing::error!(
                    error = %e,
                    path = %path.display(),
                    "REWARD: Failed to persist ledger"
                );
            }
        }
    }

    /// Write the ledger atomically to `path`.
    pub fn save(&self, path: &Path) -> ArchetypeResult<()> {
        write_json_atomic(path, &self.ledger)
    }

    /// Global state.
    pub fn global(&self) -> &GlobalState {
        &self.ledger.global
    }

    /// Retained epoch results, oldest first.
    pub fn epochs(&self) -> &VecDeque<EpochResult> {
        &self.ledger.epochs
    }

    /// Full ledger.
    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    /// Tasks waiting for the current epoch to fill.
    pub fn pending(&self) -> &[TaskResult] {
        &self.batch
    }

    /// Get the configuration.
    pub fn config(&self) -> &RewardConfig {
        &self.config
    }
}
