//! Global level: persistent EMA confidence and compound growth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clustering::ema;

use super::epoch::EpochResult;

/// Long-running reward state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalState {
    /// Epochs consolidated so far.
    pub epochs_completed: u64,
    /// Tasks across all consolidated epochs.
    pub total_tasks: u64,
    /// Successful tasks across all consolidated epochs.
    pub total_successes: u64,
    /// EMA of epoch rewards; `None` only before the first epoch.
    pub global_confidence: Option<f32>,
    /// Compound growth per epoch, `None` until two epochs exist.
    pub growth_rate: Option<f32>,
    /// Every epoch reward in order.
    pub reward_history: Vec<f32>,
    /// Last update.
    pub last_updated: DateTime<Utc>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            epochs_completed: 0,
            total_tasks: 0,
            total_successes: 0,
            global_confidence: None,
            growth_rate: None,
            reward_history: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

impl GlobalState {
    /// Fold one epoch in.
    ///
    /// The first epoch seeds the confidence directly; later ones blend with
    /// `alpha`.
    pub fn absorb(&mut self, epoch: &EpochResult, alpha: f32) {
        self.epochs_completed += 1;
        self.total_tasks += epoch.task_count as u64;
        self.total_successes += epoch.success_count as u64;
        self.global_confidence = Some(match self.global_confidence {
            None => epoch.reward,
            Some(current) => ema(current, epoch.reward, alpha),
        });
        self.reward_history.push(epoch.reward);
        if let Some(growth) = compound_growth(&self.reward_history) {
            self.growth_rate = Some(growth);
        } else if self.reward_history.first().map_or(false, |first| *first <= 0.0) {
            tracing::debug!("REWARD: first epoch reward not positive, growth rate frozen");
        }
        self.last_updated = epoch.completed_at;
    }

    /// Overall success rate across consolidated epochs.
    pub fn success_rate(&self) -> Option<f32> {
        (self.total_tasks > 0).then(|| self.total_successes as f32 / self.total_tasks as f32)
    }
}

/// Compound growth rate `(last / first)^(1 / (n - 1)) - 1` over a reward
/// history of `n` epochs.
///
/// `None` with fewer than two epochs or when the first reward is not
/// positive.
///
/// ```
/// use archetype_core::reward::compound_growth;
///
/// let growth = compound_growth(&[0.5, 0.6, 0.72]).unwrap();
/// assert!((growth - 0.2).abs() < 1e-5);
/// assert!(compound_growth(&[0.5]).is_none());
/// assert!(compound_growth(&[0.0, 0.5]).is_none());
/// ```
pub fn compound_growth(history: &[f32]) -> Option<f32> {
    let (first, last) = match (history.first(), history.last()) {
        (Some(first), Some(last)) if history.len() >= 2 => (*first as f64, *last as f64),
        _ => return None,
    };
    if !(first > 0.0) {
        return None;
    }
    let periods = (history.len() - 1) as f64;
    let growth = (last.max(0.0) / first).powf(1.0 / periods) - 1.0;
    growth.is_finite().then_some(growth as f32)
}
