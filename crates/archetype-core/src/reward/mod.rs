//! Fractal reward rollup.
//!
//! Three nested levels, evaluated eagerly:
//!
//! 1. [`TaskResult`]: one per turn, appended to the current batch
//! 2. [`EpochResult`]: aggregate of a full batch of `epoch_size` tasks
//! 3. [`GlobalState`]: EMA over epoch rewards plus a compound growth rate
//!
//! Epoch and global state persist in a [`RewardLedger`] after every
//! consolidation.

mod epoch;
mod global;
mod orchestrator;
mod task;


pub use self::epoch::EpochResult;
pub use self::global::{compound_growth, GlobalState};
pub use self::orchestrator::{RewardLedger, RewardOrchestrator, LEDGER_VERSION};
pub use self::task::TaskResult;
