//! Agreement result type.

use serde::{Deserialize, Serialize};

use crate::observation::NEUTRAL_SCORE;

/// Number of values in [`AgreementMetrics::to_block`].
pub const AGREEMENT_DIM: usize = 8;

/// Consensus and diversity statistics for one set of channel scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgreementMetrics {
    /// Mean pairwise agreement. Range: `[0, 1]`
    pub agreement: f32,
    /// Entropy of the score distribution normalized by `log2(k)`. Range: `[0, 1]`
    pub entropy: f32,
    /// Weighted blend of mean, agreement and priority-channel mean. Range: `[0, 1]`
    pub nexus: f32,
    /// `(1 - agreement) * entropy`. Range: `[0, 1]`
    pub multiplicity: f32,
    /// Mean score.
    pub mean: f32,
    /// Population standard deviation.
    pub std_dev: f32,
    /// Largest `|s_i - s_j|`.
    pub max_disagreement: f32,
    /// `max - mean`.
    pub dominance: f32,
}

impl AgreementMetrics {
    /// Result for fewer than two channels.
    ///
    /// `mean` is the single score when one channel is present, otherwise
    /// the neutral 0.5.
    pub fn neutral(single: Option<f32>) -> Self {
        let mean = single.unwrap_or(NEUTRAL_SCORE);
        Self {
            agreement: 1.0,
            entropy: 0.0,
            nexus: mean,
            multiplicity: 0.0,
            mean,
            std_dev: 0.0,
            max_disagreement: 0.0,
            dominance: 0.0,
        }
    }

    /// Fixed-order vector form used by the signature.
    pub fn to_block(&self) -> [f32; AGREEMENT_DIM] {
        [
            self.agreement,
            self.entropy,
            self.nexus,
            self.multiplicity,
            self.mean,
            self.std_dev,
            self.max_disagreement,
            self.dominance,
        ]
    }
}

impl Default for AgreementMetrics {
    fn default() -> Self {
        Self::neutral(None)
    }
}
