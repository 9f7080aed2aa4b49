//! Agreement statistics across channel scores.
//!
//! Channels are scored independently upstream; how much they agree is
//! itself a feature. For `k` channel scores `s_1..s_k` in `[0, 1]`:
//!
//! ```text
//! A            = mean over i<j of (1 - |s_i - s_j|)
//! H            = Shannon(p) / log2(k),  p_i = s_i / sum(s)
//! nexus        = w_m * mean + w_a * A + w_p * mean(priority channels)
//! multiplicity = (1 - A) * H
//! ```
//!
//! plus mean, population standard deviation, maximum pairwise disagreement
//! and dominance (`max - mean`). With fewer than two channels the result is
//! [`AgreementMetrics::neutral`].

mod computer;
mod metrics;

pub use self::computer::{normalized_entropy, pairwise_agreement, AgreementComputer};
pub use self::metrics::{AgreementMetrics, AGREEMENT_DIM};
