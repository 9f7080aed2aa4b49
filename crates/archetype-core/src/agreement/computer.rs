//! Agreement computation.

use crate::config::AgreementConfig;
use crate::observation::ChannelScores;

use super::metrics::AgreementMetrics;

/// Computes [`AgreementMetrics`] for a channel score map.
///
/// Pure: the same input always yields bit-identical output. Scores are
/// visited in key order and accumulated in `f64`.
///
/// # Example
///
/// ```
/// use archetype_core::agreement::AgreementComputer;
/// use archetype_core::observation::ChannelScores;
///
/// let computer = AgreementComputer::default();
/// let scores: ChannelScores = [("safety".to_string(), 0.8), ("trust".to_string(), 0.8)]
///     .into_iter()
///     .collect();
///
/// let metrics = computer.compute(&scores);
/// assert_eq!(metrics.agreement, 1.0);
/// assert!((metrics.entropy - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AgreementComputer {
    config: AgreementConfig,
}

impl AgreementComputer {
    /// Create a computer with the given configuration.
    pub fn new(config: AgreementConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &AgreementConfig {
        &self.config
    }

    /// Compute agreement statistics.
    pub fn compute(&self, scores: &ChannelScores) -> AgreementMetrics {
        let values: Vec<f64> = scores
            .values()
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0) as f64)
            .collect();

        if values.len() < 2 {
            return AgreementMetrics::neutral(values.first().map(|v| *v as f32));
        }

        let k = values.len() as f64;
        let mean = values.iter().sum::<f64>() / k;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / k;
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        let min = values.iter().cloned().fold(f64::MAX, f64::min);

        let agreement = pairwise_agreement_f64(&values);
        let entropy = normalized_entropy_f64(&values);

        let priority: Vec<f64> = self
            .config
            .priority_channels
            .iter()
            .filter_map(|name| scores.get(name))
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0) as f64)
            .collect();
        let priority_mean = if priority.is_empty() {
            mean
        } else {
            priority.iter().sum::<f64>() / priority.len() as f64
        };

        let nexus = self.config.mean_weight as f64 * mean
            + self.config.agreement_weight as f64 * agreement
            + self.config.priority_weight as f64 * priority_mean;

        AgreementMetrics {
            agreement: unit(agreement),
            entropy: unit(entropy),
            nexus: unit(nexus),
            multiplicity: unit((1.0 - agreement) * entropy),
            mean: unit(mean),
            std_dev: unit(variance.sqrt()),
            max_disagreement: unit(max - min),
            dominance: unit(max - mean),
        }
    }
}

/// Mean over all unordered pairs of `1 - |a - b|`; 1.0 for fewer than two scores.
pub fn pairwise_agreement(scores: &[f32]) -> f32 {
    let values: Vec<f64> = scores.iter().map(|v| *v as f64).collect();
    unit(pairwise_agreement_f64(&values))
}

/// Shannon entropy of the renormalized scores divided by `log2(k)`.
///
/// Returns 0.0 for fewer than two scores and 1.0 (uniform) when the
/// scores sum to zero.
pub fn normalized_entropy(scores: &[f32]) -> f32 {
    let values: Vec<f64> = scores.iter().map(|v| *v as f64).collect();
    unit(normalized_entropy_f64(&values))
}

fn pairwise_agreement_f64(values: &[f64]) -> f64 {
    let k = values.len();
    if k < 2 {
        return 1.0;
    }
    let mut total = 0.0f64;
    for i in 0..k {
        for j in (i + 1)..k {
            total += 1.0 - (values[i] - values[j]).abs();
        }
    }
    total / (k * (k - 1) / 2) as f64
}

fn normalized_entropy_f64(values: &[f64]) -> f64 {
    let k = values.len();
    if k < 2 {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|v| v.max(0.0)).sum();
    if sum <= f64::EPSILON {
        return 1.0;
    }
    let shannon: f64 = values
        .iter()
        .map(|v| v.max(0.0) / sum)
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.log2())
        .sum();
    shannon / (k as f64).log2()
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
fn unit(value: f64) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0) as f32
    } else {
        0.0
    }
}
