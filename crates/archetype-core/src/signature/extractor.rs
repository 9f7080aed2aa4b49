//! Observation to signature mapping.

use crate::agreement::{AgreementComputer, AgreementMetrics};
use crate::clustering::metric::normalize_in_place;
use crate::config::{AgreementConfig, SignatureConfig};
use crate::error::{ArchetypeError, ArchetypeResult};
use crate::observation::Observation;

use super::blocks;
use super::layout::SignatureLayout;
use super::vector::Signature;

/// Deterministic, infallible signature extraction.
///
/// # Example
///
/// ```
/// use archetype_core::observation::ObservationBuilder;
/// use archetype_core::signature::SignatureExtractor;
///
/// let extractor = SignatureExtractor::default();
/// let obs = ObservationBuilder::new("turn-1").channel("safety", 0.2, 0.8).build();
///
/// let signature = extractor.extract(&obs);
/// assert_eq!(signature.len(), extractor.dimension());
/// assert!(signature.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct SignatureExtractor {
    config: SignatureConfig,
    layout: SignatureLayout,
    agreement: AgreementComputer,
}

impl Default for SignatureExtractor {
    fn default() -> Self {
        Self::new(SignatureConfig::default(), AgreementConfig::default())
    }
}

impl SignatureExtractor {
    /// Create an extractor. The configuration is assumed valid; see
    /// [`try_new`](Self::try_new).
    pub fn new(config: SignatureConfig, agreement: AgreementConfig) -> Self {
        Self {
            layout: SignatureLayout::from_config(&config),
            agreement: AgreementComputer::new(agreement),
            config,
        }
    }

    /// Create an extractor after validating both configurations.
    pub fn try_new(config: SignatureConfig, agreement: AgreementConfig) -> ArchetypeResult<Self> {
        config
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("signature: {}", e)))?;
        agreement
            .validate()
            .map_err(|e| ArchetypeError::ConfigError(format!("agreement: {}", e)))?;
        Ok(Self::new(config, agreement))
    }

    /// Signature length `D`.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.layout.dimension()
    }

    /// Segment layout.
    pub fn layout(&self) -> &SignatureLayout {
        &self.layout
    }

    /// Get the configuration.
    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    /// Agreement statistics over the after-channels.
    pub fn agreement(&self, obs: &Observation) -> AgreementMetrics {
        self.agreement.compute(&obs.channels.after)
    }

    /// Map an observation to its signature.
    pub fn extract(&self, obs: &Observation) -> Signature {
        let config = &self.config;
        let mut values = Vec::with_capacity(self.dimension());

        values.extend(blocks::drive_block(config, obs));
        values.extend(blocks::channel_delta_block(config, obs));
        values.extend(blocks::final_state_block(config, obs));
        values.extend(blocks::dominant_channel_block(config, obs));
        values.extend(blocks::scalar_block(config, obs));
        if config.include_trajectory {
            values.extend(blocks::trajectory_block(config, obs));
        }
        values.extend(self.agreement(obs).to_block());

        if values.len() != self.dimension() {
            tracing::error!(
                expected = self.dimension(),
                actual = values.len(),
                "SIGNATURE: block sizes disagree with layout"
            );
            values.resize(self.dimension(), 0.0);
        }
        for v in values.iter_mut() {
            if !v.is_finite() {
                *v = 0.0;
            }
        }

        let normalized = config.normalize && normalize_in_place(&mut values);
        tracing::trace!(
            observation_id = %obs.id,
            dimension = values.len(),
            normalized,
            "SIGNATURE: extracted"
        );
        Signature::new(values, normalized)
    }
}
