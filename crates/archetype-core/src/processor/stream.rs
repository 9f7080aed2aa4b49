//! LearningStream - one turn pipeline over one stream of observations.

use chrono::{DateTime, Utc};

use crate::clustering::{Assignment, MaturityTier};
use crate::config::ArchetypeConfig;
use crate::error::{ArchetypeError, ArchetypeResult};
use crate::family::{FamilyRegistry, TransitionFamilies};
use crate::learning::{Guidance, PathwayLearner, PathwayUpdate, PreferenceLearner};
use crate::observation::Observation;
use crate::persistence::StreamStorage;
use crate::reward::{EpochResult, RewardOrchestrator};
use crate::signature::{Signature, SignatureExtractor};

/// Everything one turn produced.
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// Observation the turn processed.
    pub observation_id: String,
    /// Extracted signature.
    pub signature: Signature,
    /// Agreement nexus of the final channels, used as turn quality.
    pub quality: f32,
    /// Family assignment.
    pub family: Assignment,
    /// Maturity tier of the family after the turn.
    pub family_tier: MaturityTier,
    /// Transition family assignment.
    pub transition: Assignment,
    /// Pathway match and confidence update.
    pub pathway: PathwayUpdate,
    /// Whether the family's preference is mature after the turn.
    pub preference_mature: bool,
    /// Epoch consolidated by this turn, if the batch filled.
    pub epoch: Option<EpochResult>,
    /// Guidance for the assigned family, once mature.
    pub guidance: Option<Guidance>,
}

impl TurnReport {
    /// Whether the observation had been processed before.
    #[inline]
    pub fn is_replay(&self) -> bool {
        self.family.replayed
    }
}

/// Owns every learner for one stream and runs the turn pipeline.
///
/// ```text
/// Observation -> signature -> family -> transition family
///             -> preference + pathway -> task result -> (epoch -> global)
/// ```
///
/// # Example
///
/// ```
/// use archetype_core::config::ArchetypeConfig;
/// use archetype_core::observation::ObservationBuilder;
/// use archetype_core::processor::LearningStream;
///
/// let mut stream = LearningStream::new(ArchetypeConfig::default());
/// let obs = ObservationBuilder::new("turn-1")
///     .channel("safety", 0.2, 0.7)
///     .drive(0.5, 1.5)
///     .outcome(0.8)
///     .build();
///
/// let report = stream.process(&obs);
/// assert!(report.family.created);
/// assert_eq!(stream.families().len(), 1);
/// ```
#[derive(Debug)]
pub struct LearningStream {
    name: String,
    config: ArchetypeConfig,
    extractor: SignatureExtractor,
    families: FamilyRegistry,
    transitions: TransitionFamilies,
    preferences: PreferenceLearner,
    pathways: PathwayLearner,
    rewards: RewardOrchestrator,
    storage: Option<StreamStorage>,
    turn_count: u64,
    last_activity: DateTime<Utc>,
}

impl LearningStream {
    /// Create an in-memory stream without validating the configuration.
    pub fn new(config: ArchetypeConfig) -> Self {
        Self::named("default", config)
    }

    /// Create a named in-memory stream.
    pub fn named(name: impl Into<String>, config: ArchetypeConfig) -> Self {
        let extractor =
            SignatureExtractor::new(config.signature.clone(), config.agreement.clone());
        let layout = extractor.layout().clone();
        let channels = config.signature.channels.clone();
        let threshold = config.success_threshold;
        Self {
            name: name.into(),
            families: FamilyRegistry::new(config.families.clone(), layout.clone()),
            transitions: TransitionFamilies::new(config.transitions.clone(), layout),
            preferences: PreferenceLearner::new(config.preferences.clone(), threshold, channels),
            pathways: PathwayLearner::new(config.pathways.clone(), threshold),
            rewards: RewardOrchestrator::new(config.reward.clone(), threshold),
            extractor,
            config,
            storage: None,
            turn_count: 0,
            last_activity: Utc::now(),
        }
    }

    /// Create an in-memory stream, returning an error if the config is invalid.
    pub fn try_new(config: ArchetypeConfig) -> ArchetypeResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Open a persistent stream, resuming whatever snapshots exist.
    ///
    /// Missing snapshots start empty. Unreadable ones are logged and start
    /// empty too; only an invalid configuration is an error.
    pub fn open(
        name: impl Into<String>,
        config: ArchetypeConfig,
        storage: StreamStorage,
    ) -> ArchetypeResult<Self> {
        config.validate()?;
        let name = name.into();
        let extractor =
            SignatureExtractor::new(config.signature.clone(), config.agreement.clone());
        let layout = extractor.layout().clone();
        let dimension = extractor.dimension();
        let channels = config.signature.channels.clone();
        let threshold = config.success_threshold;

        let families =
            FamilyRegistry::load(config.families.clone(), layout.clone(), storage.families_path());
        let transitions = TransitionFamilies::load(
            config.transitions.clone(),
            layout,
            storage.transitions_path(),
        );
        let preferences = PreferenceLearner::load(
            config.preferences.clone(),
            threshold,
            channels,
            storage.preferences_path(),
        );
        let pathways = PathwayLearner::load(
            config.pathways.clone(),
            threshold,
            storage.pathways_path(),
            dimension,
        );
        let rewards = RewardOrchestrator::with_ledger(
            config.reward.clone(),
            threshold,
            storage.rewards_path(),
        );

        tracing::info!(
            stream = %name,
            dir = %storage.dir().display(),
            families = families.len(),
            transitions = transitions.len(),
            pathways = pathways.len(),
            preferences = preferences.len(),
            epochs = rewards.global().epochs_completed,
            "LEARNING_STREAM: opened"
        );

        Ok(Self {
            name,
            config,
            extractor,
            families,
            transitions,
            preferences,
            pathways,
            rewards,
            storage: Some(storage),
            turn_count: 0,
            last_activity: Utc::now(),
        })
    }

    /// Run one turn.
    ///
    /// Never fails: malformed input was already neutralized by the adapter
    /// and persistence failures are logged. A replayed observation id is
    /// reported with its existing assignments and feeds no learner.
    pub fn process(&mut self, obs: &Observation) -> TurnReport {
        let now = obs.timestamp;
        let signature = self.extractor.extract(obs);
        let quality = self.extractor.agreement(obs).nexus;

        let family = self
            .families
            .assign_at(&obs.id, &signature, obs.outcome, now);
        let transition = self
            .transitions
            .assign_at(&obs.id, &signature, obs.outcome, now);
        let pathway = self.pathways.observe_at(&obs.id, &signature, obs, now);
        let family_tier = self.families.tier(family.cluster_id).unwrap_or_default();

        let (preference_mature, epoch) = if family.replayed {
            tracing::debug!(
                stream = %self.name,
                observation_id = %obs.id,
                family_id = family.cluster_id,
                "LEARNING_STREAM: replayed observation, learners skipped"
            );
            let mature = self
                .preferences
                .get(family.cluster_id)
                .map_or(false, |p| p.mature);
            (mature, None)
        } else {
            let mature = self
                .preferences
                .observe_at(family.cluster_id, family_tier, obs, quality, now)
                .map_or(false, |p| p.mature);
            let epoch = self.rewards.record_outcome(
                &obs.id,
                obs.outcome,
                Some(family.cluster_id),
                pathway.confidence,
                quality,
            );
            self.turn_count += 1;
            (mature, epoch)
        };
        self.last_activity = Utc::now();

        tracing::debug!(
            stream = %self.name,
            observation_id = %obs.id,
            family_id = family.cluster_id,
            family_distance = family.distance,
            transition_id = transition.cluster_id,
            pathway_id = pathway.assignment.cluster_id,
            confidence = pathway.confidence,
            quality,
            "LEARNING_STREAM: processed turn"
        );

        if !family.replayed && self.config.storage.persist_every_turn {
            self.persist_logged();
        }

        TurnReport {
            observation_id: obs.id.clone(),
            guidance: self.preferences.guidance(family.cluster_id),
            signature,
            quality,
            family,
            family_tier,
            transition,
            pathway,
            preference_mature,
            epoch,
        }
    }

    /// Guidance for a family, `None` until its preference is mature.
    pub fn guidance(&self, family_id: u64) -> Option<Guidance> {
        self.preferences.guidance(family_id)
    }

    /// Guidance for the family an observation was assigned to.
    pub fn guidance_for(&self, observation_id: &str) -> Option<Guidance> {
        self.families
            .family_of(observation_id)
            .and_then(|id| self.preferences.guidance(id))
    }

    /// Write every snapshot. A no-op for in-memory streams.
    ///
    /// All snapshots are attempted; the first failure is returned.
    pub fn persist(&self) -> ArchetypeResult<()> {
        let storage = match &self.storage {
            Some(storage) => storage,
            None => return Ok(()),
        };
        let results = [
            self.families.save(storage.families_path()),
            self.transitions.save(storage.transitions_path()),
            self.pathways.save(storage.pathways_path()),
            self.preferences.save(storage.preferences_path()),
            self.rewards.save(storage.rewards_path()),
        ];
        let mut first: Option<ArchetypeError> = None;
        for result in results {
            if let Err(e) = result {
                tracing::error!(
                    stream = %self.name,
                    error = %e,
                    "LEARNING_STREAM: snapshot write failed"
                );
                first.get_or_insert(e);
            }
        }
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn persist_logged(&self) {
        // Errors were already logged per snapshot.
        let _ = self.persist();
    }

    /// Stream name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the configuration.
    pub fn config(&self) -> &ArchetypeConfig {
        &self.config
    }

    /// Signature extractor.
    pub fn extractor(&self) -> &SignatureExtractor {
        &self.extractor
    }

    /// Family registry.
    pub fn families(&self) -> &FamilyRegistry {
        &self.families
    }

    /// Transition families.
    pub fn transitions(&self) -> &TransitionFamilies {
        &self.transitions
    }

    /// Preference learner.
    pub fn preferences(&self) -> &PreferenceLearner {
        &self.preferences
    }

    /// Pathway learner.
    pub fn pathways(&self) -> &PathwayLearner {
        &self.pathways
    }

    /// Reward orchestrator.
    pub fn rewards(&self) -> &RewardOrchestrator {
        &self.rewards
    }

    /// Snapshot locations, if persistent.
    pub fn storage(&self) -> Option<&StreamStorage> {
        self.storage.as_ref()
    }

    /// Non-replayed turns processed since construction.
    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    /// Time of the last processed turn.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }
}
