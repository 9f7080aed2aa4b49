//! Monotonic maturity tiers.
//!
//! ```text
//! Nascent (count < M1) -> Established (M1 <= count < M2) -> Mature (count >= M2)
//! ```
//!
//! A tier never moves backwards, even if the member list is later trimmed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::MaturityConfig;

/// Maturity tier of a cluster.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MaturityTier {
    /// Too few members for its statistics to be trusted.
    #[default]
    Nascent,
    /// Enough members to expose guidance.
    Established,
    /// Stable archetype.
    Mature,
}

impl MaturityTier {
    /// Tier implied by a member count.
    ///
    /// # Example
    ///
    /// ```
    /// use archetype_core::clustering::MaturityTier;
    /// use archetype_core::config::MaturityConfig;
    ///
    /// let config = MaturityConfig::default();
    /// assert_eq!(MaturityTier::from_count(2, &config), MaturityTier::Nascent);
    /// assert_eq!(MaturityTier::from_count(3, &config), MaturityTier::Established);
    /// assert_eq!(MaturityTier::from_count(10, &config), MaturityTier::Mature);
    /// ```
    pub fn from_count(count: usize, config: &MaturityConfig) -> Self {
        if count >= config.mature_at {
            MaturityTier::Mature
        } else if count >= config.established_at {
            MaturityTier::Established
        } else {
            MaturityTier::Nascent
        }
    }

    /// Advance toward the tier implied by `count`, never backwards.
    ///
    /// Returns `Some((from, to))` when the tier changed.
    pub fn advance(
        &mut self,
        count: usize,
        config: &MaturityConfig,
    ) -> Option<(MaturityTier, MaturityTier)> {
        let implied = Self::from_count(count, config);
        if implied > *self {
            let from = *self;
            *self = implied;
            Some((from, implied))
        } else {
            None
        }
    }

    /// Whether statistics at this tier are trusted for guidance.
    #[inline]
    pub fn is_trusted(&self) -> bool {
        *self >= MaturityTier::Established
    }
}

impl fmt::Display for MaturityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaturityTier::Nascent => write!(f, "nascent"),
            MaturityTier::Established => write!(f, "established"),
            MaturityTier::Mature => write!(f, "mature"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_monotonic() {
        let config = MaturityConfig::default();
        let mut tier = MaturityTier::Nascent;

        assert_eq!(tier.advance(1, &config), None);
        assert_eq!(
            tier.advance(3, &config),
            Some((MaturityTier::Nascent, MaturityTier::Established))
        );
        assert_eq!(tier.advance(3, &config), None);
        // A smaller count never demotes.
        assert_eq!(tier.advance(1, &config), None);
        assert_eq!(tier, MaturityTier::Established);
        assert_eq!(
            tier.advance(12, &config),
            Some((MaturityTier::Established, MaturityTier::Mature))
        );
    }

    #[test]
    fn test_skip_to_mature() {
        let config = MaturityConfig::default();
        let mut tier = MaturityTier::Nascent;
        assert_eq!(
            tier.advance(50, &config),
            Some((MaturityTier::Nascent, MaturityTier::Mature))
        );
    }

    #[test]
    fn test_ordering_and_trust() {
        assert!(MaturityTier::Nascent < MaturityTier::Established);
        assert!(MaturityTier::Established < MaturityTier::Mature);
        assert!(!MaturityTier::Nascent.is_trusted());
        assert!(MaturityTier::Established.is_trusted());
        assert_eq!(MaturityTier::Mature.to_string(), "mature");
    }
}
