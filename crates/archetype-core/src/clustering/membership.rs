//! Capped, deduplicated cluster membership.
//!
//! `len()` is the member count: there is no separate counter that could
//! drift from the list. Re-inserting an id is a no-op, and once the cap is
//! reached the oldest id is evicted.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Outcome of inserting a member id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipChange {
    /// Id appended.
    Added,
    /// Id already present; nothing changed.
    Duplicate,
    /// Id appended and the oldest id evicted.
    AddedWithEviction(String),
}

/// Ordered member ids, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CappedMembership {
    ids: VecDeque<String>,
}

impl CappedMembership {
    /// Empty membership.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an id, deduplicating and evicting the oldest beyond `cap`.
    pub fn insert(&mut self, id: &str, cap: usize) -> MembershipChange {
        if self.contains(id) {
            return MembershipChange::Duplicate;
        }
        self.ids.push_back(id.to_string());
        if self.ids.len() > cap.max(1) {
            if let Some(evicted) = self.ids.pop_front() {
                return MembershipChange::AddedWithEviction(evicted);
            }
        }
        MembershipChange::Added
    }

    /// Whether the id is a current member.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|m| m == id)
    }

    /// Member count.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether there are no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate ids, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Drop exact duplicate ids, keeping each first occurrence in order.
    ///
    /// Returns the number of entries removed.
    pub fn dedup(&mut self) -> usize {
        let before = self.ids.len();
        let mut seen = std::collections::HashSet::with_capacity(before);
        self.ids.retain(|id| seen.insert(id.clone()));
        before - self.ids.len()
    }

    /// Evict oldest ids until at most `cap` remain.
    ///
    /// Returns the evicted ids.
    pub fn enforce_cap(&mut self, cap: usize) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.ids.len() > cap.max(1) {
            if let Some(id) = self.ids.pop_front() {
                evicted.push(id);
            }
        }
        evicted
    }
}

impl FromIterator<String> for CappedMembership {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
