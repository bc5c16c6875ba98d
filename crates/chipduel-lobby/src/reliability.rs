//! Per-user reliability tracking.
//!
//! Counters only ever move forward. A user with no history reads as fully
//! reliable — the signal exists to demote, not to gatekeep newcomers.

use std::collections::HashMap;

use chipduel_types::{ReliabilityEvent, ReliabilityRank, ReliabilityRecord, UserId};

/// Tracks commitment counters for every user who has ever committed a deal.
pub struct ReliabilityTracker {
    records: HashMap<UserId, ReliabilityRecord>,
}

impl ReliabilityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Apply an event to a user's counters.
    pub fn record(&mut self, user_id: UserId, event: ReliabilityEvent) {
        let record = self.records.entry(user_id).or_default();
        record.apply(event);
        tracing::debug!(
            %user_id,
            event = %event,
            total = record.total_deals,
            completed = record.completed_deals,
            "reliability updated"
        );
    }

    /// The user's counters (zeroed for an unknown user).
    #[must_use]
    pub fn record_of(&self, user_id: UserId) -> ReliabilityRecord {
        self.records.get(&user_id).copied().unwrap_or_default()
    }

    /// `completed / total`, 1.0 for an unknown user.
    #[must_use]
    pub fn coefficient(&self, user_id: UserId) -> f64 {
        self.record_of(user_id).coefficient()
    }

    /// Rank band for the user.
    #[must_use]
    pub fn rank(&self, user_id: UserId) -> ReliabilityRank {
        self.record_of(user_id).rank()
    }
}

impl Default for ReliabilityTracker {
    fn default() -> Self {
        Self::new()
    }
}
