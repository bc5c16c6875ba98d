//! Reliability types — the per-user trust signal.
//!
//! Counters are monotonic and never rolled back. The coefficient is the
//! completed/total ratio, defaulting to 1.0 for a user with no history.

use serde::{Deserialize, Serialize};

/// A commitment-level event affecting a player's reliability counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReliabilityEvent {
    /// The creator let a confirmation window lapse.
    MissedConfirmation,
    /// The player saw a series through to settlement.
    DuelCompleted,
    /// The player abandoned a series before the minimum games completed.
    DroppedBeforeMinGames,
}

impl std::fmt::Display for ReliabilityEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissedConfirmation => write!(f, "MISSED_CONFIRMATION"),
            Self::DuelCompleted => write!(f, "DUEL_COMPLETED"),
            Self::DroppedBeforeMinGames => write!(f, "DROPPED_BEFORE_MIN_GAMES"),
        }
    }
}

/// Rank band derived from the reliability coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ReliabilityRank {
    Unreliable,
    Risky,
    Average,
    Reliable,
    Trusted,
}

impl ReliabilityRank {
    /// Band thresholds: ≥0.90 TRUSTED, ≥0.70 RELIABLE, ≥0.50 AVERAGE,
    /// ≥0.30 RISKY, else UNRELIABLE.
    #[must_use]
    pub fn from_coefficient(coefficient: f64) -> Self {
        if coefficient >= 0.90 {
            Self::Trusted
        } else if coefficient >= 0.70 {
            Self::Reliable
        } else if coefficient >= 0.50 {
            Self::Average
        } else if coefficient >= 0.30 {
            Self::Risky
        } else {
            Self::Unreliable
        }
    }
}

impl std::fmt::Display for ReliabilityRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trusted => write!(f, "TRUSTED"),
            Self::Reliable => write!(f, "RELIABLE"),
            Self::Average => write!(f, "AVERAGE"),
            Self::Risky => write!(f, "RISKY"),
            Self::Unreliable => write!(f, "UNRELIABLE"),
        }
    }
}

/// Per-user monotonic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliabilityRecord {
    pub total_deals: u64,
    pub completed_deals: u64,
}

impl ReliabilityRecord {
    /// Apply an event. Every event commits a deal; only `DuelCompleted`
    /// completes one.
    pub fn apply(&mut self, event: ReliabilityEvent) {
        self.total_deals += 1;
        if event == ReliabilityEvent::DuelCompleted {
            self.completed_deals += 1;
        }
    }

    /// `completed / total`, or 1.0 for an empty history.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coefficient(&self) -> f64 {
        if self.total_deals == 0 {
            1.0
        } else {
            self.completed_deals as f64 / self.total_deals as f64
        }
    }

    #[must_use]
    pub fn rank(&self) -> ReliabilityRank {
        ReliabilityRank::from_coefficient(self.coefficient())
    }
}
