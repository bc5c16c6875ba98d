//! Engine configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Timing and capacity configuration for the engine. All windows are stored
/// as whole seconds so deadline arithmetic stays infallible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long the creator has to confirm a joiner.
    pub confirmation_window_secs: u32,
    /// Submission window for each round.
    pub submit_window_secs: u32,
    /// Hard ceiling on round deadlines, measured from duel start.
    pub round_ceiling_secs: u32,
    /// Age after which an unmatched order is reaped to EXPIRED.
    pub open_order_ttl_secs: u32,
    /// Settlement idempotency cache size.
    pub settlement_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confirmation_window_secs: constants::DEFAULT_CONFIRMATION_WINDOW_SECS,
            submit_window_secs: constants::DEFAULT_SUBMIT_WINDOW_SECS,
            round_ceiling_secs: constants::DEFAULT_ROUND_CEILING_SECS,
            open_order_ttl_secs: constants::DEFAULT_OPEN_ORDER_TTL_SECS,
            settlement_cache_size: constants::SETTLEMENT_GUARD_CACHE_SIZE,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn confirmation_window(&self) -> Duration {
        Duration::seconds(i64::from(self.confirmation_window_secs))
    }

    #[must_use]
    pub fn submit_window(&self) -> Duration {
        Duration::seconds(i64::from(self.submit_window_secs))
    }

    #[must_use]
    pub fn round_ceiling(&self) -> Duration {
        Duration::seconds(i64::from(self.round_ceiling_secs))
    }

    #[must_use]
    pub fn open_order_ttl(&self) -> Duration {
        Duration::seconds(i64::from(self.open_order_ttl_secs))
    }
}
