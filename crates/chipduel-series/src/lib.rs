//! # chipduel-series
//!
//! **Finality Plane**: duel/round orchestration, reward settlement, and
//! timeout enforcement.
//!
//! ## Architecture
//!
//! The series plane receives a [`MatchedPair`](chipduel_lobby::MatchedPair)
//! from the lobby and:
//! 1. Spawns the duel and drives rounds strictly one at a time
//! 2. Resolves each round through the fairness engine exactly once, at the
//!    second submission
//! 3. Enforces confirmation and round deadlines from one deadline-ordered
//!    queue ([`DeadlineQueue`])
//! 4. Settles stakes through the [`RewardSettler`] (payout, draw refund,
//!    forfeit transfer) behind an idempotency guard
//! 5. Fires notification events without ever blocking on delivery
//!
//! ## Series Flow
//!
//! ```text
//! lobby.confirm() → start_duel() → [round 1 open]
//!     → submit_number() ×2 → [FINISHED round persisted, score updated]
//!     → ... → games_played == games_planned → settle → COMPLETED
//! ```

pub mod notify;
pub mod orchestrator;
pub mod rewards;
pub mod sweeper;

pub use chipduel_types::{Notifier, NullNotifier};
pub use notify::RecordingNotifier;
pub use orchestrator::DuelOrchestrator;
pub use rewards::{RewardSettler, SettlementGuard};
pub use sweeper::{DeadlineQueue, DeadlineTask};
