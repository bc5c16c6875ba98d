//! Order types for the ChipDuel matching lobby.
//!
//! An order escrows its creator's full stake (`stake_per_game × games_planned`)
//! at creation time. The stake stays locked until the order reaches a terminal
//! status with a recorded disposition (payout, refund, or forfeit transfer).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChipType, OrderId, Points, UserId};

/// Lifecycle status of an order.
///
/// ```text
///   OPEN ──join──▶ WAITING_CREATOR_CONFIRM ──confirm──▶ MATCHED ──▶ IN_PROGRESS ──▶ COMPLETED
///    │ ▲                  │         │
///    │ └───── timeout ────┘         └──▶ EXPIRED
///    └──▶ CANCELLED / EXPIRED
/// ```
///
/// An in-progress order never cancels; an unresponsive player is handled
/// by round timeouts and forfeiture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    WaitingCreatorConfirm,
    Matched,
    InProgress,
    Completed,
    Cancelled,
    Expired,
}

impl OrderStatus {
    /// Can this order transition to the given target status?
    ///
    /// Encodes the full lifecycle graph; every status write in the order book
    /// goes through this check.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Open,
                Self::WaitingCreatorConfirm | Self::Cancelled | Self::Expired
            ) | (
                Self::WaitingCreatorConfirm,
                Self::Matched | Self::Open | Self::Expired
            ) | (Self::Matched, Self::InProgress)
                | (Self::InProgress, Self::Completed)
        )
    }

    /// Terminal statuses never transition again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::WaitingCreatorConfirm => write!(f, "WAITING_CREATOR_CONFIRM"),
            Self::Matched => write!(f, "MATCHED"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// A wager order. Owned exclusively by its creator until matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: UserId,
    pub chip: ChipType,
    /// Points wagered per round (denormalized from `chip` for the ledger).
    pub stake_per_game: Points,
    /// Number of rounds in the series, in `[2, 10]`.
    pub games_planned: u32,
    pub status: OrderStatus,
    /// The joining player, present from `WAITING_CREATOR_CONFIRM` on.
    pub opponent: Option<UserId>,
    /// Deadline for the creator to confirm the joiner.
    pub confirmation_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The full escrow each side commits: `stake_per_game × games_planned`.
    #[must_use]
    pub fn total_stake(&self) -> Points {
        self.stake_per_game * Points::from(self.games_planned)
    }

    /// Whether the confirmation window has elapsed at `now`.
    #[must_use]
    pub fn confirmation_expired(&self, now: DateTime<Utc>) -> bool {
        self.confirmation_deadline.is_some_and(|d| now > d)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(owner: UserId, chip: ChipType, games_planned: u32) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            owner,
            chip,
            stake_per_game: chip.stake_per_game(),
            games_planned,
            status: OrderStatus::Open,
            opponent: None,
            confirmation_deadline: None,
            created_at: now,
            updated_at: now,
        }
    }
}
