//! Request/response shapes owned by the core, and the notification events
//! handed to the delivery collaborator.
//!
//! The auth collaborator supplies an already-validated caller identity for
//! every mutating call; these shapes carry only what the core decides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    constants, ChipType, ChipduelError, DuelId, Order, OrderId, OrderStatus, PlayerSlot, Points,
    Result, UserId,
};

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// `createOrder` request body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub chip: ChipType,
    pub games_planned: u32,
}

impl CreateOrderRequest {
    /// Validate before any mutation.
    pub fn validate(&self) -> Result<()> {
        if self.games_planned < constants::MIN_GAMES_PER_ORDER
            || self.games_planned > constants::MAX_GAMES_PER_ORDER
        {
            return Err(ChipduelError::GamesOutOfRange {
                games: self.games_planned,
                min: constants::MIN_GAMES_PER_ORDER,
                max: constants::MAX_GAMES_PER_ORDER,
            });
        }
        Ok(())
    }
}

/// Public view of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: OrderId,
    pub owner: UserId,
    pub chip: ChipType,
    pub stake_per_game: Points,
    pub games_planned: u32,
    pub total_stake: Points,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderDto {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            owner: order.owner,
            chip: order.chip,
            stake_per_game: order.stake_per_game,
            games_planned: order.games_planned,
            total_stake: order.total_stake(),
            status: order.status,
            created_at: order.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

/// `submitPlayerNumber` request body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubmitNumberRequest {
    pub round_index: u32,
    pub player_number: u32,
}

/// `submitPlayerNumber` response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubmitNumberResponse {
    pub submitted: bool,
    /// Whether this submission completed the pair and resolved the round.
    pub both_ready: bool,
    pub my_number: u32,
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// `verify` request: everything a third party needs, and nothing secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// The published 8-hex-char HMAC prefix.
    pub seed_slice: String,
    pub player_a_number: u32,
    pub player_b_number: u32,
    /// The winner being claimed; `None` claims a draw.
    pub claimed_winner: Option<PlayerSlot>,
}

/// `verify` response with the independently recomputed outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Whether the claim matches the recomputation.
    pub agrees: bool,
    pub random_number: u32,
    pub winner: Option<PlayerSlot>,
    pub is_draw: bool,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Events handed to the notification collaborator. Delivery is
/// fire-and-forget; the core never blocks on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationEvent {
    OpponentFound {
        order_id: OrderId,
        owner: UserId,
        joiner: UserId,
    },
    ConfirmationRequired {
        order_id: OrderId,
        owner: UserId,
        deadline: DateTime<Utc>,
    },
    RoundStarted {
        duel_id: DuelId,
        round_index: u32,
        deadline: DateTime<Utc>,
    },
    RoundResult {
        duel_id: DuelId,
        round_index: u32,
        winner: Option<UserId>,
        seed_slice: String,
        random_number: u32,
    },
    ForfeitApplied {
        duel_id: DuelId,
        forfeiter: UserId,
    },
    SeriesCompleted {
        duel_id: DuelId,
        winner: Option<UserId>,
    },
}
