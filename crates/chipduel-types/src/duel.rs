//! Duel (series) and round types.
//!
//! A duel is the best-of-N series spawned when an order is confirmed. Rounds
//! within a duel are strictly sequential: round N+1 never opens before round
//! N is resolved. A resolved [`Round`] is the authoritative record of its
//! outcome — readers never recompute it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DuelId, OrderId, Points, RoundId, UserId};

// ---------------------------------------------------------------------------
// PlayerSlot
// ---------------------------------------------------------------------------

/// Which seat a player occupies in a duel. The order creator is always `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSlot {
    A,
    B,
}

impl PlayerSlot {
    /// The opposing seat.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Zero-based index, as published in verification payloads.
    #[must_use]
    pub fn index(self) -> u8 {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl std::fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

// ---------------------------------------------------------------------------
// SeriesScore
// ---------------------------------------------------------------------------

/// Running aggregate of a series, recomputed after every resolved round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesScore {
    pub wins_a: u32,
    pub wins_b: u32,
    pub draws: u32,
    pub games_played: u32,
    pub games_planned: u32,
}

impl SeriesScore {
    #[must_use]
    pub fn new(games_planned: u32) -> Self {
        Self {
            wins_a: 0,
            wins_b: 0,
            draws: 0,
            games_played: 0,
            games_planned,
        }
    }

    /// Record one resolved round. `None` is a drawn round.
    pub fn record(&mut self, winner: Option<PlayerSlot>) {
        match winner {
            Some(PlayerSlot::A) => self.wins_a += 1,
            Some(PlayerSlot::B) => self.wins_b += 1,
            None => self.draws += 1,
        }
        self.games_played += 1;
    }

    /// The seat with strictly more round wins, if any.
    #[must_use]
    pub fn leader(&self) -> Option<PlayerSlot> {
        match self.wins_a.cmp(&self.wins_b) {
            std::cmp::Ordering::Greater => Some(PlayerSlot::A),
            std::cmp::Ordering::Less => Some(PlayerSlot::B),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Whether every planned game has been played.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.games_played >= self.games_planned
    }
}

// ---------------------------------------------------------------------------
// Duel
// ---------------------------------------------------------------------------

/// Status of a duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DuelStatus {
    InProgress,
    Completed,
}

impl std::fmt::Display for DuelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// A matched series between two players. 1:1 with its spawning order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duel {
    pub id: DuelId,
    pub order_id: OrderId,
    pub player_a: UserId,
    pub player_b: UserId,
    /// Points per round, denormalized from the order for settlement.
    pub stake_per_game: Points,
    pub status: DuelStatus,
    /// Series winner once COMPLETED; `None` for a drawn series.
    pub winner: Option<UserId>,
    pub score: SeriesScore,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Duel {
    /// The seat a user occupies, or `None` for a non-participant.
    #[must_use]
    pub fn slot_of(&self, user: UserId) -> Option<PlayerSlot> {
        if user == self.player_a {
            Some(PlayerSlot::A)
        } else if user == self.player_b {
            Some(PlayerSlot::B)
        } else {
            None
        }
    }

    /// The user seated in the given slot.
    #[must_use]
    pub fn player_in(&self, slot: PlayerSlot) -> UserId {
        match slot {
            PlayerSlot::A => self.player_a,
            PlayerSlot::B => self.player_b,
        }
    }

    #[must_use]
    pub fn games_planned(&self) -> u32 {
        self.score.games_planned
    }

    /// Full per-player escrow committed to this series.
    #[must_use]
    pub fn total_stake(&self) -> Points {
        self.stake_per_game * Points::from(self.score.games_planned)
    }
}

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

/// Lifecycle status of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundStatus {
    /// Accepting player numbers until the deadline.
    AwaitingNumbers,
    /// Resolved by the fairness engine. Immutable from here on.
    Finished,
    /// Closed by a missed deadline. Immutable from here on.
    Forfeited,
}

impl RoundStatus {
    /// Whether the round can still accept submissions.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::AwaitingNumbers)
    }
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingNumbers => write!(f, "AWAITING_NUMBERS"),
            Self::Finished => write!(f, "FINISHED"),
            Self::Forfeited => write!(f, "FORFEITED"),
        }
    }
}

/// One round of a duel — a first-class typed record.
///
/// The outcome fields (`winner`, `seed_slice`, `random_number`) are written
/// exactly once, when the round leaves `AwaitingNumbers`, and are
/// authoritative afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub duel_id: DuelId,
    /// 1-based index within the series.
    pub round_index: u32,
    /// Submission deadline for both players.
    pub deadline: DateTime<Utc>,
    pub player_a_number: Option<u32>,
    pub player_b_number: Option<u32>,
    pub status: RoundStatus,
    /// Round winner; `None` while open or for a drawn round.
    pub winner: Option<UserId>,
    /// Public 8-hex-char HMAC prefix, set at resolution.
    pub seed_slice: Option<String>,
    /// Derived random number in `[0, 999999]`, set at resolution.
    pub random_number: Option<u32>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Round {
    /// Open a fresh round awaiting both numbers.
    #[must_use]
    pub fn open(duel_id: DuelId, round_index: u32, deadline: DateTime<Utc>) -> Self {
        Self {
            id: RoundId::derive(duel_id, round_index),
            duel_id,
            round_index,
            deadline,
            player_a_number: None,
            player_b_number: None,
            status: RoundStatus::AwaitingNumbers,
            winner: None,
            seed_slice: None,
            random_number: None,
            resolved_at: None,
        }
    }

    /// The number submitted by the given seat, if any.
    #[must_use]
    pub fn number_for(&self, slot: PlayerSlot) -> Option<u32> {
        match slot {
            PlayerSlot::A => self.player_a_number,
            PlayerSlot::B => self.player_b_number,
        }
    }

    /// Record a seat's submission. Does not validate — callers gate on
    /// status, deadline, and double submission first.
    pub fn set_number(&mut self, slot: PlayerSlot, number: u32) {
        match slot {
            PlayerSlot::A => self.player_a_number = Some(number),
            PlayerSlot::B => self.player_b_number = Some(number),
        }
    }

    /// Whether both players have submitted.
    #[must_use]
    pub fn both_submitted(&self) -> bool {
        self.player_a_number.is_some() && self.player_b_number.is_some()
    }

    /// Whether the deadline has elapsed at `now`.
    #[must_use]
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }
}
