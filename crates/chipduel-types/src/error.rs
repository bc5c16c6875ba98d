//! Error types for the ChipDuel engine.
//!
//! All errors use the `CD_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Balance errors
//! - 3xx: Escrow / ledger errors
//! - 4xx: Round / timeout errors
//! - 5xx: Fairness errors
//! - 6xx: Settlement errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{DuelId, OrderId, OrderStatus, Points, RoundStatus};

/// Central error enum for all ChipDuel operations.
#[derive(Debug, Error)]
pub enum ChipduelError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The requested order does not exist.
    #[error("CD_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The games count is outside the allowed [2, 10] range.
    #[error("CD_ERR_101: Games planned {games} outside allowed range [{min}, {max}]")]
    GamesOutOfRange { games: u32, min: u32, max: u32 },

    /// The order is not open for joining.
    #[error("CD_ERR_102: Order not available: status is {status}")]
    OrderNotAvailable { status: OrderStatus },

    /// A player attempted to join their own order.
    #[error("CD_ERR_103: Cannot join your own order")]
    SelfJoin,

    /// The caller does not own the order.
    #[error("CD_ERR_104: Caller is not the order owner")]
    NotOrderOwner,

    /// The order cannot be cancelled in its current state.
    #[error("CD_ERR_105: Order cannot be cancelled: status is {status}")]
    OrderNotCancellable { status: OrderStatus },

    /// An order status transition that the lifecycle graph forbids.
    #[error("CD_ERR_106: Invalid order transition {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Not enough available points to lock the stake.
    #[error("CD_ERR_200: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Points, available: Points },

    /// Not enough escrowed points to release or consume.
    #[error("CD_ERR_201: Insufficient escrowed balance")]
    InsufficientEscrow,

    // =================================================================
    // Escrow / Ledger Errors (3xx)
    // =================================================================
    /// A locked stake was not disposed of exactly once — critical safety alert.
    #[error("CD_ERR_300: Stake disposition violation: {reason}")]
    StakeDispositionViolation { reason: String },

    // =================================================================
    // Round / Timeout Errors (4xx)
    // =================================================================
    /// The requested duel does not exist.
    #[error("CD_ERR_400: Duel not found: {0}")]
    DuelNotFound(DuelId),

    /// No round with the given index exists for this duel.
    #[error("CD_ERR_401: Round {round_index} not found for {duel_id}")]
    RoundNotFound { duel_id: DuelId, round_index: u32 },

    /// The caller is not a participant in this duel.
    #[error("CD_ERR_402: Caller is not a player in this duel")]
    NotADuelPlayer,

    /// The player already submitted a number for this round.
    #[error("CD_ERR_403: Number already submitted for round {round_index}")]
    AlreadySubmitted { round_index: u32 },

    /// The round is no longer accepting submissions.
    #[error("CD_ERR_404: Round is closed: status is {status}")]
    RoundClosed { status: RoundStatus },

    /// The submission arrived after the round deadline.
    #[error("CD_ERR_405: Round deadline has passed")]
    DeadlinePassed,

    /// The creator confirmation window has elapsed.
    #[error("CD_ERR_406: Confirmation window has expired")]
    ConfirmationExpired,

    // =================================================================
    // Fairness Errors (5xx)
    // =================================================================
    /// A player number outside [0, 999999]. Rejected before any hashing.
    #[error("CD_ERR_500: Player number {value} outside [0, 999999]")]
    NumberOutOfRange { value: u64 },

    /// The published seed slice is not 8 hexadecimal characters.
    #[error("CD_ERR_501: Malformed seed slice: {slice:?}")]
    MalformedSeedSlice { slice: String },

    // =================================================================
    // Settlement Errors (6xx)
    // =================================================================
    /// A duel's stakes were already settled (idempotency guard).
    #[error("CD_ERR_600: Duel already settled: {0}")]
    DuelAlreadySettled(DuelId),

    /// Fewer than the minimum games completed; rewards stay escrowed.
    #[error("CD_ERR_601: Series below minimum: {played} of {required} games played")]
    SeriesBelowMinimum { played: u32, required: u32 },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("CD_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("CD_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (missing platform secret, invalid config).
    /// Fatal at process startup, never surfaced per-request.
    #[error("CD_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ChipduelError>;
