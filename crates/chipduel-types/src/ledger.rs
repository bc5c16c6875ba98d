//! Ledger transaction types — the append-only audit trail.
//!
//! Every balance mutation produces exactly one [`Transaction`]. A locked
//! stake is disposed of exactly once before its order goes terminal:
//! `sum(STAKE_LOCK) == sum(PAYOUT) + sum(REFUND) + sum(FORFEIT_AWARD)`
//! per order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DuelId, OrderId, Points, TxId, UserId};

/// What kind of balance movement a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    /// Stake debited into escrow at order creation or join.
    StakeLock,
    /// Winnings credited from the opponent's escrowed stake.
    Payout,
    /// A player's own stake returned (cancel, draw, timeout, winner's side).
    Refund,
    /// Both stakes transferred after a sub-minimum forfeit.
    ForfeitAward,
}

impl TxKind {
    /// Whether this kind moves points out of the user's available balance.
    #[must_use]
    pub fn is_debit(self) -> bool {
        matches!(self, Self::StakeLock)
    }
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StakeLock => write!(f, "STAKE_LOCK"),
            Self::Payout => write!(f, "PAYOUT"),
            Self::Refund => write!(f, "REFUND"),
            Self::ForfeitAward => write!(f, "FORFEIT_AWARD"),
        }
    }
}

/// One append-only ledger entry. `amount` is always positive; direction is
/// carried by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub user_id: UserId,
    pub kind: TxKind,
    pub amount: Points,
    /// The order whose stake this entry moves.
    pub order_id: OrderId,
    /// The duel, once one exists.
    pub duel_id: Option<DuelId>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[must_use]
    pub fn new(
        user_id: UserId,
        kind: TxKind,
        amount: Points,
        order_id: OrderId,
        duel_id: Option<DuelId>,
    ) -> Self {
        Self {
            id: TxId::new(),
            user_id,
            kind,
            amount,
            order_id,
            duel_id,
            created_at: Utc::now(),
        }
    }
}
