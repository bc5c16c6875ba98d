//! Append-only transaction ledger with the stake disposition invariant.
//!
//! Mathematical invariant enforced when an order reaches a terminal status:
//! ```text
//! ∀ order: Σ(STAKE_LOCK) == Σ(PAYOUT) + Σ(REFUND) + Σ(FORFEIT_AWARD)
//! ```
//!
//! If this invariant ever breaks, a stake was double-disposed or stranded —
//! something has gone catastrophically wrong, and the violation is returned
//! as a dedicated error.

use std::collections::HashMap;

use chipduel_types::{
    ChipduelError, DuelId, OrderId, Points, Result, Transaction, TxId, TxKind, UserId,
};

/// The append-only point-movement log.
///
/// Entries are never mutated or removed; per-order and per-duel indexes
/// support the invariant check and audit queries.
pub struct LedgerBook {
    entries: Vec<Transaction>,
    by_order: HashMap<OrderId, Vec<usize>>,
    by_duel: HashMap<DuelId, Vec<usize>>,
}

impl LedgerBook {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_order: HashMap::new(),
            by_duel: HashMap::new(),
        }
    }

    /// Append one entry. Callers pair every balance mutation with exactly
    /// one `record` in the same atomic unit.
    pub fn record(
        &mut self,
        user_id: UserId,
        kind: TxKind,
        amount: Points,
        order_id: OrderId,
        duel_id: Option<DuelId>,
    ) -> TxId {
        let tx = Transaction::new(user_id, kind, amount, order_id, duel_id);
        let tx_id = tx.id;
        let idx = self.entries.len();
        self.by_order.entry(order_id).or_default().push(idx);
        if let Some(duel_id) = duel_id {
            self.by_duel.entry(duel_id).or_default().push(idx);
        }
        tracing::debug!(%tx_id, %user_id, kind = %kind, amount, %order_id, "ledger entry");
        self.entries.push(tx);
        tx_id
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    /// Entries touching the given order.
    #[must_use]
    pub fn entries_for_order(&self, order_id: OrderId) -> Vec<&Transaction> {
        self.by_order
            .get(&order_id)
            .map(|idxs| idxs.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Entries touching the given duel.
    #[must_use]
    pub fn entries_for_duel(&self, duel_id: DuelId) -> Vec<&Transaction> {
        self.by_duel
            .get(&duel_id)
            .map(|idxs| idxs.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Total locked for an order across both players.
    #[must_use]
    pub fn locked_total(&self, order_id: OrderId) -> Points {
        self.sum_for(order_id, |kind| kind == TxKind::StakeLock)
    }

    /// Total disposed for an order (payouts + refunds + forfeit awards).
    #[must_use]
    pub fn disposed_total(&self, order_id: OrderId) -> Points {
        self.sum_for(order_id, |kind| kind != TxKind::StakeLock)
    }

    /// Verify the disposition invariant for a terminal order.
    ///
    /// # Errors
    /// Returns [`ChipduelError::StakeDispositionViolation`] if the locked
    /// and disposed totals differ.
    pub fn verify_disposition(&self, order_id: OrderId) -> Result<()> {
        let locked = self.locked_total(order_id);
        let disposed = self.disposed_total(order_id);
        if locked != disposed {
            tracing::error!(%order_id, locked, disposed, "stake disposition violated");
            return Err(ChipduelError::StakeDispositionViolation {
                reason: format!("order {order_id}: locked {locked} != disposed {disposed}"),
            });
        }
        Ok(())
    }

    /// Number of entries recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sum_for(&self, order_id: OrderId, pred: impl Fn(TxKind) -> bool) -> Points {
        self.by_order
            .get(&order_id)
            .map(|idxs| {
                idxs.iter()
                    .map(|&i| &self.entries[i])
                    .filter(|tx| pred(tx.kind))
                    .map(|tx| tx.amount)
                    .sum()
            })
            .unwrap_or(0)
    }
}

impl Default for LedgerBook {
    fn default() -> Self {
        Self::new()
    }
}
