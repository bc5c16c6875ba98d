//! Balance management for the stake envelope.
//!
//! Tracks per-user point balances with available/escrowed accounting.
//! All mutations are atomic: either the full operation succeeds or the
//! balance is unchanged.

use std::collections::HashMap;

use chipduel_types::{BalanceEntry, ChipduelError, Points, Result, UserId};

/// Manages user balances with available/escrowed accounting.
///
/// The BalanceManager is the source of truth for all balance state. The
/// order book and the reward settler call into it to lock, release, and
/// transfer stakes — always paired with a ledger entry by the caller.
pub struct BalanceManager {
    /// Per-user balances.
    balances: HashMap<UserId, BalanceEntry>,
}

impl BalanceManager {
    /// Create a new empty balance manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    /// Deposit points (increases available balance). This is the only
    /// operation that changes the system-wide total.
    pub fn deposit(&mut self, user_id: UserId, amount: Points) {
        let entry = self.balances.entry(user_id).or_default();
        entry.available += amount;
    }

    /// Lock a stake (available → escrowed). Used at order creation and join.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if available < amount.
    pub fn lock_stake(&mut self, user_id: UserId, amount: Points) -> Result<()> {
        let entry =
            self.balances
                .get_mut(&user_id)
                .ok_or(ChipduelError::InsufficientBalance {
                    needed: amount,
                    available: 0,
                })?;

        if entry.available < amount {
            return Err(ChipduelError::InsufficientBalance {
                needed: amount,
                available: entry.available,
            });
        }

        entry.available -= amount;
        entry.escrowed += amount;
        Ok(())
    }

    /// Release a stake (escrowed → available). Used for refunds.
    ///
    /// # Errors
    /// Returns `InsufficientEscrow` if escrowed < amount.
    pub fn release_stake(&mut self, user_id: UserId, amount: Points) -> Result<()> {
        let entry = self
            .balances
            .get_mut(&user_id)
            .ok_or(ChipduelError::InsufficientEscrow)?;

        if entry.escrowed < amount {
            return Err(ChipduelError::InsufficientEscrow);
        }

        entry.escrowed -= amount;
        entry.available += amount;
        Ok(())
    }

    /// Consume an escrowed stake (for transfer to the counterparty).
    /// Escrow decreases; nothing returns to this user.
    ///
    /// # Errors
    /// Returns `InsufficientEscrow` if escrowed < amount.
    pub fn consume_stake(&mut self, user_id: UserId, amount: Points) -> Result<()> {
        let entry = self
            .balances
            .get_mut(&user_id)
            .ok_or(ChipduelError::InsufficientEscrow)?;

        if entry.escrowed < amount {
            return Err(ChipduelError::InsufficientEscrow);
        }

        entry.escrowed -= amount;
        Ok(())
    }

    /// Credit available balance (payout / forfeit award receiving side).
    pub fn credit(&mut self, user_id: UserId, amount: Points) {
        let entry = self.balances.entry(user_id).or_default();
        entry.available += amount;
    }

    /// Get a user's balance.
    #[must_use]
    pub fn balance(&self, user_id: UserId) -> BalanceEntry {
        self.balances.get(&user_id).copied().unwrap_or_default()
    }

    /// System-wide total (sum of all users' available + escrowed). Constant
    /// outside of deposits — settlement only moves points between users.
    #[must_use]
    pub fn total_points(&self) -> Points {
        self.balances.values().map(BalanceEntry::total).sum()
    }
}

impl Default for BalanceManager {
    fn default() -> Self {
        Self::new()
    }
}
