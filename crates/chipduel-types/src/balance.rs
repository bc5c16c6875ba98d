//! Balance tracking types for the ChipDuel escrow model.
//!
//! Every user has an `available` balance (usable for new orders) and an
//! `escrowed` balance (locked by committed stakes until the series resolves).

use serde::{Deserialize, Serialize};

use crate::Points;

/// A single user's point balance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceEntry {
    /// Available for new orders.
    pub available: Points,
    /// Locked by active stakes awaiting settlement.
    pub escrowed: Points,
}

impl BalanceEntry {
    /// Create a zero balance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: 0,
            escrowed: 0,
        }
    }

    /// Total balance (available + escrowed).
    #[must_use]
    pub fn total(&self) -> Points {
        self.available + self.escrowed
    }

    /// Whether this entry has no points at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available == 0 && self.escrowed == 0
    }
}
