//! Chip tiers — the named stake denominations.
//!
//! A chip maps to a fixed number of points wagered **per round**. The total
//! escrow for an order is `stake_per_game × games_planned`.

use serde::{Deserialize, Serialize};

/// Points are integral. All balances, stakes, and ledger amounts are point
/// counts; there is no fractional unit anywhere in the engine.
pub type Points = i64;

/// A named stake tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ChipType {
    Smile,
    Heart,
    Fire,
    Ring,
}

impl ChipType {
    /// Points wagered per round for this chip.
    #[must_use]
    pub fn stake_per_game(self) -> Points {
        match self {
            Self::Smile => 5,
            Self::Heart => 10,
            Self::Fire => 25,
            Self::Ring => 50,
        }
    }

    /// All chip tiers, cheapest first.
    #[must_use]
    pub fn all() -> [Self; 4] {
        [Self::Smile, Self::Heart, Self::Fire, Self::Ring]
    }
}

impl std::fmt::Display for ChipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Smile => write!(f, "SMILE"),
            Self::Heart => write!(f, "HEART"),
            Self::Fire => write!(f, "FIRE"),
            Self::Ring => write!(f, "RING"),
        }
    }
}
