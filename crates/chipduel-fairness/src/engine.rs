//! Pure deterministic round resolution.
//!
//! The core function: takes a [`RoundSeed`] and produces a [`RoundOutcome`].
//! This is the **only** computation the fairness plane performs — no state,
//! no clocks, no persistence.
//!
//! ```text
//! determine_winner(secret, RoundSeed) -> RoundOutcome
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same secret and the same seed (same duel, round, time slot,
//! players, and numbers), this function produces the **exact same**
//! `RoundOutcome` on every call — same random number, same seed slice,
//! same winner.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use chipduel_types::{constants, ChipduelError, PlayerSlot, Result};

use crate::secret::PlatformSecret;

type HmacSha256 = Hmac<Sha256>;

/// Human-readable description of the outcome algorithm, published with
/// every resolved round so players can audit it.
pub const FORMULA: &str = "random_number = parse_hex(seed_slice) mod 1000000; \
     winner = player with strictly smaller |player_number - random_number|; \
     equal distances are a draw";

/// One player's contribution to the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerEntry<'a> {
    /// Display form of the player's identity. The engine only hashes it.
    pub id: &'a str,
    /// The chosen number, in `[0, 999999]`.
    pub number: u32,
}

/// Everything that feeds the outcome HMAC for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSeed<'a> {
    pub duel_id: &'a str,
    /// 1-based round number within the series.
    pub round_number: u32,
    /// 30-second window index; see [`time_slot`].
    pub time_slot: u64,
    pub player_a: PlayerEntry<'a>,
    pub player_b: PlayerEntry<'a>,
}

impl RoundSeed<'_> {
    /// The canonical seed input string:
    /// `duel:round:slot:a_id:a_number:b_id:b_number`.
    #[must_use]
    pub fn seed_input(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}",
            self.duel_id,
            self.round_number,
            self.time_slot,
            self.player_a.id,
            self.player_a.number,
            self.player_b.id,
            self.player_b.number,
        )
    }
}

/// The resolved outcome of one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Derived random number in `[0, 999999]`.
    pub random_number: u32,
    pub distance_a: u32,
    pub distance_b: u32,
    /// The winning seat; `None` on a draw.
    pub winner: Option<PlayerSlot>,
    pub is_draw: bool,
    /// First 8 hex characters of the HMAC — enough for public verification.
    pub seed_slice: String,
    /// The published formula description.
    pub formula: String,
}

/// Discretize a millisecond timestamp into a 30-second outcome window.
///
/// Repeated resolutions within one window are reproducible by construction.
#[must_use]
pub fn time_slot(now_ms: u64) -> u64 {
    now_ms / constants::TIME_SLOT_MS
}

/// Reject player numbers outside `[0, 999999]` before any hashing.
pub fn validate_player_number(number: u32) -> Result<()> {
    if number > constants::PLAYER_NUMBER_MAX {
        return Err(ChipduelError::NumberOutOfRange {
            value: u64::from(number),
        });
    }
    Ok(())
}

/// Resolve one round deterministically.
///
/// 1. Validate both player numbers (fail **before** hashing)
/// 2. `HMAC-SHA256(secret, seed_input)`
/// 3. `seed_slice` = first 8 hex chars; `random_number` = slice mod 1,000,000
/// 4. Strictly smaller distance to `random_number` wins; ties draw
///
/// # Errors
/// Returns `NumberOutOfRange` for an invalid player number and `Internal`
/// if the MAC cannot be keyed.
pub fn determine_winner(secret: &PlatformSecret, seed: &RoundSeed<'_>) -> Result<RoundOutcome> {
    validate_player_number(seed.player_a.number)?;
    validate_player_number(seed.player_b.number)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ChipduelError::Internal(format!("HMAC keying failed: {e}")))?;
    mac.update(seed.seed_input().as_bytes());
    let digest = mac.finalize().into_bytes();

    // First 4 bytes == first 8 hex characters: the public slice.
    let seed_slice = hex::encode(&digest[..4]);
    let raw = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let random_number = raw % constants::RANDOM_MODULUS;

    let distance_a = seed.player_a.number.abs_diff(random_number);
    let distance_b = seed.player_b.number.abs_diff(random_number);

    let winner = match distance_a.cmp(&distance_b) {
        std::cmp::Ordering::Less => Some(PlayerSlot::A),
        std::cmp::Ordering::Greater => Some(PlayerSlot::B),
        std::cmp::Ordering::Equal => None,
    };

    Ok(RoundOutcome {
        random_number,
        distance_a,
        distance_b,
        winner,
        is_draw: winner.is_none(),
        seed_slice,
        formula: FORMULA.to_string(),
    })
}
