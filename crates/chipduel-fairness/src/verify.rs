//! Secret-free public verification.
//!
//! Anyone holding the published 8-hex-character seed slice can recompute the
//! round's random number and winner — the platform secret is **never**
//! required. This is what makes a stored outcome third-party checkable.

use chipduel_types::{constants, ChipduelError, PlayerSlot, Result, VerifyResponse};

use crate::engine::validate_player_number;

/// Recompute the random number from a published seed slice alone.
///
/// # Errors
/// Returns `MalformedSeedSlice` unless the slice is exactly 8 hex characters.
pub fn random_number_from_slice(seed_slice: &str) -> Result<u32> {
    if seed_slice.len() != constants::SEED_SLICE_LEN
        || !seed_slice.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(ChipduelError::MalformedSeedSlice {
            slice: seed_slice.to_string(),
        });
    }
    let raw = u32::from_str_radix(seed_slice, 16).map_err(|_| ChipduelError::MalformedSeedSlice {
        slice: seed_slice.to_string(),
    })?;
    Ok(raw % constants::RANDOM_MODULUS)
}

/// Independently recompute a round outcome and check it against a claim.
///
/// `claimed_winner` of `None` claims a draw. The response carries the
/// recomputed random number and winner regardless of whether the claim
/// agrees, so a verifier can publish the discrepancy.
///
/// # Errors
/// - `MalformedSeedSlice` for a non-8-hex-char slice
/// - `NumberOutOfRange` for an invalid player number
pub fn verify_outcome(
    seed_slice: &str,
    player_a_number: u32,
    player_b_number: u32,
    claimed_winner: Option<PlayerSlot>,
) -> Result<VerifyResponse> {
    validate_player_number(player_a_number)?;
    validate_player_number(player_b_number)?;
    let random_number = random_number_from_slice(seed_slice)?;

    let distance_a = player_a_number.abs_diff(random_number);
    let distance_b = player_b_number.abs_diff(random_number);
    let winner = match distance_a.cmp(&distance_b) {
        std::cmp::Ordering::Less => Some(PlayerSlot::A),
        std::cmp::Ordering::Greater => Some(PlayerSlot::B),
        std::cmp::Ordering::Equal => None,
    };

    Ok(VerifyResponse {
        agrees: winner == claimed_winner,
        random_number,
        winner,
        is_draw: winner.is_none(),
    })
}
