//! # chipduel-fairness
//!
//! **Pure deterministic fairness engine for ChipDuel.**
//!
//! The fairness plane resolves a round from an HMAC-SHA256 over the round's
//! seed material and nothing else. It has:
//!
//! - **Zero side effects**: no state, no clocks, no persistence
//! - **Deterministic output**: same seed -> same outcome on every call
//! - **Public verifiability**: the published 8-hex-char seed slice is enough
//!   to recompute the outcome without the platform secret

pub mod engine;
pub mod secret;
pub mod verify;

pub use engine::{
    determine_winner, time_slot, validate_player_number, PlayerEntry, RoundOutcome, RoundSeed,
    FORMULA,
};
pub use secret::PlatformSecret;
pub use verify::{random_number_from_slice, verify_outcome};
