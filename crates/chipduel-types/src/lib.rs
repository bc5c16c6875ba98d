//! # chipduel-types
//!
//! Shared types, errors, and configuration for the **ChipDuel** wagering
//! engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`UserId`], [`OrderId`], [`DuelId`], [`RoundId`], [`TxId`]
//! - **Stakes**: [`ChipType`], [`Points`]
//! - **Order model**: [`Order`], [`OrderStatus`]
//! - **Duel model**: [`Duel`], [`DuelStatus`], [`SeriesScore`], [`PlayerSlot`]
//! - **Round model**: [`Round`], [`RoundStatus`]
//! - **Ledger model**: [`Transaction`], [`TxKind`]
//! - **Balance model**: [`BalanceEntry`]
//! - **Reliability**: [`ReliabilityRecord`], [`ReliabilityEvent`], [`ReliabilityRank`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`ChipduelError`] with `CD_ERR_` prefix codes
//! - **DTOs & notifications**: request/response shapes, [`NotificationEvent`]
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod chip;
pub mod config;
pub mod constants;
pub mod dto;
pub mod duel;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod notify;
pub mod order;
pub mod reliability;

// Re-export all primary types at crate root for ergonomic imports:
//   use chipduel_types::{Order, Duel, Round, ChipType, ...};

pub use balance::*;
pub use chip::*;
pub use config::*;
pub use dto::*;
pub use duel::*;
pub use error::*;
pub use ids::*;
pub use ledger::*;
pub use notify::*;
pub use order::*;
pub use reliability::*;

// Constants are accessed via `chipduel_types::constants::FOO`
// (not re-exported to avoid name collisions).
