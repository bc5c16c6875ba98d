//! # chipduel-lobby
//!
//! **Stake Envelope Plane**: balance accounting, the append-only transaction
//! ledger, the order matching state machine, and reliability tracking.
//!
//! ## Architecture
//!
//! The stake envelope sits between the API layer and the series plane:
//! 1. **BalanceManager**: available/escrowed point balances per user
//! 2. **LedgerBook**: append-only transaction log + disposition invariant
//! 3. **OrderBook**: order lifecycle and stake locking
//! 4. **ReliabilityTracker**: per-user trust coefficient
//!
//! ## Order Flow
//!
//! ```text
//! API → OrderBook.create() → [stake locked + ledger entry + OPEN order]
//!     → OrderBook.join()   → [joiner stake locked, WAITING_CREATOR_CONFIRM]
//!     → OrderBook.confirm()→ MATCHED → series plane spawns the duel
//! ```
//!
//! Every stake debit happens in the same atomic unit as the state
//! transition that caused it.

pub mod balance_manager;
pub mod ledger_book;
pub mod order_book;
pub mod reliability;

pub use balance_manager::BalanceManager;
pub use ledger_book::LedgerBook;
pub use order_book::{MatchedPair, OrderBook};
pub use reliability::ReliabilityTracker;
