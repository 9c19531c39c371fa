//! Round Model — Normalized server rounds
//!
//! - `WinPattern` — Boolean grid of winning cells
//! - `RoundResult` / `SpinResult` — One round and its ordered spins
//! - `TransactionType` / `RoundType` — Wire-level round kinds

mod pattern;
mod round;
mod transaction;

pub use pattern::*;
pub use round::*;
pub use transaction::*;
