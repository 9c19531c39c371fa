//! # rf-stage — Slot Round Presentation Vocabulary
//!
//! Defines the canonical presentation states a slot round walks through and
//! the notifications a machine publishes while walking them.
//!
//! ## Philosophy
//!
//! Every round, regardless of game variant, passes through the same semantic
//! phases:
//! - Spin → Reels stop → Wins shown → Cascades → Bonus → Free spins → Big win → Idle
//!
//! The presentation layer only ever reacts to these states. It never inspects
//! wire payloads.

pub mod bus;
pub mod event;
pub mod stage;
pub mod trace;

pub use bus::*;
pub use event::*;
pub use stage::*;
pub use trace::*;
