//! # rf-slot-round — Slot Round Evaluation and Sequencing
//!
//! Turns server round payloads into a normalized round model and walks each
//! round through its presentation stages.
//!
//! ## Features
//!
//! - **Round Parser**: Reel grids, line/ways/scatter wins, free-spin progress, multiplier maps
//! - **Cascade Accumulation**: Continuation transacts appended into one round
//! - **Slot Machine State**: Bet configuration, total bet, big win level, win patterns
//! - **Round Sequencer**: Priority-ordered stage decisions driven by acknowledgement flags
//! - **Scripted Service**: Recorded payload playback for replay and tests
//!
//! ## Architecture
//!
//! ```text
//! GameService ──> RawRoundPayload
//!                      │
//!                      v
//!                RoundParser (cascade loop)
//!                      │
//!                      v
//!                 RoundResult ──> SlotMachine ──> RoundSequencer
//!                                     │
//!                                     v
//!                              MachineEvent (rf-stage)
//! ```

pub mod config;
pub mod error;
pub mod machine;
pub mod model;
pub mod parser;
pub mod paytable;
pub mod scenario;
pub mod sequencer;
pub mod service;
pub mod session;
pub mod wire;

pub use config::*;
pub use error::*;
pub use machine::*;
pub use model::*;
pub use parser::*;
pub use paytable::*;
pub use scenario::*;
pub use sequencer::*;
pub use service::*;
pub use session::*;
pub use wire::*;
