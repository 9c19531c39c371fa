//! MachineEvent — Notifications a slot machine publishes to its observers
//!
//! Every payload carries the values the observer needs; nobody has to reach
//! back into the machine to learn what changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stage::PresentationState;

/// A presentation state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    /// State entered
    pub current: PresentationState,

    /// State left
    pub previous: PresentationState,

    /// Round the transition belongs to (if one is loaded)
    #[serde(default)]
    pub round_id: Option<String>,

    /// Spin cursor at the moment of the transition
    #[serde(default)]
    pub spin_index: usize,

    /// Wall-clock time of the transition
    pub at: DateTime<Utc>,
}

impl StateChange {
    /// Create a transition stamped with the current time
    pub fn new(current: PresentationState, previous: PresentationState) -> Self {
        Self {
            current,
            previous,
            round_id: None,
            spin_index: 0,
            at: Utc::now(),
        }
    }

    /// Attach the round cursor
    pub fn with_round(mut self, round_id: impl Into<String>, spin_index: usize) -> Self {
        self.round_id = Some(round_id.into());
        self.spin_index = spin_index;
        self
    }
}

/// Everything a slot machine announces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MachineEvent {
    /// Presentation state changed
    StateChanged(StateChange),

    /// Coin value per line/way changed
    BetValueChanged { value: f64 },

    /// Bet multiplier changed
    BetQuantityChanged { quantity: u8 },

    /// Reel speed level changed
    GameSpeedLevelChanged { level: u8 },

    /// Presentation moved to another winning line
    LineWinShown { line: usize },

    /// The round is over; read the machine's round result for final totals
    RoundComplete { round_id: String },
}

impl MachineEvent {
    /// Get event type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::StateChanged(_) => "state_changed",
            Self::BetValueChanged { .. } => "bet_value_changed",
            Self::BetQuantityChanged { .. } => "bet_quantity_changed",
            Self::GameSpeedLevelChanged { .. } => "game_speed_level_changed",
            Self::LineWinShown { .. } => "line_win_shown",
            Self::RoundComplete { .. } => "round_complete",
        }
    }

    /// The state transition, if this event is one
    pub fn as_state_change(&self) -> Option<&StateChange> {
        match self {
            Self::StateChanged(change) => Some(change),
            _ => None,
        }
    }
}
