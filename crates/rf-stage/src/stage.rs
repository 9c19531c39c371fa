//! PresentationState — The canonical phases a slot round walks through
//!
//! A state is NOT an animation and NOT a popup.
//! It is the SEMANTIC MEANING of the moment the presentation layer must show.

use serde::{Deserialize, Serialize};

/// Canonical presentation state of a slot machine
///
/// The round sequencer moves the machine between these states; the
/// presentation layer reacts to them and acknowledges each stage it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationState {
    // ═══════════════════════════════════════════════════════════════════════
    // SESSION LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Machine constructed, no round shown yet
    #[default]
    NotInitialized,

    /// Round finished (or none started), ready for the next spin
    Idle,

    /// Fatal transport failure; holds until the host recovers
    CommunicationError,

    // ═══════════════════════════════════════════════════════════════════════
    // SPIN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Wager placed, waiting for the server round
    Spinning,

    /// Reels stopped on the received grid
    SpinEnd,

    // ═══════════════════════════════════════════════════════════════════════
    // WIN PRESENTATION
    // ═══════════════════════════════════════════════════════════════════════
    /// All winning cells of the current spin highlighted at once
    SpinResultMultiWin,

    /// Scatter win highlighted
    SpinResultScatter,

    /// Cascade: the next accumulated spin replaces the grid
    SpinResultCascade,

    /// Big win celebration
    BigWin,

    // ═══════════════════════════════════════════════════════════════════════
    // BONUS
    // ═══════════════════════════════════════════════════════════════════════
    /// Bonus game trigger shown
    SpinResultBonusGame,

    /// Bonus game in progress
    BonusGame,

    // ═══════════════════════════════════════════════════════════════════════
    // FREE SPINS
    // ═══════════════════════════════════════════════════════════════════════
    /// Free spins award shown
    SpinResultFreeSpins,

    /// Free spins sub-round intro
    FreeSpinsRoundStart,

    /// Free spins remaining, next free spin pending
    FreeSpins,

    /// Free spins exhausted, outro pending
    FreeSpinsRoundEnd,
}

impl PresentationState {
    /// Get category for grouping
    pub fn category(&self) -> StateCategory {
        match self {
            Self::NotInitialized | Self::Idle | Self::CommunicationError => {
                StateCategory::Session
            }
            Self::Spinning | Self::SpinEnd => StateCategory::SpinLifecycle,
            Self::SpinResultMultiWin
            | Self::SpinResultScatter
            | Self::SpinResultCascade
            | Self::BigWin => StateCategory::WinPresentation,
            Self::SpinResultBonusGame | Self::BonusGame => StateCategory::Bonus,
            Self::SpinResultFreeSpins
            | Self::FreeSpinsRoundStart
            | Self::FreeSpins
            | Self::FreeSpinsRoundEnd => StateCategory::FreeSpins,
        }
    }

    /// Get the type name (matches the serde representation)
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::Idle => "idle",
            Self::CommunicationError => "communication_error",
            Self::Spinning => "spinning",
            Self::SpinEnd => "spin_end",
            Self::SpinResultMultiWin => "spin_result_multi_win",
            Self::SpinResultScatter => "spin_result_scatter",
            Self::SpinResultCascade => "spin_result_cascade",
            Self::BigWin => "big_win",
            Self::SpinResultBonusGame => "spin_result_bonus_game",
            Self::BonusGame => "bonus_game",
            Self::SpinResultFreeSpins => "spin_result_free_spins",
            Self::FreeSpinsRoundStart => "free_spins_round_start",
            Self::FreeSpins => "free_spins",
            Self::FreeSpinsRoundEnd => "free_spins_round_end",
        }
    }

    /// Terminal for a round: the next round starts from here
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Idle | Self::CommunicationError)
    }

    /// Does the presentation layer owe an acknowledgement for this state?
    pub fn awaits_acknowledgement(&self) -> bool {
        matches!(
            self,
            Self::SpinResultMultiWin
                | Self::SpinResultScatter
                | Self::SpinResultBonusGame
                | Self::BonusGame
                | Self::SpinResultFreeSpins
                | Self::FreeSpinsRoundStart
                | Self::FreeSpinsRoundEnd
                | Self::BigWin
        )
    }

    /// Get all valid state type names for validation
    pub fn all_type_names() -> &'static [&'static str] {
        &[
            "not_initialized",
            "idle",
            "communication_error",
            "spinning",
            "spin_end",
            "spin_result_multi_win",
            "spin_result_scatter",
            "spin_result_cascade",
            "big_win",
            "spin_result_bonus_game",
            "bonus_game",
            "spin_result_free_spins",
            "free_spins_round_start",
            "free_spins",
            "free_spins_round_end",
        ]
    }

    /// Resolve a state from its type name (case-insensitive)
    pub fn from_type_name(name: &str) -> Option<Self> {
        let name_lower = name.to_lowercase();
        let state = match name_lower.as_str() {
            "not_initialized" => Self::NotInitialized,
            "idle" => Self::Idle,
            "communication_error" => Self::CommunicationError,
            "spinning" => Self::Spinning,
            "spin_end" => Self::SpinEnd,
            "spin_result_multi_win" => Self::SpinResultMultiWin,
            "spin_result_scatter" => Self::SpinResultScatter,
            "spin_result_cascade" => Self::SpinResultCascade,
            "big_win" => Self::BigWin,
            "spin_result_bonus_game" => Self::SpinResultBonusGame,
            "bonus_game" => Self::BonusGame,
            "spin_result_free_spins" => Self::SpinResultFreeSpins,
            "free_spins_round_start" => Self::FreeSpinsRoundStart,
            "free_spins" => Self::FreeSpins,
            "free_spins_round_end" => Self::FreeSpinsRoundEnd,
            _ => return None,
        };
        Some(state)
    }
}

impl std::fmt::Display for PresentationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// State category for grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateCategory {
    Session,
    SpinLifecycle,
    WinPresentation,
    Bonus,
    FreeSpins,
}

impl StateCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Session => "Session",
            Self::SpinLifecycle => "Spin Lifecycle",
            Self::WinPresentation => "Win Presentation",
            Self::Bonus => "Bonus Games",
            Self::FreeSpins => "Free Spins",
        }
    }
}
