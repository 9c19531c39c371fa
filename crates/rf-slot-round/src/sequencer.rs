//! Round Sequencer — Walks a round through its presentation stages
//!
//! The sequencer keeps no state of its own. Everything it needs is in the
//! acknowledgement flags of the current spin and round, so [`RoundSequencer::decide`]
//! can be called any number of times and lands on the same stage until a
//! flag changes.
//!
//! ## Priority
//!
//! First match wins:
//! 1. Unshown win → `SpinResultMultiWin`
//! 2. Unshown scatter → `SpinResultScatter`
//! 3. Cascading machine with another accumulated spin → advance, `SpinResultCascade`
//! 4. Unshown bonus → `SpinResultBonusGame`
//! 5. Unfinished bonus → `BonusGame`
//! 6. Unshown free-spin award → `SpinResultFreeSpins`
//! 7. Free-spin round not complete → `FreeSpinsRoundStart` / `FreeSpins` / `FreeSpinsRoundEnd`
//! 8. Big win not shown → `BigWin`
//! 9. Round already complete → nothing
//! 10. Complete the round → `Idle`

use rf_stage::{MachineEvent, PresentationState};

use crate::error::SequenceError;
use crate::machine::{SharedMachine, SlotMachine};
use crate::model::RoundResult;

/// Presentation stage confirmations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Acknowledgement {
    MultiWin,
    Scatter,
    BonusShown,
    BonusComplete,
    FreeSpinWin,
    FreeSpinsStarted,
    FreeSpinsComplete,
    BigWinShown,
}

impl Acknowledgement {
    /// Stage this acknowledgement confirms
    pub fn stage(&self) -> PresentationState {
        match self {
            Self::MultiWin => PresentationState::SpinResultMultiWin,
            Self::Scatter => PresentationState::SpinResultScatter,
            Self::BonusShown => PresentationState::SpinResultBonusGame,
            Self::BonusComplete => PresentationState::BonusGame,
            Self::FreeSpinWin => PresentationState::SpinResultFreeSpins,
            Self::FreeSpinsStarted => PresentationState::FreeSpinsRoundStart,
            Self::FreeSpinsComplete => PresentationState::FreeSpinsRoundEnd,
            Self::BigWinShown => PresentationState::BigWin,
        }
    }

    /// Acknowledgement for a stage, if the stage takes one
    pub fn for_stage(state: PresentationState) -> Option<Self> {
        Self::all().iter().copied().find(|ack| ack.stage() == state)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::MultiWin => "confirm-multi-win",
            Self::Scatter => "confirm-scatter",
            Self::BonusShown => "confirm-bonus",
            Self::BonusComplete => "confirm-bonus-complete",
            Self::FreeSpinWin => "confirm-freespin-win",
            Self::FreeSpinsStarted => "confirm-freespins-started",
            Self::FreeSpinsComplete => "confirm-freespins-complete",
            Self::BigWinShown => "confirm-big-win-shown",
        }
    }

    pub fn all() -> &'static [Acknowledgement] {
        &[
            Self::MultiWin,
            Self::Scatter,
            Self::BonusShown,
            Self::BonusComplete,
            Self::FreeSpinWin,
            Self::FreeSpinsStarted,
            Self::FreeSpinsComplete,
            Self::BigWinShown,
        ]
    }
}

/// Outcome of one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Enter a presentation stage
    Transition(PresentationState),
    /// Move to the next accumulated spin and present the cascade
    AdvanceCascade,
    /// Mark the round complete and return to idle
    CompleteRound,
    /// Round already complete
    NoOp,
}

/// Stateless round sequencer
pub struct RoundSequencer;

impl RoundSequencer {
    /// Next step for the machine's current round; mutates nothing
    pub fn decide(machine: &SlotMachine) -> Result<Decision, SequenceError> {
        let round = machine.round_result().ok_or(SequenceError::NoActiveRound)?;
        let spin = round.current_spin().ok_or(SequenceError::NoActiveRound)?;

        if let Some(win) = &spin.win {
            if !win.multi_win_shown {
                return Ok(Decision::Transition(PresentationState::SpinResultMultiWin));
            }
            if win.scatters.is_some() && !win.scatter_win_shown {
                return Ok(Decision::Transition(PresentationState::SpinResultScatter));
            }
        }

        if machine.is_cascading() && round.next_spin().is_some() {
            return Ok(Decision::AdvanceCascade);
        }

        if let Some(bonus) = &spin.bonus {
            if !bonus.bonus_game_shown {
                return Ok(Decision::Transition(PresentationState::SpinResultBonusGame));
            }
            if !bonus.bonus_game_complete {
                return Ok(Decision::Transition(PresentationState::BonusGame));
            }
        }

        if let Some(freespins) = &spin.freespins {
            let award_unshown = spin
                .win
                .as_ref()
                .is_some_and(|w| w.freespins.is_some() && !w.freespin_win_shown);
            if award_unshown {
                return Ok(Decision::Transition(PresentationState::SpinResultFreeSpins));
            }
            if !freespins.round_complete {
                let state = if !freespins.round_started {
                    PresentationState::FreeSpinsRoundStart
                } else if freespins.remaining_count > 0 {
                    PresentationState::FreeSpins
                } else {
                    PresentationState::FreeSpinsRoundEnd
                };
                return Ok(Decision::Transition(state));
            }
        }

        if machine.big_win_level(round).is_some() && !machine.big_win_shown() {
            return Ok(Decision::Transition(PresentationState::BigWin));
        }

        if round.complete {
            return Ok(Decision::NoOp);
        }

        Ok(Decision::CompleteRound)
    }

    /// Decide and apply the decision
    pub fn process_spin_result(machine: &mut SlotMachine) -> Result<Decision, SequenceError> {
        let decision = Self::decide(machine)?;
        match decision {
            Decision::Transition(state) => {
                machine.set_current_state(state);
            }
            Decision::AdvanceCascade => {
                let round = machine
                    .round_result_mut()
                    .ok_or(SequenceError::NoActiveRound)?;
                advance_cascade(round);
                machine.enter_state(PresentationState::SpinResultCascade);
            }
            Decision::CompleteRound => {
                let round = machine
                    .round_result_mut()
                    .ok_or(SequenceError::NoActiveRound)?;
                round.complete = true;
                let round_id = round.id.clone();
                log::info!("Round {round_id} complete");

                machine.set_current_state(PresentationState::Idle);
                machine.publish(MachineEvent::RoundComplete { round_id });
            }
            Decision::NoOp => {}
        }
        Ok(decision)
    }

    /// Confirm a stage, then decide again
    ///
    /// Only the flag owned by `ack` is set. An acknowledgement that arrives
    /// while the machine is in a different stage is stale and changes
    /// nothing; one for data the spin does not carry is an error.
    pub fn acknowledge(
        machine: &mut SlotMachine,
        ack: Acknowledgement,
    ) -> Result<Decision, SequenceError> {
        let in_stage = machine.current_state() == ack.stage();

        if ack == Acknowledgement::BigWinShown {
            let round = machine.round_result().ok_or(SequenceError::NoActiveRound)?;
            if machine.big_win_level(round).is_none() {
                return Err(SequenceError::NothingToAcknowledge(ack));
            }
            if !in_stage {
                log::debug!("Stale {}", ack.type_name());
                return Ok(Decision::NoOp);
            }
            machine.set_big_win_shown(true);
            return Self::process_spin_result(machine);
        }

        let spin = machine
            .round_result_mut()
            .and_then(RoundResult::current_spin_mut)
            .ok_or(SequenceError::NoActiveRound)?;

        let flag = match ack {
            Acknowledgement::MultiWin => spin.win.as_mut().map(|w| &mut w.multi_win_shown),
            Acknowledgement::Scatter => spin
                .win
                .as_mut()
                .filter(|w| w.scatters.is_some())
                .map(|w| &mut w.scatter_win_shown),
            Acknowledgement::BonusShown => spin.bonus.as_mut().map(|b| &mut b.bonus_game_shown),
            Acknowledgement::BonusComplete => {
                spin.bonus.as_mut().map(|b| &mut b.bonus_game_complete)
            }
            Acknowledgement::FreeSpinWin => spin
                .win
                .as_mut()
                .filter(|w| w.freespins.is_some())
                .map(|w| &mut w.freespin_win_shown),
            Acknowledgement::FreeSpinsStarted => {
                spin.freespins.as_mut().map(|f| &mut f.round_started)
            }
            Acknowledgement::FreeSpinsComplete => {
                spin.freespins.as_mut().map(|f| &mut f.round_complete)
            }
            Acknowledgement::BigWinShown => None,
        };
        let Some(flag) = flag else {
            return Err(SequenceError::NothingToAcknowledge(ack));
        };
        if !in_stage {
            log::debug!("Stale {}", ack.type_name());
            return Ok(Decision::NoOp);
        }
        *flag = true;

        Self::process_spin_result(machine)
    }

    /// [`Self::acknowledge`] on a machine shared between threads
    pub fn acknowledge_shared(
        machine: &SharedMachine,
        ack: Acknowledgement,
    ) -> Result<Decision, SequenceError> {
        let mut machine = machine.lock();
        Self::acknowledge(&mut machine, ack)
    }
}

/// Advance the spin cursor; free-spin progress flags already acknowledged stay set
fn advance_cascade(round: &mut RoundResult) {
    let acknowledged = round
        .current_spin()
        .and_then(|s| s.freespins.as_ref())
        .map(|f| (f.round_started, f.round_complete));

    if !round.advance() {
        return;
    }
    if let (Some((started, complete)), Some(freespins)) = (
        acknowledged,
        round.current_spin_mut().and_then(|s| s.freespins.as_mut()),
    ) {
        freespins.round_started |= started;
        freespins.round_complete |= complete;
    }
}
