//! Game Session — Drives one machine against one game service
//!
//! A spin runs the whole transact chain, installs the round and stops at
//! `SpinEnd`. The host then calls [`GameSession::process_spin_result`] once
//! the reels have landed and [`GameSession::acknowledge`] after each stage.

use crossbeam_channel::Receiver;

use rf_stage::{MachineEvent, PresentationState};

use crate::error::{FetchFailure, RoundError, SequenceError};
use crate::machine::SlotMachine;
use crate::model::{RoundType, TransactionType};
use crate::parser::RoundParser;
use crate::sequencer::{Acknowledgement, Decision, RoundSequencer};
use crate::service::{GameService, TransactRequest};
use crate::wire::RawRoundPayload;

/// Stake sent with a feature buy; the server prices the feature itself
pub const FEATURE_BUY_STAKE: f64 = 1.0;

/// Machine, parser and service of one player session
pub struct GameSession<S> {
    machine: SlotMachine,
    parser: RoundParser,
    service: S,
}

impl<S: GameService> GameSession<S> {
    pub fn new(machine: SlotMachine, parser: RoundParser, service: S) -> Self {
        Self {
            machine,
            parser,
            service,
        }
    }

    pub fn machine(&self) -> &SlotMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut SlotMachine {
        &mut self.machine
    }

    pub fn parser(&self) -> &RoundParser {
        &self.parser
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    pub fn into_parts(self) -> (SlotMachine, RoundParser, S) {
        (self.machine, self.parser, self.service)
    }

    pub fn subscribe(&mut self) -> Receiver<MachineEvent> {
        self.machine.subscribe()
    }

    /// Install the round in progress reported at login
    ///
    /// The round is display-only: wins are not decoded, padding symbols are
    /// removed and it is marked complete.
    pub fn restore(&mut self, raw: &RawRoundPayload) -> Result<(), RoundError> {
        let mut round = if raw.current.is_some() {
            let mut round = self.parser.parse_round(raw, false)?;
            self.parser.strip_block_symbols(&mut round);
            round
        } else {
            let mut round = self.machine.dummy_round(None);
            round.next_type = raw.next.kind;
            round
        };
        round.complete = true;
        log::info!("Restored round {} (next {:?})", round.id, round.next_type);

        let dummy = self.machine.dummy_round(None);
        self.machine.set_round_result(round);
        self.machine.set_previous_round_result(dummy);
        self.machine.set_current_state(PresentationState::Idle);
        Ok(())
    }

    /// Paid base game spin
    pub async fn spin(&mut self) -> Result<(), RoundError> {
        self.play(RoundType::Base).await
    }

    /// Feature buy spin
    pub async fn buy_feature(&mut self) -> Result<(), RoundError> {
        self.play(RoundType::FeatureBuy).await
    }

    async fn play(&mut self, round_type: RoundType) -> Result<(), RoundError> {
        let pending = self
            .machine
            .round_result()
            .and_then(|r| r.next_type)
            .unwrap_or(TransactionType::Normal);
        let stake = match round_type {
            RoundType::Base => self.machine.total_bet(),
            RoundType::FeatureBuy => FEATURE_BUY_STAKE,
        };
        let request = TransactRequest {
            line_bet: stake,
            num_lines: self.machine.bet_lines(),
            transaction_type: Some(pending),
            round_type,
        };

        self.machine.set_current_state(PresentationState::Spinning);
        match self.parser.fetch_round(&mut self.service, request).await {
            Ok(round) => {
                self.machine.begin_round(round);
                self.machine.set_current_state(PresentationState::SpinEnd);
                Ok(())
            }
            Err(FetchFailure { error, partial }) => {
                log::error!("Round failed: {error}");
                let fallback = match partial {
                    Some(partial) => partial,
                    None => self.machine.dummy_round(self.machine.round_result()),
                };
                self.machine.begin_round(fallback);
                self.machine
                    .set_current_state(PresentationState::CommunicationError);
                Err(error)
            }
        }
    }

    /// Decide the next stage after the reels land or a stage finishes
    pub fn process_spin_result(&mut self) -> Result<Decision, SequenceError> {
        RoundSequencer::process_spin_result(&mut self.machine)
    }

    pub fn acknowledge(&mut self, ack: Acknowledgement) -> Result<Decision, SequenceError> {
        RoundSequencer::acknowledge(&mut self.machine, ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MachineDescription, MachineOptions, RoundParserConfig};
    use crate::scenario::{PayloadBuilder, ScriptedGameService};

    const GRID: &str = "101,102,103,104|101,105,201,202|101,204,103,104|102,105,201,202|203,204,101,102";

    fn session(service: ScriptedGameService) -> GameSession<ScriptedGameService> {
        let description = MachineDescription::combinations_5x4();
        let parser = RoundParser::new(&description, RoundParserConfig::default()).unwrap();
        GameSession::new(
            SlotMachine::new(description, MachineOptions::default()),
            parser,
            service,
        )
    }

    #[tokio::test]
    async fn test_spin_stops_at_spin_end() {
        let mut session = session(ScriptedGameService::new([PayloadBuilder::new(GRID).build()]));
        let events = session.subscribe();

        session.spin().await.unwrap();
        assert_eq!(session.machine().current_state(), PresentationState::SpinEnd);

        let states: Vec<_> = events
            .try_iter()
            .filter_map(|e| e.as_state_change().map(|c| c.current))
            .collect();
        assert_eq!(
            states,
            vec![PresentationState::Spinning, PresentationState::SpinEnd]
        );

        assert_eq!(session.process_spin_result(), Ok(Decision::CompleteRound));
    }

    #[tokio::test]
    async fn test_request_uses_bet_and_pending_type() {
        let mut session = session(ScriptedGameService::new([
            PayloadBuilder::new(GRID).next(TransactionType::FreeSpin).build(),
            PayloadBuilder::new(GRID).build(),
        ]));
        session.machine_mut().set_current_bet_value(2.0);
        session.machine_mut().set_bet_quantity(3);

        session.spin().await.unwrap();
        session.buy_feature().await.unwrap();

        let requests = session.service().requests();
        assert_eq!(requests[0].transaction_type, Some(TransactionType::Normal));
        assert_eq!(requests[0].line_bet, 120.0);
        assert_eq!(requests[0].num_lines, 20);
        assert_eq!(requests[0].round_type, RoundType::Base);
        assert_eq!(requests[1].transaction_type, Some(TransactionType::FreeSpin));
        assert_eq!(requests[1].round_type, RoundType::FeatureBuy);
        assert_eq!(requests[1].line_bet, FEATURE_BUY_STAKE);
    }

    #[tokio::test]
    async fn test_cascade_continuations_repeat_the_stake() {
        let mut session = session(ScriptedGameService::new([
            PayloadBuilder::new(GRID)
                .bet(6.0, 20, 120.0)
                .combination(101, 1.0, &["0-0", "1-0", "2-0"], 1.0)
                .next(TransactionType::Respin)
                .build(),
            PayloadBuilder::new(GRID)
                .bet(6.0, 20, 120.0)
                .next(TransactionType::Normal)
                .build(),
        ]));
        session.machine_mut().set_current_bet_value(2.0);
        session.machine_mut().set_bet_quantity(3);

        session.spin().await.unwrap();

        let requests = session.service().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].line_bet, session.machine().total_bet());
        assert_eq!(requests[1].line_bet, requests[0].line_bet);
        assert_eq!(requests[1].transaction_type, Some(TransactionType::Respin));
    }

    #[tokio::test]
    async fn test_feature_buy_continuations_repeat_the_stake() {
        let mut session = session(ScriptedGameService::new([
            PayloadBuilder::new(GRID).next(TransactionType::Respin).build(),
            PayloadBuilder::new(GRID).next(TransactionType::FreeSpin).build(),
        ]));

        session.buy_feature().await.unwrap();

        let requests = session.service().requests();
        assert!(requests.iter().all(|r| r.line_bet == FEATURE_BUY_STAKE));
        assert!(requests.iter().all(|r| r.round_type == RoundType::FeatureBuy));
    }

    #[tokio::test]
    async fn test_feature_buy_without_win_starts_free_spins() {
        let mut session = session(ScriptedGameService::new([PayloadBuilder::new(GRID)
            .next_free_spins(10)
            .next(TransactionType::FreeSpin)
            .build()]));

        session.buy_feature().await.unwrap();

        let spin = &session.machine().round_result().unwrap().spins[0];
        assert!(spin.win.is_none());
        assert_eq!(
            session.process_spin_result(),
            Ok(Decision::Transition(PresentationState::FreeSpinsRoundStart))
        );
    }

    #[tokio::test]
    async fn test_failure_installs_dummy_of_previous() {
        let mut session = session(
            ScriptedGameService::new([PayloadBuilder::new(GRID)
                .next(TransactionType::FreeSpin)
                .build()])
            .fail_after(1, "offline"),
        );
        session.spin().await.unwrap();
        let last_grid = session.machine().current_spin_result().unwrap().reel_grid.clone();

        let err = session.spin().await.unwrap_err();
        assert!(matches!(err, RoundError::Transport(_)));
        assert_eq!(
            session.machine().current_state(),
            PresentationState::CommunicationError
        );

        let round = session.machine().round_result().unwrap();
        assert_eq!(round.spins[0].reel_grid, last_grid);
        assert_eq!(round.next_type, Some(TransactionType::FreeSpin));
        assert_eq!(round.total_win_value, 0.0);
    }

    #[tokio::test]
    async fn test_restore_strips_block_symbols() {
        let mut session = session(ScriptedGameService::default());
        let raw = PayloadBuilder::new("0,101,102,0|101,102,103,104|0,0,105,0|1,2,3,4|5,6,7,8")
            .combination(101, 1.0, &["0-1", "1-0"], 1.0)
            .next(TransactionType::FreeSpin)
            .build();

        session.restore(&raw).unwrap();

        let machine = session.machine();
        assert_eq!(machine.current_state(), PresentationState::Idle);
        let round = machine.round_result().unwrap();
        assert!(round.complete);
        assert!(round.spins[0].win.is_none());
        assert_eq!(round.spins[0].reel_grid[0], vec![101, 102]);
        assert_eq!(round.spins[0].reel_grid[2], vec![105]);
        assert_eq!(round.next_type, Some(TransactionType::FreeSpin));
        assert!(machine.previous_round_result().unwrap().next_type.is_none());
    }

    #[tokio::test]
    async fn test_restore_without_round_in_progress() {
        let mut session = session(ScriptedGameService::default());
        let raw = RawRoundPayload::from_json(r#"{ "Next": { "Type": 1 } }"#).unwrap();

        session.restore(&raw).unwrap();
        let round = session.machine().round_result().unwrap();
        assert_eq!(round.spins[0].reel_grid.len(), 5);
        assert_eq!(round.next_type, Some(TransactionType::Normal));
    }
}
