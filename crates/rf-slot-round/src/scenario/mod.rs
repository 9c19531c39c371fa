//! Scenario System — Scripted server responses
//!
//! Replays recorded or hand-built transact payloads in place of a live
//! game server, for demos, replay tooling and tests.
//!
//! ## Key Components
//!
//! - `RoundScript` — A serializable queue of responses
//! - `ScriptStep` — One payload or one injected transport failure
//! - `ScriptedGameService` — `GameService` that plays a script back
//! - `PayloadBuilder` — Fluent construction of raw payloads
//!
//! ## Built-in Presets
//!
//! - `no_win` — Dead spin
//! - `line_win` — Single payline win (lines machine)
//! - `cascade_chain` — Ways win followed by respins
//! - `free_spins_trigger` — Scatter awarding free spins
//! - `big_win` — Win above the first big win level
//! - `connection_drop` — Transport failure mid-cascade

mod presets;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::TransactionType;
use crate::service::{GameService, TransactRequest, TransportError};
use crate::wire::{
    RawCurrent, RawCurrentFreeSpin, RawNextFreeSpin, RawResult, RawRound, RawRoundPayload,
    RawWinRecord,
};

pub use presets::*;

/// One scripted server response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Answer with this payload
    Payload { payload: RawRoundPayload },
    /// Fail the transact
    Failure { message: String },
}

/// A named queue of responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundScript {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Machine preset the payloads were built for
    pub machine: String,
    /// Rounds to play
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    pub steps: Vec<ScriptStep>,
}

fn default_rounds() -> u32 {
    1
}

impl RoundScript {
    pub fn new(id: impl Into<String>, name: impl Into<String>, machine: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            machine: machine.into(),
            rounds: 1,
            steps: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn add_payload(mut self, payload: RawRoundPayload) -> Self {
        self.steps.push(ScriptStep::Payload { payload });
        self
    }

    pub fn add_failure(mut self, message: impl Into<String>) -> Self {
        self.steps.push(ScriptStep::Failure {
            message: message.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// `GameService` answering from a fixed queue
#[derive(Debug, Clone, Default)]
pub struct ScriptedGameService {
    steps: VecDeque<ScriptStep>,
    requests: Vec<TransactRequest>,
}

impl ScriptedGameService {
    pub fn new(payloads: impl IntoIterator<Item = RawRoundPayload>) -> Self {
        Self {
            steps: payloads
                .into_iter()
                .map(|payload| ScriptStep::Payload { payload })
                .collect(),
            requests: Vec::new(),
        }
    }

    pub fn from_script(script: &RoundScript) -> Self {
        Self {
            steps: script.steps.iter().cloned().collect(),
            requests: Vec::new(),
        }
    }

    /// Fail the transact at queue position `index` (0 is the next call)
    pub fn fail_after(mut self, index: usize, message: impl Into<String>) -> Self {
        let index = index.min(self.steps.len());
        self.steps.insert(
            index,
            ScriptStep::Failure {
                message: message.into(),
            },
        );
        self
    }

    pub fn push(&mut self, payload: RawRoundPayload) {
        self.steps.push_back(ScriptStep::Payload { payload });
    }

    /// Every request received, in order
    pub fn requests(&self) -> &[TransactRequest] {
        &self.requests
    }

    /// Responses not yet played
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl GameService for ScriptedGameService {
    async fn transact(&mut self, request: TransactRequest) -> Result<RawRoundPayload, TransportError> {
        self.requests.push(request);
        match self.steps.pop_front() {
            Some(ScriptStep::Payload { payload }) => Ok(payload),
            Some(ScriptStep::Failure { message }) => Err(TransportError(message)),
            None => Err(TransportError::new("Script exhausted")),
        }
    }
}

/// Fluent raw payload construction
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    current: RawCurrent,
    payload: RawRoundPayload,
}

impl PayloadBuilder {
    /// Payload showing `grid` (`"a,b|c,d"`), 1 coin on 20 lines, no win
    pub fn new(grid: &str) -> Self {
        let current = RawCurrent {
            round: RawRound {
                line_bet: 1.0,
                line: 20,
                bet: 20.0,
                payout: 0.0,
            },
            result: RawResult {
                reels: grid.to_string(),
                wins: Vec::new(),
                scatter_count: 0,
            },
            ..Default::default()
        };
        let mut payload = RawRoundPayload::default();
        payload.next.kind = Some(TransactionType::Normal);
        Self { current, payload }
    }

    pub fn bet(mut self, line_bet: f64, lines: u32, bet: f64) -> Self {
        self.current.round.line_bet = line_bet;
        self.current.round.line = lines;
        self.current.round.bet = bet;
        self
    }

    /// Round payout so far
    pub fn payout(mut self, payout: f64) -> Self {
        self.current.round.payout = payout;
        self
    }

    /// Win of this spin
    pub fn acc_win(mut self, acc_win: f64) -> Self {
        self.current.acc_win = acc_win;
        self
    }

    pub fn combination(mut self, symbol: u32, way_payout: f64, way: &[&str], multiplier: f64) -> Self {
        self.current.result.wins.push(RawWinRecord::Combination {
            symbol,
            way_payout,
            way: way.iter().map(|c| c.to_string()).collect(),
            multiplier,
        });
        self
    }

    /// Line win records, `CoinPayout,Line,Count,Multiplier,Symbol,Direction|...`
    pub fn lines(mut self, records: &str) -> Self {
        self.current.result.wins.push(RawWinRecord::Lines {
            kind: 1,
            records: records.to_string(),
        });
        self
    }

    pub fn scatter(mut self, count: u32) -> Self {
        self.current.result.scatter_count = count;
        self
    }

    pub fn multiplier(mut self, x: u32, y: u32, multiplier: f64) -> Self {
        self.current
            .multiplier_map
            .insert(format!("{x},{y}"), multiplier);
        self
    }

    /// Free spin `current` of `total` is being played
    pub fn free_spin(mut self, current: u32, total: u32) -> Self {
        self.current.free_spin = Some(RawCurrentFreeSpin { current, total });
        self
    }

    pub fn next(mut self, kind: TransactionType) -> Self {
        self.payload.next.kind = Some(kind);
        self
    }

    /// Free spins awarded for the next transacts
    pub fn next_free_spins(mut self, total: u32) -> Self {
        self.payload.next.free_spin = Some(RawNextFreeSpin { total });
        self
    }

    pub fn build(self) -> RawRoundPayload {
        RawRoundPayload {
            current: Some(self.current),
            ..self.payload
        }
    }
}
