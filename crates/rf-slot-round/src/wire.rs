//! Raw transact payloads as the game server sends them

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RoundError;
use crate::model::TransactionType;

/// One transact (or login) response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRoundPayload {
    /// Outcome of the transact; absent on a login with no round in progress
    #[serde(rename = "Current", default, skip_serializing_if = "Option::is_none")]
    pub current: Option<RawCurrent>,
    #[serde(rename = "Next", default)]
    pub next: RawNext,
}

impl RawRoundPayload {
    pub fn from_json(json: &str) -> Result<Self, RoundError> {
        serde_json::from_str(json).map_err(|e| RoundError::Parse(e.to_string()))
    }

    /// Is the server continuing this round with another transact?
    pub fn continues(&self) -> bool {
        self.next.kind.is_some_and(|t| t.is_continuation())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCurrent {
    #[serde(rename = "Round")]
    pub round: RawRound,
    #[serde(rename = "Result")]
    pub result: RawResult,
    /// Sparse `"x,y" -> multiplier` map
    #[serde(rename = "MultiplierMap", default)]
    pub multiplier_map: BTreeMap<String, f64>,
    #[serde(rename = "FreeSpin", default, skip_serializing_if = "Option::is_none")]
    pub free_spin: Option<RawCurrentFreeSpin>,
    /// Win of this spin
    #[serde(rename = "AccWin", default)]
    pub acc_win: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRound {
    #[serde(rename = "LineBet")]
    pub line_bet: f64,
    #[serde(rename = "Line")]
    pub line: u32,
    #[serde(rename = "Bet")]
    pub bet: f64,
    #[serde(rename = "Payout")]
    pub payout: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    /// Reel columns separated by `|`, symbols by `,`
    #[serde(rename = "R")]
    pub reels: String,
    #[serde(rename = "WR", default)]
    pub wins: Vec<RawWinRecord>,
    /// Scatter count
    #[serde(rename = "SC", default)]
    pub scatter_count: u32,
}

/// A `WR` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawWinRecord {
    /// `{T: 1, R: "CoinPayout,Line,Count,Multiplier,Symbol,Direction|..."}`
    Lines {
        #[serde(rename = "T")]
        kind: u32,
        #[serde(rename = "R")]
        records: String,
    },
    /// A ways win with `"reel-row"` cell tokens
    Combination {
        symbol: u32,
        #[serde(rename = "wayPayout")]
        way_payout: f64,
        way: Vec<String>,
        #[serde(default = "default_multiplier")]
        multiplier: f64,
    },
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCurrentFreeSpin {
    #[serde(rename = "Current")]
    pub current: u32,
    #[serde(rename = "Total")]
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNext {
    #[serde(rename = "Type", default)]
    pub kind: Option<TransactionType>,
    #[serde(rename = "FreeSpin", default, skip_serializing_if = "Option::is_none")]
    pub free_spin: Option<RawNextFreeSpin>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNextFreeSpin {
    #[serde(rename = "Total")]
    pub total: u32,
}
