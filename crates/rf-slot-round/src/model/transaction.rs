//! Transaction kinds

use serde::{Deserialize, Serialize};

/// Kind of the next transact the server expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum TransactionType {
    /// Regular paid spin
    Normal,
    /// Spin inside a free-spin sub-round
    FreeSpin,
    /// Cascade continuation of the current round
    Respin,
    /// Cascade continuation inside a free-spin sub-round
    RespinInFreeSpin,
    /// Any code this client does not interpret
    Other(u32),
}

impl TransactionType {
    pub fn code(&self) -> u32 {
        match self {
            Self::Normal => 1,
            Self::FreeSpin => 2,
            Self::Respin => 3,
            Self::RespinInFreeSpin => 4,
            Self::Other(code) => *code,
        }
    }

    /// The server is continuing the same round
    pub fn is_continuation(&self) -> bool {
        matches!(self, Self::Respin | Self::RespinInFreeSpin)
    }
}

impl From<u32> for TransactionType {
    fn from(code: u32) -> Self {
        match code {
            1 => Self::Normal,
            2 => Self::FreeSpin,
            3 => Self::Respin,
            4 => Self::RespinInFreeSpin,
            other => Self::Other(other),
        }
    }
}

impl From<TransactionType> for u32 {
    fn from(kind: TransactionType) -> Self {
        kind.code()
    }
}

/// What the player paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundType {
    #[default]
    Base,
    FeatureBuy,
}

impl RoundType {
    pub fn code(&self) -> u32 {
        match self {
            Self::Base => 1,
            Self::FeatureBuy => 2,
        }
    }
}
