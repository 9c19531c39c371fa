//! Game service collaborator
//!
//! The core never talks to the network itself. Whatever owns the
//! connection implements [`GameService`]; retries and backoff live there.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::model::{RoundType, TransactionType};
use crate::wire::RawRoundPayload;

/// Arguments of one transact call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransactRequest {
    /// Stake of the round; the same value is sent on every continuation
    pub line_bet: f64,
    /// Lines (or ways) played
    pub num_lines: u32,
    /// Pending transaction kind (None before the first round)
    pub transaction_type: Option<TransactionType>,
    pub round_type: RoundType,
}

/// The transact call failed before a payload arrived
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Transport error: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Server round source
pub trait GameService {
    /// Run one transact; called strictly sequentially within a round
    fn transact(
        &mut self,
        request: TransactRequest,
    ) -> impl Future<Output = Result<RawRoundPayload, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = TransactRequest {
            line_bet: 1.0,
            num_lines: 20,
            transaction_type: Some(TransactionType::Respin),
            round_type: RoundType::Base,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"transaction_type\":3"));

        let back: TransactRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
