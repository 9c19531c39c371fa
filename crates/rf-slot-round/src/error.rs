//! Round errors

use crate::model::RoundResult;
use crate::sequencer::Acknowledgement;
use crate::service::TransportError;

/// Failure while turning server data into a round
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoundError {
    #[error("Malformed round payload: {0}")]
    Parse(String),

    #[error("No rule pays for {count} x symbol {symbol_id}")]
    RuleNotFound { symbol_id: u32, count: u32 },

    #[error("Cascade did not terminate within {limit} continuation spins")]
    CascadeOverrun { limit: usize },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Machine configuration error: {0}")]
    Config(String),
}

/// A failed round fetch and whatever it had accumulated before failing
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct FetchFailure {
    pub error: RoundError,
    /// Spins parsed before the failure (None if nothing usable was parsed)
    pub partial: Option<RoundResult>,
}

impl FetchFailure {
    pub fn new(error: RoundError) -> Self {
        Self {
            error,
            partial: None,
        }
    }

    pub fn with_partial(mut self, partial: RoundResult) -> Self {
        self.partial = Some(partial);
        self
    }
}

/// Misuse of the round sequencer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("No round is loaded")]
    NoActiveRound,

    #[error("Nothing to acknowledge for {0:?}")]
    NothingToAcknowledge(Acknowledgement),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RoundError::RuleNotFound {
            symbol_id: 201,
            count: 6,
        };
        assert_eq!(err.to_string(), "No rule pays for 6 x symbol 201");

        let err: RoundError = TransportError::new("connection reset").into();
        assert_eq!(err.to_string(), "Transport error: connection reset");
    }

    #[test]
    fn test_fetch_failure_displays_cause() {
        let failure = FetchFailure::new(RoundError::CascadeOverrun { limit: 4 });
        assert!(failure.to_string().contains("4 continuation spins"));
        assert!(failure.partial.is_none());
    }
}
