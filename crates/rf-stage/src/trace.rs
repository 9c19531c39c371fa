//! StageTrace — The recorded presentation history of one or more rounds
//!
//! A trace captures every state transition in arrival order, plus the
//! round-complete markers that close each round.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{MachineEvent, StateChange};
use crate::stage::{PresentationState, StateCategory};

/// A complete trace of state transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    /// Unique identifier for this trace
    pub trace_id: String,

    /// Game identifier
    pub game_id: String,

    /// All transitions in arrival order
    pub transitions: Vec<StateChange>,

    /// Rounds that signalled completion, in order
    #[serde(default)]
    pub completed_rounds: Vec<String>,

    /// When this trace was started
    pub recorded_at: DateTime<Utc>,

    /// Custom metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl StageTrace {
    /// Create a new empty trace
    pub fn new(trace_id: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            game_id: game_id.into(),
            transitions: Vec::new(),
            completed_rounds: Vec::new(),
            recorded_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Record a machine event; only transitions and completions are kept
    pub fn record(&mut self, event: &MachineEvent) {
        match event {
            MachineEvent::StateChanged(change) => self.transitions.push(change.clone()),
            MachineEvent::RoundComplete { round_id } => {
                self.completed_rounds.push(round_id.clone())
            }
            _ => {}
        }
    }

    /// Record every event from an iterator
    pub fn record_all<'a>(&mut self, events: impl IntoIterator<Item = &'a MachineEvent>) {
        for event in events {
            self.record(event);
        }
    }

    /// Entered states in order
    pub fn states(&self) -> Vec<PresentationState> {
        self.transitions.iter().map(|t| t.current).collect()
    }

    /// Check if the trace ever entered a state
    pub fn has_state(&self, state: PresentationState) -> bool {
        self.transitions.iter().any(|t| t.current == state)
    }

    /// Transitions by category
    pub fn transitions_by_category(&self, category: StateCategory) -> Vec<&StateChange> {
        self.transitions
            .iter()
            .filter(|t| t.current.category() == category)
            .collect()
    }

    /// Number of cascade steps presented
    pub fn cascade_count(&self) -> usize {
        self.transitions
            .iter()
            .filter(|t| t.current == PresentationState::SpinResultCascade)
            .count()
    }

    /// Validate structural expectations of the trace
    pub fn validate(&self) -> TraceValidation {
        let mut chained = true;
        for pair in self.transitions.windows(2) {
            if pair[1].previous != pair[0].current {
                chained = false;
                break;
            }
        }

        let mut duplicate_completion = false;
        for (i, id) in self.completed_rounds.iter().enumerate() {
            if self.completed_rounds[..i].contains(id) {
                duplicate_completion = true;
                break;
            }
        }

        TraceValidation {
            chained,
            duplicate_completion,
            ends_terminal: self
                .transitions
                .last()
                .is_some_and(|t| t.current.is_terminal()),
            round_count: self.completed_rounds.len(),
        }
    }
}

/// Validation result for a trace
#[derive(Debug, Clone, Default)]
pub struct TraceValidation {
    /// Each transition leaves the state the previous one entered
    pub chained: bool,
    /// Some round signalled completion twice
    pub duplicate_completion: bool,
    /// Last transition entered IDLE or COMMUNICATION_ERROR
    pub ends_terminal: bool,
    pub round_count: usize,
}

impl TraceValidation {
    pub fn is_valid(&self) -> bool {
        self.chained && !self.duplicate_completion
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();

        if !self.chained {
            warnings.push("Transition does not leave the previously entered state");
        }
        if self.duplicate_completion {
            warnings.push("Round completion signalled more than once");
        }
        if !self.ends_terminal {
            warnings.push("Trace does not end in a terminal state");
        }

        warnings
    }
}
