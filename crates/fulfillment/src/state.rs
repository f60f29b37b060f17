//! Fulfillment state machine.

use serde::{Deserialize, Serialize};

use crate::error::FulfillmentStep;

/// The state of one fulfillment attempt.
///
/// State transitions:
/// ```text
/// Pending ──► HeaderWritten ──► LinesWritten ──► StockChecked ──► Committed
///    └──────────────┴─────────────────┴───────────────┴──────────► Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FulfillmentState {
    /// Nothing has been written yet.
    #[default]
    Pending,

    /// The order header is written inside the open transaction.
    HeaderWritten,

    /// All order lines are written inside the open transaction.
    LinesWritten,

    /// Every distinct item was debited.
    StockChecked,

    /// The transaction committed (terminal state).
    Committed,

    /// The transaction was rolled back or never committed (terminal state).
    Aborted,
}

impl FulfillmentState {
    /// Returns the state that follows this one on the success path.
    pub fn next(&self) -> Option<FulfillmentState> {
        match self {
            FulfillmentState::Pending => Some(FulfillmentState::HeaderWritten),
            FulfillmentState::HeaderWritten => Some(FulfillmentState::LinesWritten),
            FulfillmentState::LinesWritten => Some(FulfillmentState::StockChecked),
            FulfillmentState::StockChecked => Some(FulfillmentState::Committed),
            FulfillmentState::Committed | FulfillmentState::Aborted => None,
        }
    }

    /// Returns true if the attempt can move to `target`.
    pub fn can_transition_to(&self, target: FulfillmentState) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == FulfillmentState::Aborted || self.next() == Some(target)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FulfillmentState::Committed | FulfillmentState::Aborted
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentState::Pending => "Pending",
            FulfillmentState::HeaderWritten => "HeaderWritten",
            FulfillmentState::LinesWritten => "LinesWritten",
            FulfillmentState::StockChecked => "StockChecked",
            FulfillmentState::Committed => "Committed",
            FulfillmentState::Aborted => "Aborted",
        }
    }
}

impl std::fmt::Display for FulfillmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress of one fulfillment attempt: its state and the step in flight.
///
/// The step is kept separately from the state because two steps (opening the
/// transaction and writing the header) run while the attempt is `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FulfillmentProgress {
    state: FulfillmentState,
    step: FulfillmentStep,
}

impl FulfillmentProgress {
    /// Creates progress for a fresh attempt.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FulfillmentState {
        self.state
    }

    pub fn step(&self) -> FulfillmentStep {
        self.step
    }

    /// Records the step about to run.
    pub fn start(&mut self, step: FulfillmentStep) {
        tracing::debug!(%step, state = %self.state, "fulfillment step started");
        self.step = step;
    }

    /// Moves to the next state on the success path.
    ///
    /// Ignored if the attempt already reached a terminal state.
    pub fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            self.state = next;
        }
    }

    /// Marks the attempt as aborted unless it already committed.
    pub fn abort(&mut self) {
        if self.state.can_transition_to(FulfillmentState::Aborted) {
            self.state = FulfillmentState::Aborted;
        }
    }
}
