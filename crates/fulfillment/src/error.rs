//! Fulfillment error types.

use std::time::Duration;

use common::OrderId;
use order_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ValidationError;

/// A storage step of the fulfillment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FulfillmentStep {
    #[default]
    Begin,
    InsertHeader,
    InsertLines,
    DecrementStock,
    Commit,
    Rollback,
}

impl FulfillmentStep {
    /// Returns the step name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStep::Begin => "begin",
            FulfillmentStep::InsertHeader => "insert_header",
            FulfillmentStep::InsertLines => "insert_lines",
            FulfillmentStep::DecrementStock => "decrement_stock",
            FulfillmentStep::Commit => "commit",
            FulfillmentStep::Rollback => "rollback",
        }
    }
}

impl std::fmt::Display for FulfillmentStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`FulfillmentCoordinator::fulfill_order`].
///
/// [`FulfillmentCoordinator::fulfill_order`]: crate::FulfillmentCoordinator::fulfill_order
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The request failed validation; storage was never touched.
    #[error("Invalid order: {0}")]
    Invalid(#[from] ValidationError),

    /// At least one item lacked the requested stock; nothing was written.
    #[error("Insufficient stock: only {decremented} of {requested} items could be debited")]
    InsufficientStock { requested: usize, decremented: u64 },

    /// A storage step failed; nothing was written.
    #[error("Persistence failure during {step}: {source}")]
    PersistenceFailure {
        step: FulfillmentStep,
        #[source]
        source: StoreError,
    },

    /// The attempt ran out of time; nothing was written.
    #[error("Fulfillment timed out during {step} after {after:?}")]
    TimedOut {
        step: FulfillmentStep,
        after: Duration,
    },
}

impl FulfillmentError {
    pub(crate) fn persistence(step: FulfillmentStep, source: StoreError) -> Self {
        FulfillmentError::PersistenceFailure { step, source }
    }

    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            FulfillmentError::Invalid(_) => "invalid",
            FulfillmentError::InsufficientStock { .. } => "insufficient_stock",
            FulfillmentError::PersistenceFailure { .. } => "persistence_failure",
            FulfillmentError::TimedOut { .. } => "timed_out",
        }
    }

    /// Returns true if running the same request again may succeed.
    ///
    /// The coordinator never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            FulfillmentError::PersistenceFailure { source, .. } => source.is_retryable(),
            FulfillmentError::TimedOut { .. } => true,
            FulfillmentError::Invalid(_) | FulfillmentError::InsufficientStock { .. } => false,
        }
    }
}

/// Errors returned by [`OrderQueryService`](crate::OrderQueryService).
#[derive(Debug, Error)]
pub enum QueryError {
    /// No order with this id exists.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The replacement values failed validation.
    #[error("Invalid order: {0}")]
    Invalid(#[from] ValidationError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
