//! Committed orders as returned to callers.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, UserId};
use order_store::{OrderLineRecord, OrderRecord};
use serde::{Deserialize, Serialize};

/// A committed order with all of its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner_id: UserId,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineRecord>,
}

impl Order {
    /// Sum of the stored line subtotals, or None if it overflows.
    pub fn lines_total(&self) -> Option<Money> {
        Money::checked_sum(self.lines.iter().map(|line| line.subtotal))
    }

    /// Returns true if every subtotal equals `quantity * unit_price` and the
    /// total equals the sum of subtotals.
    pub fn is_consistent(&self) -> bool {
        self.lines
            .iter()
            .all(|line| Some(line.subtotal) == line.unit_price.checked_multiply(line.quantity))
            && Some(self.total_amount) == self.lines_total()
    }
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        Self {
            id: record.header.id,
            owner_id: record.header.owner_id,
            total_amount: record.header.total_amount,
            created_at: record.header.created_at,
            lines: record.lines,
        }
    }
}
