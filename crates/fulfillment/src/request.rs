//! Proposed orders as submitted by a caller.

use common::{ItemId, Money, UserId};

/// One requested line: an item, how many units, and the unit price agreed at
/// order time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub item_id: ItemId,
    pub quantity: i32,
    pub unit_price: Money,
}

impl OrderLineRequest {
    /// Creates a new line request.
    pub fn new(item_id: impl Into<ItemId>, quantity: i32, unit_price: impl Into<Money>) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            unit_price: unit_price.into(),
        }
    }
}

/// A proposed order that has not been validated yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderRequest {
    /// The user placing the order; None if the caller omitted it.
    pub owner_id: Option<UserId>,
    pub lines: Vec<OrderLineRequest>,
}

impl OrderRequest {
    /// Creates a request for the given owner.
    pub fn new(owner_id: impl Into<UserId>, lines: Vec<OrderLineRequest>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            lines,
        }
    }

    /// Adds a line to the request.
    pub fn with_line(mut self, line: OrderLineRequest) -> Self {
        self.lines.push(line);
        self
    }
}
