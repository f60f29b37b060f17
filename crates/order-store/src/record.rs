use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{ItemId, Money, OrderId, OrderLineId, UserId};
use serde::{Deserialize, Serialize};

/// Order header values supplied by the caller; the id and timestamp are
/// assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub owner_id: UserId,
    pub total_amount: Money,
}

/// A persisted order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub id: OrderId,
    pub owner_id: UserId,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
}

/// One line of a new order, already priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub item_id: ItemId,
    pub quantity: i32,
    /// Unit price captured when the order was placed.
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRecord {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub quantity: i32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// An order header together with all of its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub header: OrderHeader,
    pub lines: Vec<OrderLineRecord>,
}

/// Quantity to remove from one item's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDebit {
    pub item_id: ItemId,
    pub quantity: i32,
}

impl StockDebit {
    /// Collapses order lines into one debit per distinct item, summing the
    /// quantities of lines that share an item.
    ///
    /// The result is ordered by item id.
    pub fn from_lines(lines: &[NewOrderLine]) -> Vec<StockDebit> {
        let mut per_item: BTreeMap<ItemId, i32> = BTreeMap::new();
        for line in lines {
            let requested = per_item.entry(line.item_id).or_insert(0);
            *requested = requested.saturating_add(line.quantity);
        }
        per_item
            .into_iter()
            .map(|(item_id, quantity)| StockDebit { item_id, quantity })
            .collect()
    }
}

/// Current stock position of an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub item_id: ItemId,
    pub stock: i32,
    pub min_stock: i32,
}

impl StockLevel {
    /// Returns true if stock is at or below the minimum-stock threshold.
    pub fn is_low(&self) -> bool {
        self.stock <= self.min_stock
    }
}
