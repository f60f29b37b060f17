//! Line subtotals and order totals.
//!
//! Pricing only ever uses the unit price carried on the request, so the same
//! lines always produce the same amounts.

use common::{Money, UserId};
use order_store::NewOrderLine;

use crate::request::OrderLineRequest;
use crate::validation::{ValidatedOrder, ValidationError};

/// A validated order with every line priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub owner_id: UserId,
    pub lines: Vec<NewOrderLine>,
    pub total_amount: Money,
}

impl PricedOrder {
    /// Prices a validated order.
    pub fn from_validated(order: ValidatedOrder<'_>) -> Result<Self, ValidationError> {
        let (lines, total_amount) = price(order.lines())?;
        Ok(Self {
            owner_id: order.owner_id(),
            lines,
            total_amount,
        })
    }
}

/// Computes `quantity * unit_price` for every line and the sum of those
/// subtotals.
///
/// Fails with [`ValidationError::AmountOverflow`] naming the first line whose
/// subtotal, or whose addition to the running total, does not fit.
pub fn price(lines: &[OrderLineRequest]) -> Result<(Vec<NewOrderLine>, Money), ValidationError> {
    let mut priced = Vec::with_capacity(lines.len());
    let mut total = Money::zero();

    for (index, line) in lines.iter().enumerate() {
        let Some((subtotal, running)) = line
            .unit_price
            .checked_multiply(line.quantity)
            .and_then(|subtotal| Some((subtotal, total.checked_add(subtotal)?)))
        else {
            return Err(ValidationError::AmountOverflow { line: index });
        };
        total = running;
        priced.push(NewOrderLine {
            item_id: line.item_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal,
        });
    }

    Ok((priced, total))
}
