//! Shape checks run before any storage is touched.

use common::{Money, UserId};
use thiserror::Error;

use crate::request::{OrderLineRequest, OrderRequest};

/// Reasons a proposed order is rejected before fulfillment starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Owner id is missing or not positive.
    #[error("Owner id is required and must be positive")]
    InvalidOwner,

    /// The order has no lines.
    #[error("At least one order line is required")]
    EmptyOrder,

    /// A line asks for zero or fewer units.
    #[error("Invalid quantity on line {line}: {quantity} (must be greater than 0)")]
    InvalidQuantity { line: usize, quantity: i32 },

    /// A line carries a zero or negative unit price.
    #[error("Invalid price on line {line}: {price} (must be greater than 0)")]
    InvalidPrice { line: usize, price: Money },

    /// A line subtotal, or the order total once that line is added, is too
    /// large to represent.
    #[error("Amount on line {line} is too large")]
    AmountOverflow { line: usize },
}

/// An order request that passed validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedOrder<'a> {
    owner_id: UserId,
    lines: &'a [OrderLineRequest],
}

impl<'a> ValidatedOrder<'a> {
    /// The owner of the order, known to be positive.
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// The lines of the order, known to be non-empty with positive
    /// quantities and prices.
    pub fn lines(&self) -> &'a [OrderLineRequest] {
        self.lines
    }
}

/// Checks that the owner id is present and positive.
pub fn validate_owner(owner_id: Option<UserId>) -> Result<UserId, ValidationError> {
    owner_id
        .filter(UserId::is_valid)
        .ok_or(ValidationError::InvalidOwner)
}

/// Validates a proposed order.
///
/// Checks run in a fixed order: owner, then emptiness, then each line in
/// sequence (quantity before price). The first failure is returned.
pub fn validate(request: &OrderRequest) -> Result<ValidatedOrder<'_>, ValidationError> {
    let owner_id = validate_owner(request.owner_id)?;

    if request.lines.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }

    for (index, line) in request.lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(ValidationError::InvalidQuantity {
                line: index,
                quantity: line.quantity,
            });
        }
        if !line.unit_price.is_positive() {
            return Err(ValidationError::InvalidPrice {
                line: index,
                price: line.unit_price,
            });
        }
    }

    Ok(ValidatedOrder {
        owner_id,
        lines: &request.lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item: i64, quantity: i32, price: i64) -> OrderLineRequest {
        OrderLineRequest::new(item, quantity, price)
    }

    #[test]
    fn accepts_well_formed_order() {
        let request = OrderRequest::new(7, vec![line(1, 2, 50), line(2, 1, 100)]);
        let validated = validate(&request).unwrap();
        assert_eq!(validated.owner_id(), UserId::new(7));
        assert_eq!(validated.lines().len(), 2);
    }

    #[test]
    fn rejects_missing_owner() {
        let request = OrderRequest {
            owner_id: None,
            lines: vec![line(1, 1, 10)],
        };
        assert_eq!(validate(&request).unwrap_err(), ValidationError::InvalidOwner);
    }

    #[test]
    fn rejects_non_positive_owner() {
        for owner in [0, -1] {
            let request = OrderRequest::new(owner, vec![line(1, 1, 10)]);
            assert_eq!(validate(&request).unwrap_err(), ValidationError::InvalidOwner);
        }
    }

    #[test]
    fn rejects_empty_order() {
        let request = OrderRequest::new(7, vec![]);
        assert_eq!(validate(&request).unwrap_err(), ValidationError::EmptyOrder);
    }

    #[test]
    fn owner_is_checked_before_emptiness() {
        let request = OrderRequest::new(0, vec![]);
        assert_eq!(validate(&request).unwrap_err(), ValidationError::InvalidOwner);
    }

    #[test]
    fn rejects_zero_quantity() {
        let request = OrderRequest::new(7, vec![line(1, 2, 50), line(2, 0, 100)]);
        assert_eq!(
            validate(&request).unwrap_err(),
            ValidationError::InvalidQuantity {
                line: 1,
                quantity: 0
            }
        );
    }

    #[test]
    fn rejects_non_positive_price() {
        let request = OrderRequest::new(7, vec![line(1, 1, 0)]);
        assert_eq!(
            validate(&request).unwrap_err(),
            ValidationError::InvalidPrice {
                line: 0,
                price: Money::zero()
            }
        );

        let request = OrderRequest::new(7, vec![line(1, 1, -5)]);
        assert!(matches!(
            validate(&request),
            Err(ValidationError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn quantity_is_checked_before_price() {
        let request = OrderRequest::new(7, vec![line(1, -1, -1)]);
        assert!(matches!(
            validate(&request),
            Err(ValidationError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn validate_owner_filters() {
        assert_eq!(validate_owner(Some(UserId::new(3))), Ok(UserId::new(3)));
        assert_eq!(validate_owner(None), Err(ValidationError::InvalidOwner));
    }
}
