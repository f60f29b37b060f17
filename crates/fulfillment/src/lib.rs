//! Order fulfillment.
//!
//! A proposed order flows through three stages:
//!
//! 1. [`validate`] checks its shape without touching storage.
//! 2. [`price`] computes line subtotals and the order total.
//! 3. [`FulfillmentCoordinator`] writes the order and its lines and debits
//!    stock for every distinct item inside one transaction, committing only
//!    if every item had enough stock.
//!
//! [`OrderQueryService`] reads, updates and deletes committed orders.

pub mod coordinator;
pub mod error;
pub mod order;
pub mod pricing;
pub mod query;
pub mod request;
pub mod state;
pub mod validation;

pub use coordinator::{DEFAULT_TIMEOUT, FulfillmentCoordinator};
pub use error::{FulfillmentError, FulfillmentStep, QueryError};
pub use order::Order;
pub use pricing::{PricedOrder, price};
pub use query::OrderQueryService;
pub use request::{OrderLineRequest, OrderRequest};
pub use state::{FulfillmentProgress, FulfillmentState};
pub use validation::{ValidatedOrder, ValidationError, validate, validate_owner};
