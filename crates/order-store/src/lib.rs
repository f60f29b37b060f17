//! Storage layer for orders, order lines and item stock.
//!
//! [`TransactionalStore`] is the narrow capability the fulfillment path
//! needs: one transaction offering a header insert, a batched line insert
//! and a set-oriented conditional stock decrement. [`OrderRepository`] and
//! [`StockReader`] serve the read and maintenance paths.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{FailurePoint, InMemoryStore, InMemoryTransaction};
pub use postgres::{IsolationLevel, PostgresStore, PostgresTransaction};
pub use query::Page;
pub use record::{
    NewOrder, NewOrderLine, OrderHeader, OrderLineRecord, OrderRecord, StockDebit, StockLevel,
};
pub use store::{OrderRepository, StockReader, StoreTransaction, TransactionalStore};
