use async_trait::async_trait;
use common::{ItemId, Money, OrderId, PageRequest, UserId};

use crate::{
    NewOrder, NewOrderLine, OrderHeader, OrderLineRecord, OrderRecord, Page, Result, StockDebit,
    StockLevel,
};

/// Storage that can open an atomic unit of work.
///
/// Everything written through the returned transaction is invisible to other
/// readers until [`StoreTransaction::commit`] succeeds. Dropping a
/// transaction without committing discards its writes.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// The transaction handle produced by [`TransactionalStore::begin`].
    type Transaction: StoreTransaction;

    /// Opens a new transaction.
    async fn begin(&self) -> Result<Self::Transaction>;
}

/// Write operations available inside one open transaction.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Inserts an order header and returns it with its assigned id and
    /// creation timestamp.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderHeader>;

    /// Inserts every line of an order in a single batched statement.
    ///
    /// Returns the stored lines ordered by line id.
    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLineRecord>>;

    /// Decrements stock for every debit whose item currently holds at least
    /// the requested quantity, in one set-oriented statement.
    ///
    /// Items without enough stock, and unknown items, are left untouched.
    /// Returns the number of items actually decremented. Debits are expected
    /// to name distinct items (see [`StockDebit::from_lines`]).
    async fn decrement_stock(&mut self, debits: &[StockDebit]) -> Result<u64>;

    /// Makes every write of this transaction visible.
    async fn commit(self) -> Result<()>;

    /// Discards every write of this transaction.
    async fn rollback(self) -> Result<()>;
}

/// Read and maintenance operations on committed orders.
///
/// None of these operations touch item stock.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads an order with its lines. Returns None if the order doesn't exist.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>>;

    /// Lists orders newest first, each with its lines.
    async fn list_orders(&self, page: PageRequest) -> Result<Page<OrderRecord>>;

    /// Rewrites the owner and total of an order header.
    ///
    /// Returns false if the order doesn't exist.
    async fn update_order(
        &self,
        order_id: OrderId,
        owner_id: UserId,
        total_amount: Money,
    ) -> Result<bool>;

    /// Deletes an order's lines and then its header in one transaction.
    ///
    /// Returns false if the order doesn't exist.
    async fn delete_order(&self, order_id: OrderId) -> Result<bool>;
}

/// Read-only access to item stock.
#[async_trait]
pub trait StockReader: Send + Sync {
    /// Returns the stock position of an item, or None if it doesn't exist.
    async fn stock_level(&self, item_id: ItemId) -> Result<Option<StockLevel>>;
}
