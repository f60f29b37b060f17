use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{ItemId, Money, OrderId, OrderLineId, PageRequest, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    NewOrder, NewOrderLine, OrderHeader, OrderLineRecord, OrderRecord, Page, Result, StockDebit,
    StockLevel, StoreError,
    store::{OrderRepository, StockReader, StoreTransaction, TransactionalStore},
};

/// A step at which the in-memory store can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Begin,
    InsertOrder,
    InsertLines,
    DecrementStock,
    Commit,
}

impl std::fmt::Display for FailurePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailurePoint::Begin => "begin",
            FailurePoint::InsertOrder => "insert_order",
            FailurePoint::InsertLines => "insert_order_lines",
            FailurePoint::DecrementStock => "decrement_stock",
            FailurePoint::Commit => "commit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    items: BTreeMap<ItemId, StockLevel>,
    orders: BTreeMap<OrderId, OrderHeader>,
    lines: BTreeMap<OrderLineId, OrderLineRecord>,
    next_order_id: i64,
    next_line_id: i64,
    failure: Option<FailurePoint>,
}

impl MemoryState {
    fn check(&self, point: FailurePoint) -> Result<()> {
        if self.failure == Some(point) {
            return Err(StoreError::Unavailable(format!(
                "injected failure at {point}"
            )));
        }
        Ok(())
    }

    fn assemble(&self, header: &OrderHeader) -> OrderRecord {
        let lines = self
            .lines
            .values()
            .filter(|line| line.order_id == header.id)
            .cloned()
            .collect();
        OrderRecord {
            header: header.clone(),
            lines,
        }
    }
}

/// In-memory order store for testing.
///
/// A transaction holds the store's lock from `begin` until it is committed,
/// rolled back or dropped, so transactions are fully serialized. Writes go to
/// a private working copy that replaces the shared state only on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an inventory item.
    pub async fn put_item(&self, item_id: ItemId, stock: i32, min_stock: i32) {
        self.state.lock().await.items.insert(
            item_id,
            StockLevel {
                item_id,
                stock,
                min_stock,
            },
        );
    }

    /// Configures the store to fail at the given step, or clears the failure.
    pub async fn set_failure(&self, point: Option<FailurePoint>) {
        self.state.lock().await.failure = point;
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Returns the number of committed order lines.
    pub async fn line_count(&self) -> usize {
        self.state.lock().await.lines.len()
    }
}

/// An open transaction against an [`InMemoryStore`].
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction> {
        let guard = self.state.clone().lock_owned().await;
        guard.check(FailurePoint::Begin)?;
        let working = (*guard).clone();
        Ok(InMemoryTransaction { guard, working })
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderHeader> {
        self.guard.check(FailurePoint::InsertOrder)?;

        self.working.next_order_id += 1;
        let header = OrderHeader {
            id: OrderId::new(self.working.next_order_id),
            owner_id: order.owner_id,
            total_amount: order.total_amount,
            created_at: Utc::now(),
        };
        self.working.orders.insert(header.id, header.clone());
        Ok(header)
    }

    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLineRecord>> {
        self.guard.check(FailurePoint::InsertLines)?;

        if !self.working.orders.contains_key(&order_id) {
            return Err(StoreError::Constraint(format!(
                "order {order_id} does not exist"
            )));
        }
        if let Some(line) = lines
            .iter()
            .find(|line| !self.working.items.contains_key(&line.item_id))
        {
            return Err(StoreError::Constraint(format!(
                "item {} does not exist",
                line.item_id
            )));
        }

        let mut stored = Vec::with_capacity(lines.len());
        for line in lines {
            self.working.next_line_id += 1;
            let record = OrderLineRecord {
                id: OrderLineId::new(self.working.next_line_id),
                order_id,
                item_id: line.item_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            };
            self.working.lines.insert(record.id, record.clone());
            stored.push(record);
        }
        Ok(stored)
    }

    async fn decrement_stock(&mut self, debits: &[StockDebit]) -> Result<u64> {
        self.guard.check(FailurePoint::DecrementStock)?;

        let mut decremented = 0;
        for debit in debits {
            if let Some(level) = self.working.items.get_mut(&debit.item_id)
                && level.stock >= debit.quantity
            {
                level.stock -= debit.quantity;
                decremented += 1;
            }
        }
        Ok(decremented)
    }

    async fn commit(self) -> Result<()> {
        let InMemoryTransaction { mut guard, working } = self;
        guard.check(FailurePoint::Commit)?;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        // The working copy is discarded and the lock released on drop.
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .get(&order_id)
            .map(|header| state.assemble(header)))
    }

    async fn list_orders(&self, page: PageRequest) -> Result<Page<OrderRecord>> {
        let state = self.state.lock().await;
        let total = state.orders.len() as i64;
        let orders = state
            .orders
            .values()
            .rev()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .map(|header| state.assemble(header))
            .collect();
        Ok(Page::new(orders, page, total))
    }

    async fn update_order(
        &self,
        order_id: OrderId,
        owner_id: UserId,
        total_amount: Money,
    ) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.orders.get_mut(&order_id) {
            Some(header) => {
                header.owner_id = owner_id;
                header.total_amount = total_amount;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.orders.contains_key(&order_id) {
            return Ok(false);
        }
        state.lines.retain(|_, line| line.order_id != order_id);
        state.orders.remove(&order_id);
        Ok(true)
    }
}

#[async_trait]
impl StockReader for InMemoryStore {
    async fn stock_level(&self, item_id: ItemId) -> Result<Option<StockLevel>> {
        Ok(self.state.lock().await.items.get(&item_id).copied())
    }
}
