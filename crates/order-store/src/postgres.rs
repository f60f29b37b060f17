use std::collections::HashMap;

use async_trait::async_trait;
use common::{ItemId, Money, OrderId, OrderLineId, PageRequest, UserId};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    NewOrder, NewOrderLine, OrderHeader, OrderLineRecord, OrderRecord, Page, Result, StockDebit,
    StockLevel,
    store::{OrderRepository, StockReader, StoreTransaction, TransactionalStore},
};

/// Transaction isolation level applied to every fulfillment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Enough for the conditional decrement: PostgreSQL re-checks the
    /// `stock >= quantity` predicate against the latest row version after
    /// waiting on a concurrent writer.
    #[default]
    ReadCommitted,
    RepeatableRead,
    /// Concurrent writers to the same item fail with a serialization error
    /// instead of waiting.
    Serializable,
}

impl IsolationLevel {
    fn set_statement(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            IsolationLevel::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
            IsolationLevel::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

impl std::str::FromStr for IsolationLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "read_committed" => Ok(IsolationLevel::ReadCommitted),
            "repeatable_read" => Ok(IsolationLevel::RepeatableRead),
            "serializable" => Ok(IsolationLevel::Serializable),
            other => Err(format!("unknown isolation level: {other}")),
        }
    }
}

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    isolation: IsolationLevel,
}

impl PostgresStore {
    /// Creates a new PostgreSQL order store using read-committed isolation.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            isolation: IsolationLevel::default(),
        }
    }

    /// Sets the isolation level used for fulfillment transactions.
    pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_header(row: &PgRow) -> Result<OrderHeader> {
        Ok(OrderHeader {
            id: OrderId::new(row.try_get("id")?),
            owner_id: UserId::new(row.try_get("owner_id")?),
            total_amount: Money::new(row.try_get("total_amount")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_line(row: &PgRow) -> Result<OrderLineRecord> {
        Ok(OrderLineRecord {
            id: OrderLineId::new(row.try_get("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            item_id: ItemId::new(row.try_get("item_id")?),
            quantity: row.try_get("quantity")?,
            unit_price: Money::new(row.try_get("unit_price")?),
            subtotal: Money::new(row.try_get("subtotal")?),
        })
    }
}

/// An open transaction against a [`PostgresStore`].
///
/// sqlx rolls the transaction back if it is dropped before commit.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TransactionalStore for PostgresStore {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> Result<PostgresTransaction> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(self.isolation.set_statement())
            .execute(&mut *tx)
            .await?;
        Ok(PostgresTransaction { tx })
    }
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderHeader> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (owner_id, total_amount, created_at)
            VALUES ($1, $2, NOW())
            RETURNING id, owner_id, total_amount, created_at
            "#,
        )
        .bind(order.owner_id.as_i64())
        .bind(order.total_amount.amount())
        .fetch_one(&mut *self.tx)
        .await?;

        PostgresStore::row_to_header(&row)
    }

    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLineRecord>> {
        let item_ids: Vec<i64> = lines.iter().map(|l| l.item_id.as_i64()).collect();
        let quantities: Vec<i32> = lines.iter().map(|l| l.quantity).collect();
        let unit_prices: Vec<Decimal> = lines.iter().map(|l| l.unit_price.amount()).collect();
        let subtotals: Vec<Decimal> = lines.iter().map(|l| l.subtotal.amount()).collect();

        let rows = sqlx::query(
            r#"
            INSERT INTO order_lines (order_id, item_id, quantity, unit_price, subtotal)
            SELECT $1, line.item_id, line.quantity, line.unit_price, line.subtotal
            FROM UNNEST($2::BIGINT[], $3::INT[], $4::NUMERIC[], $5::NUMERIC[])
                AS line(item_id, quantity, unit_price, subtotal)
            RETURNING id, order_id, item_id, quantity, unit_price, subtotal
            "#,
        )
        .bind(order_id.as_i64())
        .bind(item_ids)
        .bind(quantities)
        .bind(unit_prices)
        .bind(subtotals)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut stored = rows
            .iter()
            .map(PostgresStore::row_to_line)
            .collect::<Result<Vec<_>>>()?;
        stored.sort_by_key(|line| line.id);
        Ok(stored)
    }

    async fn decrement_stock(&mut self, debits: &[StockDebit]) -> Result<u64> {
        let item_ids: Vec<i64> = debits.iter().map(|d| d.item_id.as_i64()).collect();
        let quantities: Vec<i32> = debits.iter().map(|d| d.quantity).collect();

        // One statement for every item: rows whose stock is short are simply
        // not matched, so the affected-row count is the feasibility signal.
        //
        // Rows are locked in id order before any is updated, so two orders
        // over overlapping items queue behind each other instead of
        // deadlocking. NO KEY UPDATE leaves the KEY SHARE locks taken by
        // order_lines foreign-key checks compatible.
        let result = sqlx::query(
            r#"
            WITH locked AS (
                SELECT id
                FROM items
                WHERE id = ANY($1::BIGINT[])
                ORDER BY id
                FOR NO KEY UPDATE
            )
            UPDATE items
            SET stock = items.stock - debit.quantity,
                updated_at = NOW()
            FROM locked, UNNEST($1::BIGINT[], $2::INT[]) AS debit(item_id, quantity)
            WHERE items.id = locked.id
              AND items.id = debit.item_id
              AND items.stock >= debit.quantity
            "#,
        )
        .bind(item_ids)
        .bind(quantities)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, owner_id, total_amount, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let header = Self::row_to_header(&row)?;

        let rows = sqlx::query(
            r#"
            SELECT id, order_id, item_id, quantity, unit_price, subtotal
            FROM order_lines
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let lines = rows
            .iter()
            .map(Self::row_to_line)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(OrderRecord { header, lines }))
    }

    async fn list_orders(&self, page: PageRequest) -> Result<Page<OrderRecord>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        let header_rows = sqlx::query(
            r#"
            SELECT id, owner_id, total_amount, created_at
            FROM orders
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let headers = header_rows
            .iter()
            .map(Self::row_to_header)
            .collect::<Result<Vec<_>>>()?;
        let order_ids: Vec<i64> = headers.iter().map(|h| h.id.as_i64()).collect();

        // Lines for the whole page in one round trip.
        let line_rows = sqlx::query(
            r#"
            SELECT id, order_id, item_id, quantity, unit_price, subtotal
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY order_id, id ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines_by_order: HashMap<OrderId, Vec<OrderLineRecord>> = HashMap::new();
        for row in &line_rows {
            let line = Self::row_to_line(row)?;
            lines_by_order.entry(line.order_id).or_default().push(line);
        }

        let orders = headers
            .into_iter()
            .map(|header| OrderRecord {
                lines: lines_by_order.remove(&header.id).unwrap_or_default(),
                header,
            })
            .collect();

        Ok(Page::new(orders, page, total))
    }

    async fn update_order(
        &self,
        order_id: OrderId,
        owner_id: UserId,
        total_amount: Money,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET owner_id = $1, total_amount = $2
            WHERE id = $3
            "#,
        )
        .bind(owner_id.as_i64())
        .bind(total_amount.amount())
        .bind(order_id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM order_lines WHERE order_id = $1")
            .bind(order_id.as_i64())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id.as_i64())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl StockReader for PostgresStore {
    async fn stock_level(&self, item_id: ItemId) -> Result<Option<StockLevel>> {
        let row: Option<PgRow> = sqlx::query("SELECT id, stock, min_stock FROM items WHERE id = $1")
            .bind(item_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(StockLevel {
                item_id: ItemId::new(row.try_get("id")?),
                stock: row.try_get("stock")?,
                min_stock: row.try_get("min_stock")?,
            })),
            None => Ok(None),
        }
    }
}
