//! Fulfillment coordinator: creates an order and debits stock in one
//! transaction.

use std::time::{Duration, Instant};

use order_store::{NewOrder, StockDebit, StoreTransaction, TransactionalStore};

use crate::error::{FulfillmentError, FulfillmentStep};
use crate::order::Order;
use crate::pricing::PricedOrder;
use crate::request::OrderRequest;
use crate::state::{FulfillmentProgress, FulfillmentState};
use crate::validation::validate;

/// Default upper bound for one fulfillment attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates orders atomically.
///
/// Each call validates and prices the request, then opens one transaction
/// that writes the order header, writes every line in one batched insert and
/// debits stock for every distinct item with one conditional update. If any
/// item lacks stock, or any step fails, the transaction is rolled back and
/// nothing is visible. The coordinator holds no state between calls, so one
/// instance can serve any number of concurrent requests.
pub struct FulfillmentCoordinator<S>
where
    S: TransactionalStore,
{
    store: S,
    timeout: Duration,
}

impl<S> FulfillmentCoordinator<S>
where
    S: TransactionalStore,
{
    /// Creates a coordinator with the default timeout.
    pub fn new(store: S) -> Self {
        Self {
            store,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the upper bound for one attempt, from opening the transaction to
    /// commit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates an order from the request.
    ///
    /// Validation runs before any storage access. On success the returned
    /// order carries its assigned id, creation timestamp and stored lines.
    #[tracing::instrument(
        skip(self, request),
        fields(
            owner_id = ?request.owner_id,
            line_count = request.lines.len(),
            order_id = tracing::field::Empty,
        )
    )]
    pub async fn fulfill_order(&self, request: &OrderRequest) -> Result<Order, FulfillmentError> {
        metrics::counter!("fulfillment_attempts_total").increment(1);
        let started = Instant::now();

        let result = match validate(request).and_then(PricedOrder::from_validated) {
            Ok(priced) => self.run(priced).await,
            Err(e) => {
                tracing::warn!(error = %e, "order rejected");
                Err(e.into())
            }
        };

        metrics::histogram!("fulfillment_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("fulfillment_committed_total").increment(1);
                tracing::Span::current().record("order_id", order.id.as_i64());
                tracing::info!(
                    order_id = %order.id,
                    total_amount = %order.total_amount,
                    "order fulfilled"
                );
            }
            Err(e) => {
                metrics::counter!("fulfillment_aborted_total", "reason" => e.reason())
                    .increment(1);
            }
        }
        result
    }

    /// Runs the transactional part of an attempt under the timeout.
    ///
    /// When the timeout fires the in-flight future is dropped, which drops
    /// the open transaction and with it every uncommitted write.
    async fn run(&self, order: PricedOrder) -> Result<Order, FulfillmentError> {
        let mut progress = FulfillmentProgress::new();
        let outcome = tokio::time::timeout(self.timeout, self.execute(&order, &mut progress)).await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                progress.abort();
                tracing::error!(
                    step = %progress.step(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "fulfillment timed out"
                );
                Err(FulfillmentError::TimedOut {
                    step: progress.step(),
                    after: self.timeout,
                })
            }
        }
    }

    async fn execute(
        &self,
        order: &PricedOrder,
        progress: &mut FulfillmentProgress,
    ) -> Result<Order, FulfillmentError> {
        progress.start(FulfillmentStep::Begin);
        let mut tx = self.store.begin().await.map_err(|e| {
            progress.abort();
            tracing::error!(step = %FulfillmentStep::Begin, error = %e, "failed to open transaction");
            FulfillmentError::persistence(FulfillmentStep::Begin, e)
        })?;

        let written = match Self::write(&mut tx, order, progress).await {
            Ok(written) => written,
            Err(e) => {
                progress.abort();
                match &e {
                    FulfillmentError::InsufficientStock { .. } => {
                        tracing::warn!(error = %e, "order aborted");
                    }
                    _ => tracing::error!(step = %progress.step(), error = %e, "order aborted"),
                }
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(
                        step = %FulfillmentStep::Rollback,
                        error = %rollback_err,
                        "rollback failed"
                    );
                }
                return Err(e);
            }
        };

        progress.start(FulfillmentStep::Commit);
        if let Err(e) = tx.commit().await {
            progress.abort();
            tracing::error!(step = %FulfillmentStep::Commit, error = %e, "commit failed");
            return Err(FulfillmentError::persistence(FulfillmentStep::Commit, e));
        }
        progress.advance();
        debug_assert_eq!(progress.state(), FulfillmentState::Committed);

        Ok(written)
    }

    /// Performs every write of the attempt inside the open transaction.
    async fn write(
        tx: &mut S::Transaction,
        order: &PricedOrder,
        progress: &mut FulfillmentProgress,
    ) -> Result<Order, FulfillmentError> {
        progress.start(FulfillmentStep::InsertHeader);
        let header = tx
            .insert_order(&NewOrder {
                owner_id: order.owner_id,
                total_amount: order.total_amount,
            })
            .await
            .map_err(|e| FulfillmentError::persistence(FulfillmentStep::InsertHeader, e))?;
        progress.advance();

        progress.start(FulfillmentStep::InsertLines);
        let lines = tx
            .insert_order_lines(header.id, &order.lines)
            .await
            .map_err(|e| FulfillmentError::persistence(FulfillmentStep::InsertLines, e))?;
        progress.advance();

        progress.start(FulfillmentStep::DecrementStock);
        let debits = StockDebit::from_lines(&order.lines);
        let decremented = tx
            .decrement_stock(&debits)
            .await
            .map_err(|e| FulfillmentError::persistence(FulfillmentStep::DecrementStock, e))?;
        if decremented != debits.len() as u64 {
            return Err(FulfillmentError::InsufficientStock {
                requested: debits.len(),
                decremented,
            });
        }
        progress.advance();

        Ok(Order {
            id: header.id,
            owner_id: header.owner_id,
            total_amount: header.total_amount,
            created_at: header.created_at,
            lines,
        })
    }
}
