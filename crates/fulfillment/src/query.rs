//! Read and maintenance operations on committed orders.

use common::{DEFAULT_PAGE_LIMIT, OrderId, PageRequest};
use order_store::{OrderRepository, Page};

use crate::error::QueryError;
use crate::order::Order;
use crate::pricing::PricedOrder;
use crate::request::OrderRequest;
use crate::validation::validate;

/// Loads, lists, updates and deletes committed orders.
///
/// None of these operations change item stock: updating an order rewrites
/// its owner and total only, and deleting an order does not return its
/// quantities to stock.
pub struct OrderQueryService<R>
where
    R: OrderRepository,
{
    repository: R,
    default_limit: i64,
}

impl<R> OrderQueryService<R>
where
    R: OrderRepository,
{
    /// Creates a new query service.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            default_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Sets the page size used when a listing request omits one.
    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    /// Loads an order with its lines.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, QueryError> {
        self.repository
            .get_order(order_id)
            .await?
            .map(Order::from)
            .ok_or(QueryError::OrderNotFound(order_id))
    }

    /// Lists orders newest first.
    ///
    /// Out-of-range paging values are clamped rather than rejected.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Page<Order>, QueryError> {
        let request = PageRequest::from_query(page, limit, self.default_limit);
        let page = self.repository.list_orders(request).await?;
        tracing::debug!(total = page.total, returned = page.items.len(), "orders listed");
        Ok(page.map(Order::from))
    }

    /// Replaces the owner and total of an order.
    ///
    /// The request is validated and priced like a new order, but only the
    /// header is rewritten: stored lines and item stock stay as they are.
    #[tracing::instrument(skip(self, request), fields(owner_id = ?request.owner_id))]
    pub async fn update_order(
        &self,
        order_id: OrderId,
        request: &OrderRequest,
    ) -> Result<Order, QueryError> {
        let priced = PricedOrder::from_validated(validate(request)?)?;

        let updated = self
            .repository
            .update_order(order_id, priced.owner_id, priced.total_amount)
            .await?;
        if !updated {
            return Err(QueryError::OrderNotFound(order_id));
        }
        tracing::info!(total_amount = %priced.total_amount, "order updated");

        self.get_order(order_id).await
    }

    /// Deletes an order and its lines. Stock is not restored.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), QueryError> {
        if !self.repository.delete_order(order_id).await? {
            return Err(QueryError::OrderNotFound(order_id));
        }
        tracing::info!("order deleted");
        Ok(())
    }
}
