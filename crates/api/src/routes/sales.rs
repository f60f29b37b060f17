//! Sales endpoints: create, read, list, update and delete orders.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{ItemId, Money, OrderId, UserId};
use fulfillment::{
    FulfillmentCoordinator, Order, OrderLineRequest, OrderQueryService, OrderRequest,
};
use order_store::{OrderLineRecord, OrderRepository, Page, TransactionalStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Storage the sales endpoints run on.
pub trait SalesStore: TransactionalStore + OrderRepository + Clone + 'static {}

impl<T> SalesStore for T where T: TransactionalStore + OrderRepository + Clone + 'static {}

/// Shared application state accessible from all handlers.
pub struct AppState<S: SalesStore> {
    pub coordinator: FulfillmentCoordinator<S>,
    pub queries: OrderQueryService<S>,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct SaleRequest {
    pub user_id: Option<i64>,
    #[serde(default)]
    pub items: Vec<SaleItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct SaleItemRequest {
    pub item_id: i64,
    pub quantity: i32,
    pub price: Money,
}

impl From<SaleRequest> for OrderRequest {
    fn from(req: SaleRequest) -> Self {
        OrderRequest {
            owner_id: req.user_id.map(UserId::new),
            lines: req
                .items
                .into_iter()
                .map(|item| {
                    OrderLineRequest::new(ItemId::new(item.item_id), item.quantity, item.price)
                })
                .collect(),
        }
    }
}

/// Paging parameters. Values that are missing or not numbers fall back to
/// the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_amount: Money,
    pub items: Vec<SaleItemResponse>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SaleItemResponse {
    pub id: i64,
    pub item_id: ItemId,
    pub quantity: i32,
    pub price: Money,
    pub subtotal: Money,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct SaleListResponse {
    pub data: Vec<SaleResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: bool,
    pub message: &'static str,
}

impl From<OrderLineRecord> for SaleItemResponse {
    fn from(line: OrderLineRecord) -> Self {
        Self {
            id: line.id.as_i64(),
            item_id: line.item_id,
            quantity: line.quantity,
            price: line.unit_price,
            subtotal: line.subtotal,
        }
    }
}

impl From<Order> for SaleResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.owner_id,
            total_amount: order.total_amount,
            items: order.lines.into_iter().map(SaleItemResponse::from).collect(),
            created_at: order.created_at,
        }
    }
}

impl From<Page<Order>> for SaleListResponse {
    fn from(page: Page<Order>) -> Self {
        Self {
            pagination: Pagination {
                page: page.page,
                limit: page.limit,
                total: page.total,
            },
            data: page.items.into_iter().map(SaleResponse::from).collect(),
        }
    }
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e.body_text())))
}

fn parse_id(id: Result<Path<i64>, PathRejection>) -> Result<OrderId, ApiError> {
    id.map(|Path(id)| OrderId::new(id))
        .map_err(|_| ApiError::BadRequest("Invalid id format".to_string()))
}

// -- Handlers --

/// POST /sales: create a sale, debiting stock for every item.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: SalesStore>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<SaleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SaleResponse>), ApiError> {
    let request = OrderRequest::from(parse_body(body)?);
    let order = state.coordinator.fulfill_order(&request).await?;
    Ok((StatusCode::CREATED, Json(SaleResponse::from(order))))
}

/// GET /sales/{id}: load a sale with its items.
#[tracing::instrument(skip(state, id))]
pub async fn get<S: SalesStore>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<SaleResponse>, ApiError> {
    let order_id = parse_id(id)?;
    let order = state.queries.get_order(order_id).await?;
    Ok(Json(SaleResponse::from(order)))
}

/// GET /sales: list sales newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: SalesStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<SaleListResponse>, ApiError> {
    let page = params.page.and_then(|p| p.trim().parse().ok());
    let limit = params.limit.and_then(|l| l.trim().parse().ok());
    let orders = state.queries.list_orders(page, limit).await?;
    Ok(Json(SaleListResponse::from(orders)))
}

/// PUT /sales/{id}: replace the owner and total of a sale.
#[tracing::instrument(skip(state, id, body))]
pub async fn update<S: SalesStore>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<SaleRequest>, JsonRejection>,
) -> Result<Json<SaleResponse>, ApiError> {
    let order_id = parse_id(id)?;
    let request = OrderRequest::from(parse_body(body)?);
    let order = state.queries.update_order(order_id, &request).await?;
    Ok(Json(SaleResponse::from(order)))
}

/// DELETE /sales/{id}: delete a sale. Stock is not restored.
#[tracing::instrument(skip(state, id))]
pub async fn delete<S: SalesStore>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let order_id = parse_id(id)?;
    state.queries.delete_order(order_id).await?;
    Ok(Json(MessageResponse {
        status: true,
        message: "success delete sale",
    }))
}
