//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment::{FulfillmentError, QueryError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Order fulfillment error.
    Fulfillment(FulfillmentError),
    /// Order read or maintenance error.
    Query(QueryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Query(err) => query_error_to_response(err),
        };

        let body = serde_json::json!({ "status": false, "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    match &err {
        FulfillmentError::Invalid(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        FulfillmentError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        FulfillmentError::PersistenceFailure { source, .. } if source.is_constraint_violation() => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        FulfillmentError::PersistenceFailure { .. } | FulfillmentError::TimedOut { .. } => {
            tracing::error!(error = %err, "order could not be fulfilled");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
    }
}

fn query_error_to_response(err: QueryError) -> (StatusCode, String) {
    match &err {
        QueryError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        QueryError::Invalid(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        QueryError::Store(_) => {
            tracing::error!(error = %err, "storage error");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}
