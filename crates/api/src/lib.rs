//! HTTP API for the inventory sales engine.
//!
//! Exposes the sales endpoints on top of the fulfillment coordinator and the
//! order query service, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use fulfillment::{FulfillmentCoordinator, OrderQueryService};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::sales::{AppState, SalesStore};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: SalesStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/sales",
            get(routes::sales::list::<S>).post(routes::sales::create::<S>),
        )
        .route(
            "/sales/{id}",
            get(routes::sales::get::<S>)
                .put(routes::sales::update::<S>)
                .delete(routes::sales::delete::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over one store.
pub fn create_state<S: SalesStore>(store: S, config: &Config) -> Arc<AppState<S>> {
    let coordinator =
        FulfillmentCoordinator::new(store.clone()).with_timeout(config.fulfillment_timeout);
    let queries = OrderQueryService::new(store).with_default_limit(config.page_limit);
    Arc::new(AppState {
        coordinator,
        queries,
    })
}
