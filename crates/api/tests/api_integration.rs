//! Integration tests for the API server.

use std::str::FromStr;
use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::ItemId;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryStore, StockReader};
use rust_decimal::Decimal;
use tower::ServiceExt;

use api::config::Config;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup() -> (axum::Router, InMemoryStore) {
    let store = InMemoryStore::new();
    store.put_item(ItemId::new(1), 10, 2).await;
    store.put_item(ItemId::new(2), 5, 1).await;
    let state = api::create_state(store.clone(), &Config::default());
    let app = api::create_app(state, get_metrics_handle());
    (app, store)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

fn decimal(value: &serde_json::Value) -> Decimal {
    assert!(value.is_number(), "amount should be a JSON number: {value}");
    Decimal::from_str(&value.to_string()).unwrap()
}

fn sale_body() -> serde_json::Value {
    serde_json::json!({
        "user_id": 1,
        "items": [
            { "item_id": 1, "quantity": 2, "price": 50.0 },
            { "item_id": 2, "quantity": 1, "price": 100.0 }
        ]
    })
}

async fn stock(store: &InMemoryStore, item: i64) -> i32 {
    store
        .stock_level(ItemId::new(item))
        .await
        .unwrap()
        .unwrap()
        .stock
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup().await;

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_sale() {
    let (app, store) = setup().await;

    let (status, json) = send(&app, "POST", "/sales", Some(sale_body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(json["id"].as_i64().unwrap() > 0);
    assert_eq!(json["user_id"], 1);
    assert_eq!(decimal(&json["total_amount"]), Decimal::new(200, 0));
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(decimal(&items[0]["subtotal"]), Decimal::new(100, 0));
    assert!(json["created_at"].as_str().is_some());

    assert_eq!(stock(&store, 1).await, 8);
    assert_eq!(stock(&store, 2).await, 4);
}

#[tokio::test]
async fn test_create_sale_with_insufficient_stock() {
    let (app, store) = setup().await;
    let body = serde_json::json!({
        "user_id": 1,
        "items": [
            { "item_id": 1, "quantity": 1, "price": 10 },
            { "item_id": 2, "quantity": 6, "price": 10 }
        ]
    });

    let (status, json) = send(&app, "POST", "/sales", Some(body)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("Insufficient stock"));
    assert_eq!(stock(&store, 1).await, 10);
    assert_eq!(store.order_count().await, 0);
}

#[tokio::test]
async fn test_create_sale_validation_errors() {
    let (app, _) = setup().await;

    let cases = [
        serde_json::json!({ "user_id": 1, "items": [] }),
        serde_json::json!({ "items": [{ "item_id": 1, "quantity": 1, "price": 10 }] }),
        serde_json::json!({ "user_id": 1, "items": [{ "item_id": 1, "quantity": 0, "price": 10 }] }),
        serde_json::json!({ "user_id": 1, "items": [{ "item_id": 1, "quantity": 1, "price": 0 }] }),
    ];

    for body in cases {
        let (status, json) = send(&app, "POST", "/sales", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json["status"], false);
    }
}

#[tokio::test]
async fn test_create_sale_with_overflowing_amount() {
    let (app, store) = setup().await;
    // Largest representable price: valid on its own, too large once doubled.
    let body: serde_json::Value = serde_json::from_str(
        r#"{
            "user_id": 1,
            "items": [{ "item_id": 1, "quantity": 2, "price": 79228162514264337593543950335 }]
        }"#,
    )
    .unwrap();

    let (status, json) = send(&app, "POST", "/sales", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("too large"));
    assert_eq!(stock(&store, 1).await, 10);
    assert_eq!(store.order_count().await, 0);
}

#[tokio::test]
async fn test_create_sale_with_malformed_body() {
    let (app, _) = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/sales")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_sale_with_unknown_item() {
    let (app, store) = setup().await;
    let body = serde_json::json!({
        "user_id": 1,
        "items": [{ "item_id": 99, "quantity": 1, "price": 10 }]
    });

    let (status, _) = send(&app, "POST", "/sales", Some(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(store.order_count().await, 0);
}

#[tokio::test]
async fn test_create_and_get_sale() {
    let (app, _) = setup().await;
    let (_, created) = send(&app, "POST", "/sales", Some(sale_body())).await;
    let id = created["id"].as_i64().unwrap();

    let (status, json) = send(&app, "GET", &format!("/sales/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, created);
}

#[tokio::test]
async fn test_get_missing_sale() {
    let (app, _) = setup().await;

    let (status, _) = send(&app, "GET", "/sales/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/sales/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_sales_with_pagination() {
    let (app, _) = setup().await;
    for _ in 0..3 {
        let body = serde_json::json!({
            "user_id": 1,
            "items": [{ "item_id": 1, "quantity": 1, "price": 5 }]
        });
        let (status, _) = send(&app, "POST", "/sales", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = send(&app, "GET", "/sales?page=1&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pagination"]["page"], 1);
    assert_eq!(json["pagination"]["limit"], 2);
    assert_eq!(json["pagination"]["total"], 3);
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data[0]["id"].as_i64().unwrap() > data[1]["id"].as_i64().unwrap());

    let uri = format!("/sales?page={}&limit=100", i64::MAX);
    let (status, json) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].as_array().unwrap().is_empty());
    assert_eq!(json["pagination"]["total"], 3);

    let (status, json) = send(&app, "GET", "/sales?page=abc&limit=-4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pagination"]["page"], 1);
    assert_eq!(json["pagination"]["limit"], 10);
}

#[tokio::test]
async fn test_update_sale() {
    let (app, store) = setup().await;
    let (_, created) = send(&app, "POST", "/sales", Some(sale_body())).await;
    let id = created["id"].as_i64().unwrap();

    let body = serde_json::json!({
        "user_id": 2,
        "items": [{ "item_id": 1, "quantity": 3, "price": 10 }]
    });
    let (status, json) = send(&app, "PUT", &format!("/sales/{id}"), Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user_id"], 2);
    assert_eq!(decimal(&json["total_amount"]), Decimal::new(30, 0));
    assert_eq!(json["items"], created["items"]);
    assert_eq!(stock(&store, 1).await, 8);

    let (status, _) = send(
        &app,
        "PUT",
        "/sales/999",
        Some(serde_json::json!({
            "user_id": 2,
            "items": [{ "item_id": 1, "quantity": 1, "price": 1 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_sale() {
    let (app, store) = setup().await;
    let (_, created) = send(&app, "POST", "/sales", Some(sale_body())).await;
    let id = created["id"].as_i64().unwrap();

    let (status, json) = send(&app, "DELETE", &format!("/sales/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], true);

    let (status, _) = send(&app, "GET", &format!("/sales/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &format!("/sales/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(stock(&store, 1).await, 8);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup().await;
    send(&app, "POST", "/sales", Some(sale_body())).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("fulfillment_attempts_total"));
}
