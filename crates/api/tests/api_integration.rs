//! Integration tests for the API server.

use std::collections::HashMap;
use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use clients::{Customer, InMemoryCustomerClient, InMemoryProductClient, Product};
use common::{CustomerId, Money, ProductId};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use tower::ServiceExt;

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

fn setup() -> (axum::Router, InMemoryCustomerClient, InMemoryProductClient) {
    let mut rates = HashMap::new();
    rates.insert("EUR".to_string(), Decimal::new(9, 1)); // 0.9
    rates.insert("GBP".to_string(), Decimal::new(8, 1)); // 0.8

    let (state, customers, products) = api::create_default_state(rates);
    let app = api::create_app(state, get_metrics_handle());
    (app, customers, products)
}

fn seed_customer(customers: &InMemoryCustomerClient) -> CustomerId {
    let customer = Customer {
        id: CustomerId::new(),
        name: "Grace Hopper".to_string(),
        email: "grace@example.com".to_string(),
    };
    let id = customer.id;
    customers.add_customer(customer);
    id
}

fn seed_product(products: &InMemoryProductClient, sku: &str, cents: i64, stock: u32) {
    products.add_product(Product {
        id: ProductId::new(sku),
        name: format!("{sku} Widget"),
        price: Money::from_cents(cents),
        stock,
    });
}

async fn place_order(
    app: &axum::Router,
    customer_id: &str,
    items: serde_json::Value,
) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&serde_json::json!({
                        "customer_id": customer_id,
                        "items": items,
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "order-placement");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _, _) = setup();

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
}

#[tokio::test]
async fn test_place_order() {
    let (app, customers, products) = setup();
    let customer_id = seed_customer(&customers);
    seed_product(&products, "SKU-001", 1000, 5);

    let response = place_order(
        &app,
        &customer_id.to_string(),
        serde_json::json!([{ "product_id": "SKU-001", "quantity": 2 }]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_json(response).await;
    assert_eq!(json["total_cents"], 2000);
    assert_eq!(json["fulfillment"], "StockConfirmed");
    assert_eq!(json["customer_name"], "Grace Hopper");
    assert_eq!(json["customer_email"], "grace@example.com");
    assert_eq!(json["items"][0]["product_name"], "SKU-001 Widget");
    assert_eq!(json["items"][0]["unit_price_cents"], 1000);
    assert!(json["id"].as_str().is_some());

    // Remote stock was decremented.
    assert_eq!(products.stock_of(&ProductId::new("SKU-001")), Some(3));
}

#[tokio::test]
async fn test_place_order_insufficient_stock() {
    let (app, customers, products) = setup();
    let customer_id = seed_customer(&customers);
    seed_product(&products, "SKU-001", 1000, 1);

    let response = place_order(
        &app,
        &customer_id.to_string(),
        serde_json::json!([{ "product_id": "SKU-001", "quantity": 2 }]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = get_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("SKU-001"));
    assert!(message.contains('2'));
    assert!(message.contains('1'));
}

#[tokio::test]
async fn test_place_order_unknown_customer() {
    let (app, _, products) = setup();
    seed_product(&products, "SKU-001", 1000, 5);

    let response = place_order(
        &app,
        &CustomerId::new().to_string(),
        serde_json::json!([{ "product_id": "SKU-001", "quantity": 1 }]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_place_order_unknown_product() {
    let (app, customers, _) = setup();
    let customer_id = seed_customer(&customers);

    let response = place_order(
        &app,
        &customer_id.to_string(),
        serde_json::json!([{ "product_id": "SKU-404", "quantity": 1 }]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_place_order_invalid_customer_id() {
    let (app, _, _) = setup();

    let response = place_order(
        &app,
        "not-a-uuid",
        serde_json::json!([{ "product_id": "SKU-001", "quantity": 1 }]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_place_order_validation_errors() {
    let (app, customers, _) = setup();
    let customer_id = seed_customer(&customers);

    // No items.
    let response = place_order(&app, &customer_id.to_string(), serde_json::json!([])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Zero quantity.
    let response = place_order(
        &app,
        &customer_id.to_string(),
        serde_json::json!([{ "product_id": "SKU-001", "quantity": 0 }]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_place_order_failing_product_service_is_bad_gateway() {
    let (app, customers, products) = setup();
    let customer_id = seed_customer(&customers);
    seed_product(&products, "SKU-001", 1000, 5);
    products.set_fail_on_get(true);

    let response = place_order(
        &app,
        &customer_id.to_string(),
        serde_json::json!([{ "product_id": "SKU-001", "quantity": 1 }]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    // The outward message stays generic; no upstream detail leaks.
    let json = get_json(response).await;
    assert_eq!(json["error"], "Upstream service unavailable, please retry");
}

#[tokio::test]
async fn test_get_order() {
    let (app, customers, products) = setup();
    let customer_id = seed_customer(&customers);
    seed_product(&products, "SKU-001", 2500, 5);

    let created = get_json(
        place_order(
            &app,
            &customer_id.to_string(),
            serde_json::json!([{ "product_id": "SKU-001", "quantity": 1 }]),
        )
        .await,
    )
    .await;
    let order_id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json(response).await;
    assert_eq!(json["id"], order_id);
    assert_eq!(json["total_cents"], 2500);
    assert_eq!(json["customer_id"], customer_id.to_string());
}

#[tokio::test]
async fn test_get_order_not_found() {
    let (app, _, _) = setup();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/orders/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_orders() {
    let (app, customers, products) = setup();
    let customer_id = seed_customer(&customers);
    seed_product(&products, "SKU-001", 1000, 10);
    seed_product(&products, "SKU-002", 500, 10);

    for sku in ["SKU-001", "SKU-002"] {
        let response = place_order(
            &app,
            &customer_id.to_string(),
            serde_json::json!([{ "product_id": sku, "quantity": 1 }]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/orders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json(response).await;
    let orders = json.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    // Newest first.
    assert_eq!(orders[0]["items"][0]["product_id"], "SKU-002");
}

#[tokio::test]
async fn test_converted_total() {
    let (app, customers, products) = setup();
    let customer_id = seed_customer(&customers);
    seed_product(&products, "SKU-001", 1000, 5);

    let created = get_json(
        place_order(
            &app,
            &customer_id.to_string(),
            serde_json::json!([{ "product_id": "SKU-001", "quantity": 1 }]),
        )
        .await,
    )
    .await;
    let order_id = created["id"].as_str().unwrap();

    // Lowercase query currency is accepted; 10.00 USD * 0.9 = 9.00 EUR.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}/total?currency=eur"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json(response).await;
    assert_eq!(json["base_currency"], "USD");
    assert_eq!(json["total_cents"], 1000);
    assert_eq!(json["currency"], "EUR");
    assert_eq!(json["rate"], "0.9");
    assert_eq!(json["converted_total"], "9.00");
}

#[tokio::test]
async fn test_converted_total_unknown_currency() {
    let (app, customers, products) = setup();
    let customer_id = seed_customer(&customers);
    seed_product(&products, "SKU-001", 1000, 5);

    let created = get_json(
        place_order(
            &app,
            &customer_id.to_string(),
            serde_json::json!([{ "product_id": "SKU-001", "quantity": 1 }]),
        )
        .await,
    )
    .await;
    let order_id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}/total?currency=XYZ"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
