//! HTTP API server for the order placement system.
//!
//! Provides REST endpoints for placing and querying orders, with structured
//! logging (tracing) and Prometheus metrics. The handlers are generic over
//! the storage backend, the remote service clients, and the exchange-rate
//! source, so tests run against in-memory fakes and production runs against
//! Postgres and live HTTP services.

pub mod config;
pub mod error;
pub mod routes;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use clients::{CustomerClient, InMemoryCustomerClient, InMemoryProductClient, ProductClient};
use currency::{RateCache, RateSource, StaticRateSource};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, OrderStore};
use placement::PlacementCoordinator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, C, P, R>(
    state: Arc<AppState<S, C, P, R>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: OrderStore + 'static,
    C: CustomerClient + 'static,
    P: ProductClient + 'static,
    R: RateSource + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S, C, P, R>))
        .route("/orders", get(routes::orders::list::<S, C, P, R>))
        .route("/orders/{id}", get(routes::orders::get::<S, C, P, R>))
        .route(
            "/orders/{id}/total",
            get(routes::orders::total::<S, C, P, R>),
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

/// Creates application state backed entirely by in-memory fakes.
///
/// Used by the integration tests and by local development without any
/// downstream services running. Returns the fakes alongside the state so
/// callers can seed customers, products, and exchange rates.
pub fn create_default_state(
    rates: HashMap<String, rust_decimal::Decimal>,
) -> (
    Arc<AppState<InMemoryOrderStore, InMemoryCustomerClient, InMemoryProductClient, StaticRateSource>>,
    InMemoryCustomerClient,
    InMemoryProductClient,
) {
    let store = InMemoryOrderStore::new();
    let customers = InMemoryCustomerClient::new();
    let products = InMemoryProductClient::new();
    let source = StaticRateSource::new("USD", rates);

    let state = Arc::new(AppState {
        coordinator: PlacementCoordinator::new(store, customers.clone(), products.clone()),
        rates: RateCache::new(source, None),
        base_currency: "USD".to_string(),
    });

    (state, customers, products)
}
