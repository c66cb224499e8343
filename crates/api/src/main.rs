//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::routes::orders::AppState;
use clients::{BreakerConfig, CircuitBreaker, HttpCustomerClient, HttpProductClient};
use currency::{HttpRateSource, RateCache};
use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use placement::PlacementCoordinator;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Builds the application around the given store and serves it.
async fn serve<S: OrderStore + 'static>(store: S, config: Config) {
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let customers =
        HttpCustomerClient::new(&config.customer_service_url, config.client_timeout)
            .expect("failed to build customer client");
    let products = HttpProductClient::new(&config.product_service_url, config.client_timeout)
        .expect("failed to build product client");
    let rate_source = HttpRateSource::new(&config.rate_api_url, config.client_timeout)
        .expect("failed to build rate source");

    let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
        failure_threshold: config.breaker_failure_threshold,
        cooldown: config.breaker_cooldown,
    }));

    let state = Arc::new(AppState {
        coordinator: PlacementCoordinator::new(store, customers, products)
            .with_breaker(breaker),
        rates: RateCache::new(rate_source, config.rate_ttl),
        base_currency: config.base_currency.clone(),
    });

    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    match config.database_url.clone() {
        Some(url) => {
            let pool = sqlx::PgPool::connect(&url)
                .await
                .expect("failed to connect to Postgres");
            let store = PostgresOrderStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            tracing::info!("using Postgres order store");
            serve(store, config).await;
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory order store");
            serve(InMemoryOrderStore::new(), config).await;
        }
    }
}
