//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — Postgres URL; in-memory storage when unset
/// - `CUSTOMER_SERVICE_URL` — customer service base URL
/// - `PRODUCT_SERVICE_URL` — product service base URL
/// - `RATE_API_URL` — exchange-rate API base URL
/// - `BASE_CURRENCY` — currency orders are priced in (default: `"USD"`)
/// - `RATE_TTL_SECS` — rate cache TTL; `0` caches forever (default: `300`)
/// - `CLIENT_TIMEOUT_SECS` — outbound HTTP timeout (default: `5`)
/// - `BREAKER_FAILURE_THRESHOLD` — failures before the customer-check
///   circuit opens (default: `5`)
/// - `BREAKER_COOLDOWN_SECS` — open-circuit cooldown (default: `30`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub customer_service_url: String,
    pub product_service_url: String,
    pub rate_api_url: String,
    pub base_currency: String,
    pub rate_ttl: Option<Duration>,
    pub client_timeout: Duration,
    pub breaker_failure_threshold: u32,
    pub breaker_cooldown: Duration,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let ttl_secs: u64 = env_parse("RATE_TTL_SECS", 300);
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            customer_service_url: std::env::var("CUSTOMER_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8081/api/customers".to_string()),
            product_service_url: std::env::var("PRODUCT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8082/api/products".to_string()),
            rate_api_url: std::env::var("RATE_API_URL")
                .unwrap_or_else(|_| "https://open.er-api.com/v6".to_string()),
            base_currency: std::env::var("BASE_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            rate_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            client_timeout: Duration::from_secs(env_parse("CLIENT_TIMEOUT_SECS", 5)),
            breaker_failure_threshold: env_parse("BREAKER_FAILURE_THRESHOLD", 5),
            breaker_cooldown: Duration::from_secs(env_parse("BREAKER_COOLDOWN_SECS", 30)),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            customer_service_url: "http://localhost:8081/api/customers".to_string(),
            product_service_url: "http://localhost:8082/api/products".to_string(),
            rate_api_url: "https://open.er-api.com/v6".to_string(),
            base_currency: "USD".to_string(),
            rate_ttl: Some(Duration::from_secs(300)),
            client_timeout: Duration::from_secs(5),
            breaker_failure_threshold: 5,
            breaker_cooldown: Duration::from_secs(30),
        }
    }
}
