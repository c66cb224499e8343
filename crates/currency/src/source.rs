//! Rate table sources.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::RateError;

/// The full conversion table for one base currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    /// The base currency the rates convert from.
    pub base: String,
    /// Conversion rate per target currency code.
    pub rates: HashMap<String, Decimal>,
}

/// Trait for fetching the rate table of a base currency.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the full rate table for `base`.
    async fn fetch_table(&self, base: &str) -> Result<RateTable, RateError>;
}

/// Wire representation of the external rate API response.
#[derive(Debug, Deserialize)]
struct RateTableDto {
    base_code: String,
    conversion_rates: HashMap<String, Decimal>,
}

/// HTTP source backed by the external exchange-rate API.
///
/// Issues `GET {base_url}/latest/{base}`; any 4xx/5xx answer or transport
/// failure (including timeout) maps to [`RateError::Unavailable`].
#[derive(Clone)]
pub struct HttpRateSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRateSource {
    /// Creates a new source for the given API base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| RateError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_table(&self, base: &str) -> Result<RateTable, RateError> {
        let url = format!("{}/latest/{}", self.base_url, base.to_uppercase());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RateError::Unavailable(format!(
                "rate API returned {status}: {body}"
            )));
        }

        let dto = response
            .json::<RateTableDto>()
            .await
            .map_err(|e| RateError::Unavailable(e.to_string()))?;

        Ok(RateTable {
            base: dto.base_code,
            rates: dto.conversion_rates,
        })
    }
}

#[derive(Debug, Default)]
struct StaticRateState {
    fail_remaining: u32,
    fetch_calls: u32,
}

/// In-memory rate source for testing.
///
/// Returns a fixed table, optionally failing the next N fetches with a
/// transport error to exercise the retry policy.
#[derive(Clone)]
pub struct StaticRateSource {
    table: Arc<RateTable>,
    state: Arc<Mutex<StaticRateState>>,
}

impl StaticRateSource {
    /// Creates a source that always returns the given table.
    pub fn new(base: impl Into<String>, rates: HashMap<String, Decimal>) -> Self {
        Self {
            table: Arc::new(RateTable {
                base: base.into(),
                rates,
            }),
            state: Arc::new(Mutex::new(StaticRateState::default())),
        }
    }

    /// Makes the next `n` fetches fail with a transport error.
    pub fn fail_next(&self, n: u32) {
        self.state.lock().unwrap().fail_remaining = n;
    }

    /// Returns how many fetches were attempted.
    pub fn fetch_call_count(&self) -> u32 {
        self.state.lock().unwrap().fetch_calls
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn fetch_table(&self, _base: &str) -> Result<RateTable, RateError> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        if state.fail_remaining > 0 {
            state.fail_remaining -= 1;
            return Err(RateError::Unavailable("rate API down".to_string()));
        }
        Ok((*self.table).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_table_wire_format() {
        let json = r#"{
            "base_code": "USD",
            "conversion_rates": {"EUR": 0.92, "GBP": 0.79}
        }"#;
        let dto: RateTableDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.base_code, "USD");
        assert_eq!(dto.conversion_rates["EUR"], Decimal::new(92, 2));
    }

    #[tokio::test]
    async fn test_static_source_fail_then_recover() {
        let source = StaticRateSource::new(
            "USD",
            HashMap::from([("EUR".to_string(), Decimal::new(92, 2))]),
        );
        source.fail_next(1);

        assert!(source.fetch_table("USD").await.is_err());
        let table = source.fetch_table("USD").await.unwrap();
        assert_eq!(table.rates["EUR"], Decimal::new(92, 2));
        assert_eq!(source.fetch_call_count(), 2);
    }
}
