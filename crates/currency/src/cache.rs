//! Per-target-currency rate cache with retry/backoff.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::error::RateError;
use crate::source::RateSource;

/// Retry policy for transient rate-API failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles per attempt.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate: Decimal,
    fetched_at: Instant,
}

/// In-memory rate cache keyed by target currency.
///
/// A lookup miss fetches the full rate table from the source (with retry on
/// transient failures only) and caches the single requested rate. Concurrent
/// misses for the same currency may each fetch; population is a whole-entry
/// replace, so the last write wins and readers never see a partial entry.
/// Entries older than the TTL are refetched on the next lookup; a TTL of
/// `None` never expires.
pub struct RateCache<S> {
    source: S,
    ttl: Option<Duration>,
    retry: RetryPolicy,
    entries: RwLock<HashMap<String, CachedRate>>,
}

impl<S: RateSource> RateCache<S> {
    /// Creates a new cache over the given source.
    pub fn new(source: S, ttl: Option<Duration>) -> Self {
        Self {
            source,
            ttl,
            retry: RetryPolicy::default(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Overrides the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the conversion rate from `from_currency` to `to_currency`.
    ///
    /// Fails with [`RateError::UnknownCurrency`] if the target is missing
    /// from the fetched table, or [`RateError::Unavailable`] once retries
    /// are exhausted.
    #[tracing::instrument(skip(self))]
    pub async fn get_rate(
        &self,
        from_currency: &str,
        to_currency: &str,
    ) -> Result<Decimal, RateError> {
        let key = to_currency.to_uppercase();

        if let Some(entry) = self.entries.read().await.get(&key)
            && !self.is_expired(entry)
        {
            return Ok(entry.rate);
        }

        // Miss or stale entry: fetch without holding the lock, then replace
        // the whole entry.
        let table = self.fetch_with_retry(from_currency).await?;
        let rate = table
            .rates
            .get(&key)
            .copied()
            .ok_or_else(|| RateError::UnknownCurrency(key.clone()))?;

        self.entries.write().await.insert(
            key,
            CachedRate {
                rate,
                fetched_at: Instant::now(),
            },
        );

        Ok(rate)
    }

    /// Drops the cached entry for a target currency.
    pub async fn invalidate(&self, to_currency: &str) {
        self.entries
            .write()
            .await
            .remove(&to_currency.to_uppercase());
    }

    /// Drops every cached entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    fn is_expired(&self, entry: &CachedRate) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.fetched_at.elapsed() >= ttl)
    }

    async fn fetch_with_retry(
        &self,
        base: &str,
    ) -> Result<crate::source::RateTable, RateError> {
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1;
        loop {
            match self.source.fetch_table(base).await {
                Ok(table) => return Ok(table),
                // Unknown-currency cannot come out of a table fetch, but if a
                // source ever reports it, it is not transient.
                Err(err @ RateError::UnknownCurrency(_)) => return Err(err),
                Err(RateError::Unavailable(msg)) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(RateError::Unavailable(format!(
                            "rate API unavailable after {attempt} attempts: {msg}"
                        )));
                    }
                    tracing::warn!(attempt, error = %msg, "rate fetch failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
            }
        }
    }
}
