//! Rate lookup error types.

use thiserror::Error;

/// Errors a rate lookup can surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateError {
    /// The external rate API could not be reached or answered with an error.
    /// Transient; the cache retries these with backoff.
    #[error("external rate API unavailable: {0}")]
    Unavailable(String),

    /// The target currency is not in the API's rate table. Not transient;
    /// never retried.
    #[error("unknown target currency: {0}")]
    UnknownCurrency(String),
}
