//! Client error kinds.

use thiserror::Error;

/// Errors a remote service call can surface.
///
/// Every transport-level failure (connect error, timeout, unexpected status)
/// collapses into [`ClientError::Unavailable`]; the other variants are
/// legitimate business outcomes reported by the remote side.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The referenced entity does not exist (remote 404).
    #[error("not found")]
    NotFound,

    /// The remote side rejected a stock decrement (remote 409).
    #[error("insufficient stock: {0}")]
    InsufficientStock(String),

    /// The service could not be reached or answered with an error.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ClientError {
    /// Returns true for transport/availability failures, the only kind that
    /// should count toward opening a circuit breaker.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Unavailable(_))
    }
}
