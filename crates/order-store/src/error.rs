//! Store error types.

use common::OrderId;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An order with this ID already exists.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// The order referenced by a status update does not exist.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// A persisted row could not be mapped back to a domain value.
    #[error("Corrupt order row: {0}")]
    CorruptRow(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
