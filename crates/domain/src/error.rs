//! Domain error types.

use common::ProductId;
use thiserror::Error;

use crate::fulfillment::FulfillmentStatus;

/// Errors that can occur while building or mutating an order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// An order must contain at least one item.
    #[error("Order has no items")]
    NoItems,

    /// Item quantity must be at least 1.
    #[error("Invalid quantity {quantity} for product {product_id}: must be at least 1")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// Item price snapshot must not be negative.
    #[error("Invalid price {price_cents} cents for product {product_id}: must not be negative")]
    InvalidPrice {
        product_id: ProductId,
        price_cents: i64,
    },

    /// The same product appeared more than once in the item list.
    #[error("Duplicate product in order: {product_id}")]
    DuplicateProduct { product_id: ProductId },

    /// The requested fulfillment transition is not allowed.
    #[error("Invalid fulfillment transition from {from} to {to}")]
    InvalidFulfillmentTransition {
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    },
}
