//! Placement error types.

use common::{CustomerId, ProductId};
use domain::OrderError;
use order_store::StoreError;
use thiserror::Error;

/// Errors that can abort an order placement.
///
/// Everything here is raised before the local write, except [`Store`]
/// failures from the write itself; post-commit decrement failures are not
/// errors (the order was created) and surface as the fulfillment status.
///
/// [`Store`]: PlacementError::Store
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The request contained no lines.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// A line requested a quantity below 1.
    #[error("Invalid quantity {quantity} for product {product_id}: must be at least 1")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// The same product appeared in more than one line.
    #[error("Duplicate product in request: {0}")]
    DuplicateProduct(ProductId),

    /// The referenced customer does not exist.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// A referenced product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A product has less stock than requested.
    #[error(
        "Insufficient stock for {product_name} ({product_id}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: u32,
        available: u32,
    },

    /// A remote dependency could not be reached (or its circuit is open).
    #[error("Dependency unavailable: {0}")]
    Unavailable(String),

    /// Order aggregate error.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
