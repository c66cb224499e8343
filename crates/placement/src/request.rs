//! Placement request types and boundary validation.

use std::collections::HashSet;

use common::{CustomerId, ProductId};

use crate::error::PlacementError;

/// One requested line: a product and how many units of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// The requested product.
    pub product_id: ProductId,
    /// Units requested; must be at least 1.
    pub quantity: u32,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A request to place an order.
#[derive(Debug, Clone)]
pub struct PlacementRequest {
    /// The customer placing the order.
    pub customer_id: CustomerId,
    /// Requested lines, in order.
    pub lines: Vec<OrderLine>,
}

impl PlacementRequest {
    /// Creates a new placement request.
    pub fn new(customer_id: CustomerId, lines: Vec<OrderLine>) -> Self {
        Self { customer_id, lines }
    }

    /// Validates the request shape before any remote call is made.
    ///
    /// Rejects empty requests, quantities below 1, and duplicate product
    /// ids (each distinct product is fetched exactly once downstream).
    pub fn validate(&self) -> Result<(), PlacementError> {
        if self.lines.is_empty() {
            return Err(PlacementError::EmptyOrder);
        }

        let mut seen = HashSet::new();
        for line in &self.lines {
            if line.quantity < 1 {
                return Err(PlacementError::InvalidQuantity {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                });
            }
            if !seen.insert(line.product_id.clone()) {
                return Err(PlacementError::DuplicateProduct(line.product_id.clone()));
            }
        }
        Ok(())
    }
}
