//! The order aggregate and its line items.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::fulfillment::FulfillmentStatus;

/// A line item with product data snapshotted at order time.
///
/// `product_name` and `unit_price` are copies of the product service's data,
/// captured when the order was assembled. They are intentionally denormalized
/// so historical orders keep the name and price the customer actually saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier (opaque reference into the product service).
    pub product_id: ProductId,

    /// Product name snapshot.
    pub product_name: String,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit snapshot, in cents.
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the total price for this item (quantity * unit_price).
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An order assembled by the placement workflow.
///
/// Invariant: `total() == Σ items.total_price()`. Items are fixed at
/// assembly; only the fulfillment status changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    created_at: DateTime<Utc>,
    items: Vec<OrderItem>,
    total: Money,
    fulfillment: FulfillmentStatus,
}

impl Order {
    /// Assembles a new order from snapshotted items, computing the total.
    ///
    /// Rejects empty item lists, quantities below 1, negative price
    /// snapshots, and duplicate product ids.
    pub fn assemble(
        id: OrderId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let mut seen = HashSet::new();
        for item in &items {
            if item.quantity < 1 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                });
            }
            if item.unit_price.is_negative() {
                return Err(OrderError::InvalidPrice {
                    product_id: item.product_id.clone(),
                    price_cents: item.unit_price.cents(),
                });
            }
            if !seen.insert(item.product_id.clone()) {
                return Err(OrderError::DuplicateProduct {
                    product_id: item.product_id.clone(),
                });
            }
        }

        let total = items.iter().map(OrderItem::total_price).sum();

        Ok(Self {
            id,
            customer_id,
            created_at: Utc::now(),
            items,
            total,
            fulfillment: FulfillmentStatus::Pending,
        })
    }

    /// Rehydrates an order from persisted fields, bypassing assembly checks.
    ///
    /// Only the store should call this; the persisted form is trusted.
    pub fn from_parts(
        id: OrderId,
        customer_id: CustomerId,
        created_at: DateTime<Utc>,
        items: Vec<OrderItem>,
        total: Money,
        fulfillment: FulfillmentStatus,
    ) -> Self {
        Self {
            id,
            customer_id,
            created_at,
            items,
            total,
            fulfillment,
        }
    }

    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the customer reference.
    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Returns when the order was assembled.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the line items in request order.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the order total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the fulfillment status.
    pub fn fulfillment(&self) -> FulfillmentStatus {
        self.fulfillment
    }

    /// Advances the fulfillment status.
    pub fn set_fulfillment(&mut self, next: FulfillmentStatus) -> Result<(), OrderError> {
        if !self.fulfillment.can_transition_to(next) {
            return Err(OrderError::InvalidFulfillmentTransition {
                from: self.fulfillment,
                to: next,
            });
        }
        self.fulfillment = next;
        Ok(())
    }
}
