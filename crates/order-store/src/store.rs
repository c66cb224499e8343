//! The order store trait.

use async_trait::async_trait;
use common::OrderId;
use domain::{FulfillmentStatus, Order};

use crate::error::Result;

/// Persistence interface for orders.
///
/// `insert` is atomic over the order header and all of its items: either the
/// whole order exists afterwards or none of it does. Orders are immutable
/// once inserted except for the fulfillment status.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order with all of its items.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Loads an order by ID, or `None` if it does not exist.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all persisted orders, newest first.
    async fn list(&self) -> Result<Vec<Order>>;

    /// Updates the fulfillment status of an existing order.
    async fn set_fulfillment(&self, id: OrderId, status: FulfillmentStatus) -> Result<()>;
}
