use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::{FulfillmentStatus, Order};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::OrderStore;

/// In-memory order store for tests and local runs.
///
/// Provides the same interface and atomicity semantics as the PostgreSQL
/// implementation: an order is inserted whole or not at all.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(StoreError::AlreadyExists(order.id()));
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(all)
    }

    async fn set_fulfillment(&self, id: OrderId, status: FulfillmentStatus) -> Result<()> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        order
            .set_fulfillment(status)
            .map_err(|e| StoreError::CorruptRow(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CustomerId, Money};
    use domain::OrderItem;

    fn sample_order() -> Order {
        Order::assemble(
            OrderId::new(),
            CustomerId::new(),
            vec![
                OrderItem::new("SKU-001", "Widget", 2, Money::from_cents(1000)),
                OrderItem::new("SKU-002", "Gadget", 1, Money::from_cents(2500)),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();

        store.insert(&order).await.unwrap();
        let loaded = store.get(order.id()).await.unwrap().unwrap();
        assert_eq!(loaded, order);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();

        store.insert(&order).await.unwrap();
        let result = store.insert(&order).await;
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryOrderStore::new();
        assert!(store.get(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let store = InMemoryOrderStore::new();
        let first = sample_order();
        store.insert(&first).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = sample_order();
        store.insert(&second).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id(), second.id());
        assert_eq!(all[1].id(), first.id());
    }

    #[tokio::test]
    async fn set_fulfillment_updates_status() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();
        store.insert(&order).await.unwrap();

        store
            .set_fulfillment(order.id(), FulfillmentStatus::StockConfirmed)
            .await
            .unwrap();

        let loaded = store.get(order.id()).await.unwrap().unwrap();
        assert_eq!(loaded.fulfillment(), FulfillmentStatus::StockConfirmed);
    }

    #[tokio::test]
    async fn set_fulfillment_never_overwrites_terminal_status() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();
        store.insert(&order).await.unwrap();

        store
            .set_fulfillment(order.id(), FulfillmentStatus::StockConfirmed)
            .await
            .unwrap();

        let result = store
            .set_fulfillment(order.id(), FulfillmentStatus::StockFailed)
            .await;
        assert!(matches!(result, Err(StoreError::CorruptRow(_))));

        let loaded = store.get(order.id()).await.unwrap().unwrap();
        assert_eq!(loaded.fulfillment(), FulfillmentStatus::StockConfirmed);
    }

    #[tokio::test]
    async fn set_fulfillment_missing_order_fails() {
        let store = InMemoryOrderStore::new();
        let result = store
            .set_fulfillment(OrderId::new(), FulfillmentStatus::StockFailed)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
