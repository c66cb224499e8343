//! The placement coordinator.

use std::sync::Arc;

use clients::{CircuitBreaker, ClientError, Customer, CustomerClient, ProductClient};
use common::{CustomerId, OrderId};
use domain::{FulfillmentStatus, Order, OrderItem};
use futures_util::future::{join_all, try_join_all};
use order_store::OrderStore;

use crate::error::PlacementError;
use crate::request::PlacementRequest;

/// The outcome of a successful placement: the persisted order plus the
/// customer data needed for the response.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    /// The persisted order, with its post-decrement fulfillment status.
    pub order: Order,
    /// Customer name at placement time.
    pub customer_name: String,
    /// Customer email at placement time.
    pub customer_email: String,
}

/// Orchestrates the order placement saga.
///
/// The phases are: validate → concurrent remote reads (customer guarded by
/// the circuit breaker, one product fetch per distinct line) → barrier →
/// stock check → assemble with snapshots → atomic local write → post-commit
/// stock-decrement fan-out → fulfillment status update.
pub struct PlacementCoordinator<S, C, P>
where
    S: OrderStore,
    C: CustomerClient,
    P: ProductClient,
{
    store: S,
    customers: C,
    products: P,
    breaker: Arc<CircuitBreaker>,
}

impl<S, C, P> PlacementCoordinator<S, C, P>
where
    S: OrderStore,
    C: CustomerClient,
    P: ProductClient,
{
    /// Creates a new coordinator with a default circuit breaker around the
    /// customer existence check.
    pub fn new(store: S, customers: C, products: P) -> Self {
        Self {
            store,
            customers,
            products,
            breaker: Arc::new(CircuitBreaker::default()),
        }
    }

    /// Replaces the customer-check circuit breaker.
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    /// Returns the customer-check circuit breaker.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Places an order.
    ///
    /// Validation, not-found, insufficient-stock, and read-phase transport
    /// failures all abort before anything is written. Once the order is
    /// persisted it is never rolled back: a stock-decrement failure is
    /// recorded as [`FulfillmentStatus::StockFailed`] and alarmed, and the
    /// receipt is still returned.
    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn place_order(
        &self,
        request: PlacementRequest,
    ) -> Result<OrderReceipt, PlacementError> {
        metrics::counter!("order_placements_total").increment(1);
        let start = std::time::Instant::now();

        request.validate()?;

        // Fan out the customer read and one read per product, then join.
        // Any single failure fails the whole request before any write.
        let product_futs = try_join_all(request.lines.iter().map(|line| {
            let products = &self.products;
            async move {
                products.get_product(&line.product_id).await.map_err(|e| match e {
                    ClientError::NotFound => {
                        PlacementError::ProductNotFound(line.product_id.clone())
                    }
                    other => PlacementError::Unavailable(other.to_string()),
                })
            }
        }));
        let (customer, products) =
            tokio::try_join!(self.validate_customer(request.customer_id), product_futs)?;

        // Per-line stock check; no partial order is ever created.
        let mut items = Vec::with_capacity(request.lines.len());
        for (line, product) in request.lines.iter().zip(&products) {
            if product.stock < line.quantity {
                metrics::counter!("order_placements_insufficient_stock_total").increment(1);
                return Err(PlacementError::InsufficientStock {
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    requested: line.quantity,
                    available: product.stock,
                });
            }
            // Snapshot: the name and price the customer saw, copied into the
            // order so later catalog changes never alter it.
            items.push(OrderItem::new(
                product.id.clone(),
                product.name.clone(),
                line.quantity,
                product.price,
            ));
        }

        let mut order = Order::assemble(OrderId::new(), request.customer_id, items)?;
        self.store.insert(&order).await?;
        tracing::info!(order_id = %order.id(), total = %order.total(), "order persisted");

        // Post-commit phase: not atomic with the write above.
        let status = self.decrement_stock(&order).await;
        self.store.set_fulfillment(order.id(), status).await?;
        order.set_fulfillment(status)?;

        metrics::histogram!("order_placement_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        metrics::counter!("order_placements_completed_total").increment(1);

        Ok(OrderReceipt {
            order,
            customer_name: customer.name,
            customer_email: customer.email,
        })
    }

    /// Loads a persisted order.
    pub async fn get_order(&self, id: OrderId) -> Result<Option<Order>, PlacementError> {
        Ok(self.store.get(id).await?)
    }

    /// Lists persisted orders, newest first.
    pub async fn list_orders(&self) -> Result<Vec<Order>, PlacementError> {
        Ok(self.store.list().await?)
    }

    /// Customer existence check behind the circuit breaker.
    ///
    /// A remote 404 is a business outcome and counts as breaker success;
    /// only transport failures open the breaker. With the breaker open the
    /// fallback raises `Unavailable` without touching the remote.
    async fn validate_customer(&self, id: CustomerId) -> Result<Customer, PlacementError> {
        if !self.breaker.try_acquire() {
            metrics::counter!("customer_check_short_circuited_total").increment(1);
            return Err(PlacementError::Unavailable(
                "customer service circuit open".to_string(),
            ));
        }

        match self.customers.get_customer(id).await {
            Ok(customer) => {
                self.breaker.record_success();
                Ok(customer)
            }
            Err(ClientError::NotFound) => {
                self.breaker.record_success();
                Err(PlacementError::CustomerNotFound(id))
            }
            Err(e) => {
                if e.is_transport() {
                    self.breaker.record_failure();
                } else {
                    self.breaker.record_success();
                }
                Err(PlacementError::Unavailable(e.to_string()))
            }
        }
    }

    /// Fans out one remote stock decrement per item and reports the combined
    /// outcome. Runs every call to completion; one product's failure must
    /// not cancel the others.
    async fn decrement_stock(&self, order: &Order) -> FulfillmentStatus {
        let results = join_all(order.items().iter().map(|item| {
            let products = &self.products;
            async move {
                (
                    item.product_id.clone(),
                    products.decrement_stock(&item.product_id, item.quantity).await,
                )
            }
        }))
        .await;

        let mut failed = false;
        for (product_id, result) in results {
            if let Err(e) = result {
                failed = true;
                metrics::counter!("order_consistency_alarms_total").increment(1);
                tracing::error!(
                    order_id = %order.id(),
                    %product_id,
                    error = %e,
                    "CRITICAL consistency failure: order persisted but remote stock \
                     decrement failed; manual compensation required"
                );
            }
        }

        if failed {
            FulfillmentStatus::StockFailed
        } else {
            FulfillmentStatus::StockConfirmed
        }
    }
}
