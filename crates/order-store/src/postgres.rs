use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId};
use domain::{FulfillmentStatus, Order, OrderError, OrderItem};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::OrderStore;

/// PostgreSQL-backed order store.
///
/// The order header and its items are written in one transaction; a failure
/// inserting any item rolls back the whole order.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_header(row: &PgRow) -> Result<(OrderId, CustomerId, DateTime<Utc>, Money, FulfillmentStatus)>
    {
        let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let customer_id = CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?);
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let total = Money::from_cents(row.try_get::<i64, _>("total_cents")?);
        let fulfillment: FulfillmentStatus = row
            .try_get::<String, _>("fulfillment")?
            .parse()
            .map_err(StoreError::CorruptRow)?;
        Ok((id, customer_id, created_at, total, fulfillment))
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(OrderItem {
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::CorruptRow(format!("negative quantity {quantity}")))?,
            unit_price: Money::from_cents(row.try_get::<i64, _>("unit_price_cents")?),
        })
    }

    async fn load_items(&self, id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, created_at, total_cents, fulfillment)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.customer_id().as_uuid())
        .bind(order.created_at())
        .bind(order.total().cents())
        .bind(order.fulfillment().as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return StoreError::AlreadyExists(order.id());
            }
            StoreError::Database(e)
        })?;

        for (position, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items
                    (order_id, position, product_id, product_name, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order.id().as_uuid())
            .bind(position as i32)
            .bind(item.product_id.as_str())
            .bind(&item.product_name)
            .bind(item.quantity as i32)
            .bind(item.unit_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, created_at, total_cents, fulfillment
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let (id, customer_id, created_at, total, fulfillment) = Self::row_to_header(&row)?;
        let items = self.load_items(id).await?;

        Ok(Some(Order::from_parts(
            id,
            customer_id,
            created_at,
            items,
            total,
            fulfillment,
        )))
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, created_at, total_cents, fulfillment
            FROM orders
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let (id, customer_id, created_at, total, fulfillment) = Self::row_to_header(row)?;
            let items = self.load_items(id).await?;
            orders.push(Order::from_parts(
                id,
                customer_id,
                created_at,
                items,
                total,
                fulfillment,
            ));
        }
        Ok(orders)
    }

    async fn set_fulfillment(&self, id: OrderId, status: FulfillmentStatus) -> Result<()> {
        // Guard the update with the stored status so a terminal state is
        // never overwritten, mirroring Order::set_fulfillment. Only Pending
        // orders may advance, and only to a state reachable from Pending.
        let rows_affected = if FulfillmentStatus::Pending.can_transition_to(status) {
            sqlx::query(
                r#"
                UPDATE orders SET fulfillment = $2 WHERE id = $1 AND fulfillment = $3
                "#,
            )
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(FulfillmentStatus::Pending.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected()
        } else {
            0
        };

        if rows_affected == 0 {
            // Nothing matched: either the order is missing or its current
            // status does not allow this transition.
            let row = sqlx::query("SELECT fulfillment FROM orders WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
            let Some(row) = row else {
                return Err(StoreError::NotFound(id));
            };
            let current: FulfillmentStatus = row
                .try_get::<String, _>("fulfillment")?
                .parse()
                .map_err(StoreError::CorruptRow)?;
            return Err(StoreError::CorruptRow(
                OrderError::InvalidFulfillmentTransition {
                    from: current,
                    to: status,
                }
                .to_string(),
            ));
        }
        Ok(())
    }
}
