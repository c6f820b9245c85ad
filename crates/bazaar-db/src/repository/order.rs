//! # Order Repository
//!
//! Order persistence and the all-or-nothing checkout write.
//!
//! ## Placement Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    OrderRepository::place                               │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── for each item: conditional inventory decrement                   │
//! │   │        └── 0 rows ──► ROLLBACK, InsufficientInventory / NotFound   │
//! │   ├── INSERT orders                                                     │
//! │   └── INSERT order_items (position = item index)                       │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Either the order exists and every product lost exactly its amount,    │
//! │  or nothing changed.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::product::decrement_inventory_on;
use crate::error::{DbError, DbResult};
use bazaar_core::{Order, OrderItem, OrderStatus};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    subtotal_cents: i64,
    tax_cents: i64,
    shipping_fee_cents: i64,
    total_cents: i64,
    client_secret: String,
    payment_intent_id: Option<String>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            items,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            shipping_fee_cents: self.shipping_fee_cents,
            total_cents: self.total_cents,
            client_secret: self.client_secret,
            payment_intent_id: self.payment_intent_id,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    product_id: String,
    name: String,
    image: String,
    price_cents: i64,
    amount: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            image: row.image,
            price_cents: row.price_cents,
            amount: row.amount,
        }
    }
}

const SELECT_ORDER: &str = r#"
    SELECT
        id, user_id, subtotal_cents, tax_cents, shipping_fee_cents, total_cents,
        client_secret, payment_intent_id, status, created_at, updated_at
    FROM orders
"#;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Reserves stock for every item and stores the order, atomically.
    ///
    /// ## Returns
    /// * `Err(DbError::InsufficientInventory)` - Some item lost the race for stock
    /// * `Err(DbError::NotFound)` - A product was deleted since it was fetched
    ///
    /// On error no inventory is decremented and no order row exists.
    pub async fn place(&self, order: &Order) -> DbResult<()> {
        debug!(
            order_id = %order.id,
            user_id = %order.user_id,
            items = order.items.len(),
            total = order.total_cents,
            "Placing order"
        );

        let mut tx = self.pool.begin().await?;

        for item in &order.items {
            // Dropping `tx` on the error path rolls everything back.
            decrement_inventory_on(&mut tx, &item.product_id, item.amount).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, subtotal_cents, tax_cents, shipping_fee_cents, total_cents,
                client_secret, payment_intent_id, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.shipping_fee_cents)
        .bind(order.total_cents)
        .bind(&order.client_secret)
        .bind(&order.payment_intent_id)
        .bind(order.status)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, position, product_id, name, image, price_cents, amount)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&order.id)
            .bind(position as i64)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(&item.image)
            .bind(item.price_cents)
            .bind(item.amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(order_id = %order.id, total = order.total_cents, "Order placed");
        Ok(())
    }

    /// Gets an order with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let items = self.items_for(&row.id).await?;
                Ok(Some(row.into_order(items)))
            }
            None => Ok(None),
        }
    }

    /// Orders placed by `user_id`, oldest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> =
            sqlx::query_as(&format!("{SELECT_ORDER} WHERE user_id = ?1 ORDER BY created_at, id"))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        self.with_items(rows).await
    }

    /// Every order in the store, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!("{SELECT_ORDER} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await?;

        self.with_items(rows).await
    }

    /// Persists the payment confirmation. Items and money columns are never
    /// rewritten.
    pub async fn update_payment(&self, order: &Order) -> DbResult<()> {
        debug!(order_id = %order.id, status = ?order.status, "Updating order payment");

        let result = sqlx::query(
            r#"
            UPDATE orders SET status = ?2, payment_intent_id = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&order.id)
        .bind(order.status)
        .bind(&order.payment_intent_id)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", &order.id));
        }

        Ok(())
    }

    async fn items_for(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, name, image, price_cents, amount
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn with_items(&self, rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(&row.id).await?;
            orders.push(row.into_order(items));
        }
        Ok(orders)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
