//! # Cart Repository
//!
//! Persistence for the one-cart-per-user document.
//!
//! A cart is stored as a `carts` row plus ordered `cart_lines`. It is always
//! written whole: [`CartRepository::save`] replaces every line inside one
//! transaction, so readers never observe a half-written cart and the stored
//! subtotal always matches the stored lines.
//!
//! ## First-Add Race
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request A                          Request B                           │
//! │  find_by_user(u) → None             find_by_user(u) → None              │
//! │  insert(cart_a)  → Ok               insert(cart_b)  → UniqueViolation   │
//! │                                     find_by_user(u) → cart_a            │
//! │                                     apply change, save(cart_a)          │
//! │                                                                         │
//! │  UNIQUE(carts.user_id) decides the winner; the loser merges.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{Cart, CartLine};

/// Constraint name reported by SQLite when a second cart is created for a user.
pub const CART_OWNER_CONSTRAINT: &str = "carts.user_id";

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: String,
    user_id: String,
    subtotal_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: String,
    product_id: String,
    name: String,
    image: String,
    price_cents: i64,
    amount: i64,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            image: row.image,
            price_cents: row.price_cents,
            amount: row.amount,
        }
    }
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Loads the cart owned by `user_id` with its lines in insertion order.
    ///
    /// Both reads share one transaction, so the subtotal matches the lines.
    pub async fn find_by_user(&self, user_id: &str) -> DbResult<Option<Cart>> {
        let mut tx = self.pool.begin().await?;

        let row: Option<CartRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, subtotal_cents, created_at, updated_at
            FROM carts
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines: Vec<CartLineRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, name, image, price_cents, amount
            FROM cart_lines
            WHERE cart_id = ?1
            ORDER BY position
            "#,
        )
        .bind(&row.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(user_id = %user_id, lines = lines.len(), "Loaded cart");

        Ok(Some(Cart {
            id: row.id,
            user_id: row.user_id,
            lines: lines.into_iter().map(CartLine::from).collect(),
            subtotal_cents: row.subtotal_cents,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    /// Creates the user's cart.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation { field: "carts.user_id", .. })` -
    ///   another request created this user's cart first; nothing was written
    pub async fn insert(&self, cart: &Cart) -> DbResult<()> {
        debug!(user_id = %cart.user_id, cart_id = %cart.id, "Creating cart");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, subtotal_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.user_id)
        .bind(cart.subtotal_cents)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field == CART_OWNER_CONSTRAINT => {
                DbError::duplicate(CART_OWNER_CONSTRAINT, &cart.user_id)
            }
            other => other,
        })?;

        insert_lines(&mut tx, &cart.id, &cart.lines).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Replaces the stored cart with `cart` (subtotal and every line).
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No cart with `cart.id`
    pub async fn save(&self, cart: &Cart) -> DbResult<()> {
        debug!(
            user_id = %cart.user_id,
            lines = cart.lines.len(),
            subtotal = cart.subtotal_cents,
            "Saving cart"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE carts SET subtotal_cents = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&cart.id)
        .bind(cart.subtotal_cents)
        .bind(cart.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart", &cart.id));
        }

        sqlx::query("DELETE FROM cart_lines WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        insert_lines(&mut tx, &cart.id, &cart.lines).await?;

        tx.commit().await?;
        Ok(())
    }
}

async fn insert_lines(conn: &mut SqliteConnection, cart_id: &str, lines: &[CartLine]) -> DbResult<()> {
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (id, cart_id, position, product_id, name, image, price_cents, amount)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&line.id)
        .bind(cart_id)
        .bind(position as i64)
        .bind(&line.product_id)
        .bind(&line.name)
        .bind(&line.image)
        .bind(line.price_cents)
        .bind(line.amount)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{file_db, memory_db, seed_product};
    use bazaar_core::cart::{clear, upsert_line};

    #[tokio::test]
    async fn test_missing_cart() {
        let db = memory_db().await;
        assert!(db.carts().find_by_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_and_load_keeps_line_order() {
        let db = memory_db().await;
        let desk = seed_product(&db, "Desk", 10000, 5).await;
        let lamp = seed_product(&db, "Lamp", 2500, 5).await;

        let mut cart = Cart::new("u-1");
        upsert_line(&mut cart, &lamp, 2).unwrap();
        upsert_line(&mut cart, &desk, 1).unwrap();
        db.carts().insert(&cart).await.unwrap();

        let loaded = db.carts().find_by_user("u-1").await.unwrap().unwrap();
        assert_eq!(loaded.id, cart.id);
        assert_eq!(loaded.subtotal_cents, 15000);
        let names: Vec<_> = loaded.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Lamp", "Desk"]);
    }

    #[tokio::test]
    async fn test_second_cart_for_user_is_rejected() {
        let db = memory_db().await;
        db.carts().insert(&Cart::new("u-1")).await.unwrap();

        let err = db.carts().insert(&Cart::new("u-1")).await.unwrap_err();
        assert!(err.is_unique_violation_on(CART_OWNER_CONSTRAINT));
    }

    #[tokio::test]
    async fn test_save_replaces_lines() {
        let db = memory_db().await;
        let desk = seed_product(&db, "Desk", 10000, 5).await;
        let lamp = seed_product(&db, "Lamp", 2500, 5).await;

        let mut cart = Cart::new("u-1");
        upsert_line(&mut cart, &desk, 1).unwrap();
        db.carts().insert(&cart).await.unwrap();

        upsert_line(&mut cart, &desk, 3).unwrap();
        upsert_line(&mut cart, &lamp, 1).unwrap();
        db.carts().save(&cart).await.unwrap();

        let loaded = db.carts().find_by_user("u-1").await.unwrap().unwrap();
        assert_eq!(loaded.lines.len(), 2);
        assert_eq!(loaded.lines[0].amount, 3);
        assert_eq!(loaded.subtotal_cents, 32500);

        clear(&mut cart);
        db.carts().save(&cart).await.unwrap();
        let loaded = db.carts().find_by_user("u-1").await.unwrap().unwrap();
        assert!(loaded.lines.is_empty());
        assert_eq!(loaded.subtotal_cents, 0);
    }

    #[tokio::test]
    async fn test_save_unknown_cart() {
        let db = memory_db().await;
        assert!(matches!(
            db.carts().save(&Cart::new("u-1")).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_first_add_creates_one_cart() {
        let (db, path) = file_db().await;

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let repo = db.carts();
                tokio::spawn(async move { repo.insert(&Cart::new("u-race")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => created += 1,
                Err(e) => assert!(e.is_unique_violation_on(CART_OWNER_CONSTRAINT)),
            }
        }
        assert_eq!(created, 1);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts WHERE user_id = 'u-race'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);

        db.close().await;
        let _ = std::fs::remove_file(path);
    }
}
