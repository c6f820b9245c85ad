//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD for admin catalog management
//! - Atomic, conditional inventory decrement for checkout
//!
//! ## Inventory Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, compare, write (two checkouts both see 1 unit)        │
//! │     SELECT inventory ...; UPDATE products SET inventory = 0 ...        │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional statement                                 │
//! │     UPDATE products SET inventory = inventory - ?2                     │
//! │     WHERE id = ?1 AND inventory >= ?2                                  │
//! │                                                                         │
//! │  rows_affected == 1 → taken                                            │
//! │  rows_affected == 0 → product missing OR not enough stock              │
//! │                                                                         │
//! │  Σ committed amounts can never exceed the stock that existed.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{Category, Company, Product};

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, name, description, price_cents, image, category, company, colors,
        featured, free_shipping, inventory, average_rating, num_of_reviews,
        created_by, created_at, updated_at
    FROM products
"#;

/// Row shape of the `products` table.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price_cents: i64,
    image: String,
    category: Category,
    company: Company,
    /// JSON array text.
    colors: String,
    featured: bool,
    free_shipping: bool,
    inventory: i64,
    average_rating: f64,
    num_of_reviews: i64,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Product {
            colors: serde_json::from_str(&row.colors)?,
            id: row.id,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            image: row.image,
            category: row.category,
            company: row.company,
            featured: row.featured,
            free_shipping: row.free_shipping,
            inventory: row.inventory,
            average_rating: row.average_rating,
            num_of_reviews: row.num_of_reviews,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Lists the whole catalog, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} ORDER BY created_at, id"))
                .fetch_all(&self.pool)
                .await?;

        debug!(count = rows.len(), "Listed products");
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Inserts a new product (id generated beforehand).
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, image, category, company, colors,
                featured, free_shipping, inventory, average_rating, num_of_reviews,
                created_by, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.image)
        .bind(product.category)
        .bind(product.company)
        .bind(serde_json::to_string(&product.colors)?)
        .bind(product.featured)
        .bind(product.free_shipping)
        .bind(product.inventory)
        .bind(product.average_rating)
        .bind(product.num_of_reviews)
        .bind(&product.created_by)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Overwrites the mutable catalog fields of an existing product.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                image = ?5,
                category = ?6,
                company = ?7,
                colors = ?8,
                featured = ?9,
                free_shipping = ?10,
                inventory = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.image)
        .bind(product.category)
        .bind(product.company)
        .bind(serde_json::to_string(&product.colors)?)
        .bind(product.featured)
        .bind(product.free_shipping)
        .bind(product.inventory)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Hard-deletes a product. Carts and orders keep their snapshots.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Takes `amount` units of stock, or fails without touching the row.
    pub async fn decrement_inventory(&self, id: &str, amount: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        decrement_inventory_on(&mut conn, id, amount).await
    }

    /// Counts catalog entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Conditional decrement on an existing connection or open transaction.
pub(crate) async fn decrement_inventory_on(
    conn: &mut SqliteConnection,
    id: &str,
    amount: i64,
) -> DbResult<()> {
    debug!(id = %id, amount = %amount, "Decrementing inventory");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET inventory = inventory - ?2, updated_at = ?3
        WHERE id = ?1 AND inventory >= ?2
        "#,
    )
    .bind(id)
    .bind(amount)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT inventory FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        None => Err(DbError::not_found("Product", id)),
        Some(available) => Err(DbError::InsufficientInventory {
            product_id: id.to_string(),
            available,
            requested: amount,
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{file_db, memory_db, seed_product};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = memory_db().await;
        let product = seed_product(&db, "Desk", 12999, 4).await;

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();

        assert_eq!(loaded.name, "Desk");
        assert_eq!(loaded.price_cents, 12999);
        assert_eq!(loaded.colors, vec!["#222".to_string()]);
        assert_eq!(loaded.category, Category::Office);
        assert!(db.products().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = memory_db().await;
        let mut product = seed_product(&db, "Desk", 12999, 4).await;

        product.price_cents = 9999;
        product.colors = vec!["#ff0000".to_string(), "#00ff00".to_string()];
        db.products().update(&product).await.unwrap();

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.price_cents, 9999);
        assert_eq!(loaded.colors.len(), 2);

        db.products().delete(&product.id).await.unwrap();
        assert!(matches!(
            db.products().delete(&product.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_negative_inventory_rejected_by_schema() {
        let db = memory_db().await;
        let mut product = seed_product(&db, "Desk", 100, 1).await;

        product.inventory = -1;
        assert!(matches!(
            db.products().update(&product).await,
            Err(DbError::CheckViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_decrement_inventory() {
        let db = memory_db().await;
        let product = seed_product(&db, "Lamp", 500, 3).await;

        db.products().decrement_inventory(&product.id, 2).await.unwrap();

        let err = db
            .products()
            .decrement_inventory(&product.id, 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientInventory {
                available: 1,
                requested: 2,
                ..
            }
        ));

        db.products().decrement_inventory(&product.id, 1).await.unwrap();
        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.inventory, 0);

        assert!(matches!(
            db.products().decrement_inventory("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_decrement_never_oversells() {
        let (db, path) = file_db().await;
        let product = seed_product(&db, "Last Chair", 4999, 1).await;

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let repo = db.products();
                let id = product.id.clone();
                tokio::spawn(async move { repo.decrement_inventory(&id, 1).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.inventory, 0);

        db.close().await;
        let _ = std::fs::remove_file(path);
    }
}
