//! # Cart Engine
//!
//! Get, set-quantity, remove and clear for the caller's single cart.
//!
//! ## AddOrUpdateItem Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate amount ──► fetch product (NotFound)                           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  find cart ── Some ──► upsert_line ──► save            → created: false │
//! │        │                                                                │
//! │        None                                                             │
//! │        ▼                                                                │
//! │  Cart::new + upsert_line ──► insert                    → created: true  │
//! │        │                                                                │
//! │        └── UniqueViolation(carts.user_id)                               │
//! │               └──► re-read winner, upsert_line, save   → created: false │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info, warn};

use bazaar_core::cart::{clear, remove_line, upsert_line};
use bazaar_core::validation::validate_quantity;
use bazaar_core::{Cart, CoreError, Product};
use bazaar_db::repository::cart::CART_OWNER_CONSTRAINT;
use bazaar_db::{CartRepository, DbError, ProductRepository};

use super::{EngineError, EngineResult};

/// Result of [`CartEngine::add_or_update_item`].
#[derive(Debug, Clone)]
pub struct CartUpdate {
    pub cart: Cart,
    /// True when this call created the user's cart.
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct CartEngine {
    carts: CartRepository,
    products: ProductRepository,
}

impl CartEngine {
    pub fn new(carts: CartRepository, products: ProductRepository) -> Self {
        CartEngine { carts, products }
    }

    /// The stored cart, or an empty unsaved one.
    pub async fn get_cart(&self, user_id: &str) -> EngineResult<Cart> {
        Ok(self
            .carts
            .find_by_user(user_id)
            .await?
            .unwrap_or_else(|| Cart::new(user_id)))
    }

    /// Sets the amount of `product_id` in the user's cart to `amount`.
    pub async fn add_or_update_item(
        &self,
        user_id: &str,
        product_id: &str,
        amount: i64,
    ) -> EngineResult<CartUpdate> {
        validate_quantity(amount)?;

        let product = self
            .products
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("product", product_id))?;

        if let Some(mut cart) = self.carts.find_by_user(user_id).await? {
            let change = upsert_line(&mut cart, &product, amount)?;
            self.carts.save(&cart).await?;
            debug!(user_id = %user_id, product_id = %product_id, ?change, "Cart line set");
            return Ok(CartUpdate { cart, created: false });
        }

        let mut cart = Cart::new(user_id);
        upsert_line(&mut cart, &product, amount)?;

        match self.carts.insert(&cart).await {
            Ok(()) => {
                info!(user_id = %user_id, cart_id = %cart.id, "Cart created");
                Ok(CartUpdate { cart, created: true })
            }
            Err(e) if e.is_unique_violation_on(CART_OWNER_CONSTRAINT) => {
                warn!(user_id = %user_id, "Concurrent cart creation, merging into existing cart");
                let cart = self.merge_into_existing(user_id, &product, amount).await?;
                Ok(CartUpdate { cart, created: false })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn merge_into_existing(
        &self,
        user_id: &str,
        product: &Product,
        amount: i64,
    ) -> EngineResult<Cart> {
        let conflict = || CoreError::Conflict(format!("cart for user {user_id} changed concurrently"));

        let mut cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or_else(conflict)?;

        upsert_line(&mut cart, product, amount)?;

        match self.carts.save(&cart).await {
            Ok(()) => Ok(cart),
            Err(DbError::NotFound { .. }) => Err(conflict().into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes a line by its id. An unknown line id leaves the cart as is.
    pub async fn remove_item(&self, user_id: &str, line_id: &str) -> EngineResult<Cart> {
        let mut cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("cart", user_id))?;

        if remove_line(&mut cart, line_id) {
            self.carts.save(&cart).await?;
            debug!(user_id = %user_id, line_id = %line_id, "Cart line removed");
        } else {
            debug!(user_id = %user_id, line_id = %line_id, "No such cart line");
        }

        Ok(cart)
    }

    /// Empties the user's cart. Succeeds even when there is none.
    pub async fn clear_cart(&self, user_id: &str) -> EngineResult<Cart> {
        let Some(mut cart) = self.carts.find_by_user(user_id).await? else {
            return Ok(Cart::new(user_id));
        };

        clear(&mut cart);
        self.carts.save(&cart).await?;
        info!(user_id = %user_id, "Cart cleared");

        Ok(cart)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
