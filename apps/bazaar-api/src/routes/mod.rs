//! # HTTP Routes
//!
//! ```text
//! /api/v1
//! ├── GET    /health
//! ├── GET    /cart                     auth
//! ├── POST   /cart                     auth    {productId, amount}
//! ├── PATCH  /cart/clear               auth
//! ├── DELETE /cart/{itemId}            auth
//! ├── POST   /orders                   auth    {items, tax, shippingFee}
//! ├── GET    /orders                   admin
//! ├── GET    /orders/showAllMyOrders   auth
//! ├── GET    /orders/{id}              owner or admin
//! ├── PATCH  /orders/{id}              owner or admin  {paymentIntentId}
//! ├── GET    /products                 public
//! ├── POST   /products                 admin
//! ├── GET    /products/{id}            public
//! ├── PATCH  /products/{id}            admin
//! └── DELETE /products/{id}            admin
//! ```

pub mod cart;
pub mod health;
pub mod orders;
pub mod products;

use std::sync::Arc;

use axum::routing::{delete, get, patch};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health::check))
        .route("/cart", get(cart::get_cart).post(cart::add_item))
        .route("/cart/clear", patch(cart::clear_cart))
        .route("/cart/{item_id}", delete(cart::remove_item))
        .route("/orders", get(orders::list_all).post(orders::create_order))
        .route("/orders/showAllMyOrders", get(orders::list_mine))
        .route(
            "/orders/{id}",
            get(orders::get_order).patch(orders::update_order),
        )
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get)
                .patch(products::update)
                .delete(products::delete),
        );

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Route Tests
// =============================================================================
