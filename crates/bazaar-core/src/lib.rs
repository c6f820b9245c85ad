//! # bazaar-core: Pure Domain Logic for the Bazaar Storefront
//!
//! This crate holds the rules that keep a shopper's cart, the product
//! catalog, and a placed order consistent with each other. Everything here is
//! a pure function over plain data; persistence and transport live elsewhere.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    bazaar-api (axum)                            │   │
//! │  │    /cart ──► CartEngine     /orders ──► OrderEngine             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────┐ │   │
//! │  │   │  types   │ │  money   │ │   cart   │ │  order   │ │access│ │   │
//! │  │   │ Product  │ │  Money   │ │ upsert   │ │ build    │ │ role │ │   │
//! │  │   │ Cart     │ │ (cents)  │ │ remove   │ │ totals   │ │ owner│ │   │
//! │  │   │ Order    │ │          │ │ subtotal │ │          │ │      │ │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘ └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   bazaar-db (Database Layer)                    │   │
//! │  │         SQLite repositories, atomic inventory decrement         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Cart, Order, Role, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - Cart line rules and subtotal recomputation
//! - [`catalog`] - Product create/patch payloads and defaults
//! - [`order`] - Order construction and total identity
//! - [`access`] - Role and ownership checks
//! - [`validation`] - Field validation for inbound requests
//! - [`error`] - Domain error taxonomy
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::cart::recompute_subtotal;
//! use bazaar_core::{CartLine, Money};
//!
//! let lines = vec![
//!     CartLine::new("p-1", "Desk", "/uploads/desk.jpeg", Money::from_cents(1000), 2),
//!     CartLine::new("p-2", "Lamp", "/uploads/lamp.jpeg", Money::from_cents(250), 1),
//! ];
//!
//! assert_eq!(recompute_subtotal(&lines).cents(), 2250);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod order;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{authorize, Caller};
pub use error::{CoreError, CoreResult, FieldError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single cart line or order item.
///
/// Guards against accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest accepted price, tax, or shipping fee, in cents.
///
/// Keeps `price × MAX_ITEM_QUANTITY` and order totals far from `i64::MAX`.
pub const MAX_MONEY_CENTS: i64 = 10_000_000_000;

/// Image path assigned to products created without one.
pub const DEFAULT_PRODUCT_IMAGE: &str = "/uploads/example.jpeg";

/// Color list assigned to products created without one.
pub const DEFAULT_PRODUCT_COLOR: &str = "#222";

/// Stock level assigned to products created without one.
pub const DEFAULT_INVENTORY: i64 = 15;
