//! # Domain Types
//!
//! Core domain types shared by the engines, the repositories and the HTTP
//! surface.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Cart       │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  price_cents    │   │  user_id UNIQUE │   │  user_id        │       │
//! │  │  inventory      │   │  lines[]        │   │  items[]        │       │
//! │  │  category       │   │  subtotal_cents │   │  total_cents    │       │
//! │  └────────┬────────┘   └────────┬────────┘   └────────┬────────┘       │
//! │           │ snapshot            │                     │                │
//! │           ├────────────────► CartLine                 │                │
//! │           └──────────────────────────────────────► OrderItem           │
//! │                                                                         │
//! │  Role: Admin | Customer      OrderStatus: Pending ──► Paid             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Cart lines and order items copy name, image and price out of the product
//! at write time. An order never changes when the catalog does.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// Caller role carried by a verified credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Catalog Enums
// =============================================================================

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Office,
    Kitchen,
    Bedroom,
    Entertainment,
    Clothing,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Office,
        Category::Kitchen,
        Category::Bedroom,
        Category::Entertainment,
        Category::Clothing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Office => "office",
            Category::Kitchen => "kitchen",
            Category::Bedroom => "bedroom",
            Category::Entertainment => "entertainment",
            Category::Clothing => "clothing",
        }
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Category::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

/// Product manufacturer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Company {
    Ikea,
    Liddy,
    Marcos,
}

impl Company {
    pub const ALL: [Company; 3] = [Company::Ikea, Company::Liddy, Company::Marcos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Company::Ikea => "ikea",
            Company::Liddy => "liddy",
            Company::Marcos => "marcos",
        }
    }
}

impl FromStr for Company {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Company::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "company".to_string(),
                allowed: Company::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry.
///
/// `inventory` and `price_cents` are never negative; both are checked by
/// validation and again by `CHECK` constraints in the schema.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub image: String,
    pub category: Category,
    pub company: Company,
    pub colors: Vec<String>,
    pub featured: bool,
    pub free_shipping: bool,
    /// Units currently available.
    pub inventory: i64,
    pub average_rating: f64,
    pub num_of_reviews: i64,
    /// Admin who created the product.
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks that `amount` units can be taken from current stock.
    #[inline]
    pub fn has_inventory(&self, amount: i64) -> bool {
        self.inventory >= amount
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One product line inside a cart.
///
/// `id` is the line identity used by `RemoveItem`; it is distinct from
/// `product_id`. Lines are unique per product within one cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub image: String,
    /// Unit price at the time the line was last written.
    pub price_cents: i64,
    pub amount: i64,
}

impl CartLine {
    /// Creates a line with a fresh line id.
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
        price: Money,
        amount: i64,
    ) -> Self {
        CartLine {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            name: name.into(),
            image: image.into(),
            price_cents: price.cents(),
            amount,
        }
    }

    /// Snapshots a product into a new line.
    pub fn from_product(product: &Product, amount: i64) -> Self {
        CartLine::new(
            product.id.clone(),
            product.name.clone(),
            product.image.clone(),
            product.price(),
            amount,
        )
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Unit price × amount.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price().multiply_quantity(self.amount)
    }
}

/// A user's persistent cart. One per user, never deleted, only emptied.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub lines: Vec<CartLine>,
    /// Always equal to `cart::recompute_subtotal(&lines)` once persisted.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty, not yet persisted cart for `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Cart {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            lines: Vec::new(),
            subtotal_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_for_product(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Order lifecycle. The only transition is `Pending` → `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, payment intent issued, not yet confirmed.
    #[default]
    Pending,
    /// Client confirmed the payment intent.
    Paid,
}

// =============================================================================
// Order
// =============================================================================

/// Frozen copy of a product line inside an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub price_cents: i64,
    pub amount: i64,
}

impl OrderItem {
    /// Snapshots the current catalog state of `product`.
    pub fn from_product(product: &Product, amount: i64) -> Self {
        OrderItem {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            image: product.image.clone(),
            price_cents: product.price_cents,
            amount,
        }
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_cents).multiply_quantity(self.amount)
    }
}

/// A placed order.
///
/// ## Invariants
/// - `total_cents == subtotal_cents + tax_cents + shipping_fee_cents`
/// - `subtotal_cents == Σ item.price_cents × item.amount`
/// - items and money fields never change after creation; only `status` and
///   `payment_intent_id` do
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_fee_cents: i64,
    pub total_cents: i64,
    /// Opaque handle returned by the payment collaborator.
    pub client_secret: String,
    pub payment_intent_id: Option<String>,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("kitchen".parse::<Category>().unwrap(), Category::Kitchen);

        let err = "garage".parse::<Category>().unwrap_err();
        assert_eq!(err.field(), "category");
    }

    #[test]
    fn test_company_parse() {
        assert_eq!("ikea".parse::<Company>().unwrap(), Company::Ikea);
        assert!("IKEA".parse::<Company>().is_err());
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_cart_line_total() {
        let line = CartLine::new("p-1", "Chair", "/c.jpeg", Money::from_cents(4999), 3);
        assert_eq!(line.line_total().cents(), 14997);
    }

    #[test]
    fn test_new_cart_is_empty() {
        let cart = Cart::new("u-1");
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal_cents, 0);
        assert_eq!(cart.user_id, "u-1");
    }

    #[test]
    fn test_serializes_camel_case() {
        let line = CartLine::new("p-1", "Chair", "/c.jpeg", Money::from_cents(100), 1);
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["productId"], "p-1");
        assert_eq!(json["priceCents"], 100);
    }
}
