//! # Order Construction
//!
//! Turns re-fetched catalog products into an immutable order.
//!
//! ## Checkout Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CreateOrder                                          │
//! │                                                                         │
//! │  [RequestedItem]  ──validate_order_request()──► tax, shipping_fee      │
//! │        │                                                                │
//! │        ▼  (engine re-fetches every product)                            │
//! │  [(Product, amount)] ──OrderDraft::build()──► items, subtotal, total   │
//! │        │                                                                │
//! │        ▼  (payment collaborator returns client_secret)                 │
//! │  OrderDraft::into_order() ──► Order { status: Pending }                │
//! │        │                                                                │
//! │        ▼  (later, client confirms the intent)                          │
//! │  mark_paid() ──► Order { status: Paid, payment_intent_id }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices come from the catalog at checkout time, not from the cart.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Order, OrderItem, OrderStatus, Product};
use crate::validation::{validate_non_negative_cents, validate_quantity};

/// One `{product, amount}` pair submitted at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RequestedItem {
    /// Product id.
    pub product: String,
    pub amount: i64,
}

/// Checks the shape of a checkout request before any lookup runs.
///
/// `tax` and `shipping_fee` must be present; zero is a valid value for both.
/// Returns them as [`Money`].
pub fn validate_order_request(
    items: &[RequestedItem],
    tax: Option<i64>,
    shipping_fee: Option<i64>,
) -> CoreResult<(Money, Money)> {
    if items.is_empty() {
        return Err(CoreError::invalid("No cart items provided"));
    }

    let (Some(tax), Some(shipping_fee)) = (tax, shipping_fee) else {
        return Err(CoreError::invalid("Please provide tax and shipping fee"));
    };

    let mut errors = Vec::new();
    for item in items {
        if item.product.trim().is_empty() {
            errors.push(crate::ValidationError::Required {
                field: "product".to_string(),
            });
        }
        if let Err(e) = validate_quantity(item.amount) {
            errors.push(e);
        }
    }
    if let Err(e) = validate_non_negative_cents("tax", tax) {
        errors.push(e);
    }
    if let Err(e) = validate_non_negative_cents("shippingFee", shipping_fee) {
        errors.push(e);
    }
    if !errors.is_empty() {
        return Err(CoreError::from_validation(errors));
    }

    Ok((Money::from_cents(tax), Money::from_cents(shipping_fee)))
}

/// `subtotal + tax + shipping_fee`, or `InvalidArgument` if it overflows.
pub fn compute_total(subtotal: Money, tax: Money, shipping_fee: Money) -> CoreResult<Money> {
    subtotal
        .checked_add(tax)
        .and_then(|sum| sum.checked_add(shipping_fee))
        .ok_or_else(total_out_of_range)
}

fn total_out_of_range() -> CoreError {
    CoreError::invalid("Order total is out of range")
}

/// Order contents computed before the payment intent exists.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping_fee: Money,
    pub total: Money,
}

impl OrderDraft {
    /// Snapshots each product at its current price and sums the lines.
    ///
    /// Fails with `InvalidArgument` if any line or the total overflows.
    pub fn build(lines: &[(Product, i64)], tax: Money, shipping_fee: Money) -> CoreResult<Self> {
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|(product, amount)| OrderItem::from_product(product, *amount))
            .collect();

        let mut subtotal = Money::zero();
        for item in &items {
            subtotal = Money::from_cents(item.price_cents)
                .checked_mul(item.amount)
                .and_then(|line| subtotal.checked_add(line))
                .ok_or_else(total_out_of_range)?;
        }

        Ok(OrderDraft {
            total: compute_total(subtotal, tax, shipping_fee)?,
            items,
            subtotal,
            tax,
            shipping_fee,
        })
    }

    /// Units requested per item, in item order.
    pub fn amounts(&self) -> impl Iterator<Item = (&str, i64)> {
        self.items.iter().map(|i| (i.product_id.as_str(), i.amount))
    }

    /// Attaches the owner and payment handle, producing a pending order.
    pub fn into_order(self, user_id: impl Into<String>, client_secret: impl Into<String>) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            items: self.items,
            subtotal_cents: self.subtotal.cents(),
            tax_cents: self.tax.cents(),
            shipping_fee_cents: self.shipping_fee.cents(),
            total_cents: self.total.cents(),
            client_secret: client_secret.into(),
            payment_intent_id: None,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Records the confirmed payment intent. Items and money fields are untouched.
pub fn mark_paid(order: &mut Order, payment_intent_id: &str) -> CoreResult<()> {
    let payment_intent_id = payment_intent_id.trim();
    if payment_intent_id.is_empty() {
        return Err(crate::ValidationError::Required {
            field: "paymentIntentId".to_string(),
        }
        .into());
    }

    order.payment_intent_id = Some(payment_intent_id.to_string());
    order.status = OrderStatus::Paid;
    order.updated_at = Utc::now();
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Company};

    fn test_product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            description: "test".to_string(),
            price_cents,
            image: "/uploads/example.jpeg".to_string(),
            category: Category::Kitchen,
            company: Company::Liddy,
            colors: vec!["#222".to_string()],
            featured: false,
            free_shipping: false,
            inventory: 10,
            average_rating: 0.0,
            num_of_reviews: 0,
            created_by: "admin-1".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(product: &str, amount: i64) -> RequestedItem {
        RequestedItem {
            product: product.to_string(),
            amount,
        }
    }

    #[test]
    fn test_total_identity() {
        let lines = vec![(test_product("a", 1000), 2), (test_product("b", 500), 1)];
        let draft = OrderDraft::build(&lines, Money::from_cents(200), Money::from_cents(300)).unwrap();

        assert_eq!(draft.subtotal.cents(), 2500);
        assert_eq!(draft.total.cents(), 3000);

        let order = draft.into_order("u-1", "secret");
        assert_eq!(
            order.total_cents,
            order.subtotal_cents + order.tax_cents + order.shipping_fee_cents
        );
        let items_sum: i64 = order.items.iter().map(|i| i.price_cents * i.amount).sum();
        assert_eq!(order.subtotal_cents, items_sum);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_draft_snapshots_current_price() {
        let mut product = test_product("a", 1000);
        product.price_cents = 1200;

        let draft = OrderDraft::build(&[(product, 2)], Money::zero(), Money::zero()).unwrap();

        assert_eq!(draft.items[0].price_cents, 1200);
        assert_eq!(draft.subtotal.cents(), 2400);
    }

    #[test]
    fn test_validate_rejects_empty_items() {
        let err = validate_order_request(&[], Some(0), Some(0)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
    }

    #[test]
    fn test_validate_requires_tax_and_shipping() {
        let items = vec![item("a", 1)];
        assert!(validate_order_request(&items, None, Some(100)).is_err());
        assert!(validate_order_request(&items, Some(100), None).is_err());
    }

    #[test]
    fn test_validate_allows_zero_tax_and_shipping() {
        let items = vec![item("a", 1)];
        let (tax, shipping) = validate_order_request(&items, Some(0), Some(0)).unwrap();
        assert!(tax.is_zero());
        assert!(shipping.is_zero());
    }

    #[test]
    fn test_validate_rejects_oversized_charges() {
        let items = vec![item("a", 1)];
        let err = validate_order_request(&items, Some(i64::MAX), Some(1)).unwrap_err();

        let CoreError::InvalidArgument { fields, .. } = err else {
            panic!("expected InvalidArgument");
        };
        assert_eq!(fields[0].field, "tax");
    }

    #[test]
    fn test_total_overflow_is_invalid_argument() {
        let err = compute_total(
            Money::from_cents(1000),
            Money::from_cents(i64::MAX),
            Money::from_cents(1),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));

        let lines = vec![(test_product("a", i64::MAX / 2), 3)];
        let err = OrderDraft::build(&lines, Money::zero(), Money::zero()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
    }

    #[test]
    fn test_validate_collects_field_errors() {
        let items = vec![item("a", 0)];
        let err = validate_order_request(&items, Some(-1), Some(100)).unwrap_err();

        let CoreError::InvalidArgument { fields, .. } = err else {
            panic!("expected InvalidArgument");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["amount", "tax"]);
    }

    #[test]
    fn test_mark_paid() {
        let draft = OrderDraft::build(&[(test_product("a", 100), 1)], Money::zero(), Money::zero()).unwrap();
        let mut order = draft.into_order("u-1", "secret");
        let before = (order.items.clone(), order.total_cents);

        mark_paid(&mut order, "pi_123").unwrap();

        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_intent_id.as_deref(), Some("pi_123"));
        assert_eq!((order.items.clone(), order.total_cents), before);
    }

    #[test]
    fn test_mark_paid_requires_intent_id() {
        let draft = OrderDraft::build(&[(test_product("a", 100), 1)], Money::zero(), Money::zero()).unwrap();
        let mut order = draft.into_order("u-1", "secret");

        assert!(mark_paid(&mut order, "  ").is_err());
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
