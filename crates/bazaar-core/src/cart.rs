//! # Cart Rules
//!
//! Pure mutations on a [`Cart`]. Each one leaves `subtotal_cents` equal to
//! [`recompute_subtotal`] of the resulting lines, so whatever the repository
//! persists is already consistent.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Mutations                                       │
//! │                                                                         │
//! │  AddOrUpdateItem ───► upsert_line()  ─┐                                 │
//! │                                       │                                 │
//! │  RemoveItem ────────► remove_line()  ─┼──► recompute_subtotal(lines)    │
//! │                                       │                                 │
//! │  ClearCart ─────────► clear()        ─┘                                 │
//! │                                                                         │
//! │  upsert_line uses SET semantics: the amount sent replaces the amount   │
//! │  stored. Sending the same request twice yields the same cart.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Cart, CartLine, Product};
use crate::validation::{validate_cart_size, validate_quantity};

/// Outcome of [`upsert_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// The product was not in the cart; a new line was appended.
    Added,
    /// The product already had a line; its amount was replaced.
    Replaced,
}

/// Σ `price × amount` over `lines`.
///
/// ## Example
/// ```rust
/// use bazaar_core::cart::recompute_subtotal;
///
/// assert_eq!(recompute_subtotal(&[]).cents(), 0);
/// ```
pub fn recompute_subtotal(lines: &[CartLine]) -> Money {
    lines.iter().map(CartLine::line_total).sum()
}

/// Sets the amount of `product` in `cart` to exactly `amount`.
///
/// ## Rules
/// - `amount` must be in `1..=MAX_ITEM_QUANTITY`
/// - `product.inventory` must cover `amount`, otherwise the cart is untouched
/// - An existing line keeps its line id but takes the product's current
///   name, image and price
/// - A new line is refused once the cart holds `MAX_CART_LINES` lines
pub fn upsert_line(cart: &mut Cart, product: &Product, amount: i64) -> CoreResult<LineChange> {
    validate_quantity(amount)?;

    if !product.has_inventory(amount) {
        return Err(CoreError::InsufficientInventory {
            product_id: product.id.clone(),
            available: product.inventory,
            requested: amount,
        });
    }

    let change = match cart.lines.iter_mut().find(|l| l.product_id == product.id) {
        Some(line) => {
            line.amount = amount;
            line.name = product.name.clone();
            line.image = product.image.clone();
            line.price_cents = product.price_cents;
            LineChange::Replaced
        }
        None => {
            validate_cart_size(cart.lines.len())?;
            cart.lines.push(CartLine::from_product(product, amount));
            LineChange::Added
        }
    };

    touch(cart);
    Ok(change)
}

/// Removes the line whose id is `line_id`.
///
/// Returns `false` when no line matched; the cart is then left as is.
pub fn remove_line(cart: &mut Cart, line_id: &str) -> bool {
    let before = cart.lines.len();
    cart.lines.retain(|l| l.id != line_id);

    if cart.lines.len() == before {
        return false;
    }

    touch(cart);
    true
}

/// Empties the cart.
pub fn clear(cart: &mut Cart) {
    cart.lines.clear();
    touch(cart);
}

fn touch(cart: &mut Cart) {
    cart.subtotal_cents = recompute_subtotal(&cart.lines).cents();
    cart.updated_at = Utc::now();
}

// =============================================================================
// Unit Tests
// =============================================================================
