//! # Catalog Input
//!
//! Product create and update payloads, defaulting, and whole-record
//! validation. Every failing field is reported, not just the first.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Category, Company, Product};
use crate::validation::{
    validate_colors, validate_description, validate_inventory, validate_non_negative_cents,
    validate_product_name,
};
use crate::{DEFAULT_INVENTORY, DEFAULT_PRODUCT_COLOR, DEFAULT_PRODUCT_IMAGE};

/// Payload for creating a product.
///
/// Category and company arrive as strings so an unknown value surfaces as a
/// field error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_cents: Option<i64>,
    pub image: Option<String>,
    pub category: String,
    pub company: String,
    pub colors: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub free_shipping: Option<bool>,
    pub inventory: Option<i64>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub company: Option<String>,
    pub colors: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub free_shipping: Option<bool>,
    pub inventory: Option<i64>,
}

/// Builds a product from `input`, filling defaults and stamping `created_by`.
pub fn build_product(input: NewProduct, created_by: &str) -> CoreResult<Product> {
    let mut errors = Vec::new();

    let category = collect(&mut errors, input.category.trim().parse::<Category>());
    let company = collect(&mut errors, input.company.trim().parse::<Company>());

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        description: input.description,
        price_cents: input.price_cents.unwrap_or(0),
        image: input
            .image
            .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_string()),
        category: category.unwrap_or(Category::Office),
        company: company.unwrap_or(Company::Ikea),
        colors: input
            .colors
            .unwrap_or_else(|| vec![DEFAULT_PRODUCT_COLOR.to_string()]),
        featured: input.featured.unwrap_or(false),
        free_shipping: input.free_shipping.unwrap_or(false),
        inventory: input.inventory.unwrap_or(DEFAULT_INVENTORY),
        average_rating: 0.0,
        num_of_reviews: 0,
        created_by: created_by.to_string(),
        created_at: now,
        updated_at: now,
    };

    errors.extend(check_product(&product));
    if !errors.is_empty() {
        return Err(CoreError::from_validation(errors));
    }

    Ok(product)
}

/// Applies `patch` to a copy of `product` and re-validates the result.
pub fn apply_patch(product: &Product, patch: ProductPatch) -> CoreResult<Product> {
    let mut errors = Vec::new();
    let mut updated = product.clone();

    if let Some(name) = patch.name {
        updated.name = name.trim().to_string();
    }
    if let Some(description) = patch.description {
        updated.description = description;
    }
    if let Some(price_cents) = patch.price_cents {
        updated.price_cents = price_cents;
    }
    if let Some(image) = patch.image {
        updated.image = image;
    }
    if let Some(category) = patch.category {
        if let Some(c) = collect(&mut errors, category.trim().parse::<Category>()) {
            updated.category = c;
        }
    }
    if let Some(company) = patch.company {
        if let Some(c) = collect(&mut errors, company.trim().parse::<Company>()) {
            updated.company = c;
        }
    }
    if let Some(colors) = patch.colors {
        updated.colors = colors;
    }
    if let Some(featured) = patch.featured {
        updated.featured = featured;
    }
    if let Some(free_shipping) = patch.free_shipping {
        updated.free_shipping = free_shipping;
    }
    if let Some(inventory) = patch.inventory {
        updated.inventory = inventory;
    }

    errors.extend(check_product(&updated));
    if !errors.is_empty() {
        return Err(CoreError::from_validation(errors));
    }

    updated.updated_at = Utc::now();
    Ok(updated)
}

/// Runs every field rule against a complete product.
pub fn check_product(product: &Product) -> Vec<ValidationError> {
    [
        validate_product_name(&product.name),
        validate_non_negative_cents("price", product.price_cents),
        validate_description(&product.description),
        validate_colors(&product.colors),
        validate_inventory(product.inventory),
    ]
    .into_iter()
    .filter_map(Result::err)
    .collect()
}

fn collect<T>(errors: &mut Vec<ValidationError>, result: Result<T, ValidationError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> NewProduct {
        NewProduct {
            name: "  Emperor Bed  ".to_string(),
            description: "King size".to_string(),
            price_cents: Some(23999),
            category: "bedroom".to_string(),
            company: "ikea".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_applies_defaults() {
        let product = build_product(valid_input(), "admin-1").unwrap();

        assert_eq!(product.name, "Emperor Bed");
        assert_eq!(product.image, DEFAULT_PRODUCT_IMAGE);
        assert_eq!(product.colors, vec![DEFAULT_PRODUCT_COLOR.to_string()]);
        assert_eq!(product.inventory, DEFAULT_INVENTORY);
        assert!(!product.featured);
        assert!(!product.free_shipping);
        assert_eq!(product.created_by, "admin-1");
    }

    #[test]
    fn test_build_reports_all_failing_fields() {
        let input = NewProduct {
            name: String::new(),
            description: String::new(),
            price_cents: Some(-5),
            category: "garage".to_string(),
            company: "acme".to_string(),
            inventory: Some(-1),
            ..Default::default()
        };

        let CoreError::InvalidArgument { fields, .. } = build_product(input, "a").unwrap_err()
        else {
            panic!("expected InvalidArgument");
        };
        let mut names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["category", "company", "description", "inventory", "name", "price"]
        );
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let product = build_product(valid_input(), "admin-1").unwrap();
        let patch = ProductPatch {
            price_cents: Some(19999),
            ..Default::default()
        };

        let updated = apply_patch(&product, patch).unwrap();

        assert_eq!(updated.price_cents, 19999);
        assert_eq!(updated.name, product.name);
        assert_eq!(updated.id, product.id);
    }

    #[test]
    fn test_patch_rejects_negative_inventory() {
        let product = build_product(valid_input(), "admin-1").unwrap();
        let patch = ProductPatch {
            inventory: Some(-3),
            ..Default::default()
        };

        assert!(apply_patch(&product, patch).is_err());
    }

    #[test]
    fn test_price_above_money_cap_rejected() {
        let mut input = valid_input();
        input.price_cents = Some(crate::MAX_MONEY_CENTS + 1);
        assert!(build_product(input, "admin-1").is_err());

        let product = build_product(valid_input(), "admin-1").unwrap();
        let patch = ProductPatch {
            price_cents: Some(i64::MAX),
            ..Default::default()
        };
        let err = apply_patch(&product, patch).unwrap_err();
        let CoreError::InvalidArgument { fields, .. } = err else {
            panic!("expected InvalidArgument");
        };
        assert_eq!(fields[0].field, "price");
    }
}
