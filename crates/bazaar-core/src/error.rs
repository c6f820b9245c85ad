//! # Error Types
//!
//! Domain error taxonomy for bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  ├── CoreError        - Cart / order / access failures                 │
//! │  └── ValidationError  - A single field that failed a rule              │
//! │                                                                         │
//! │  bazaar-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  bazaar-api errors (in app)                                            │
//! │  └── ApiError         - What the HTTP client sees                      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → JSON body + status     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant of [`CoreError`] maps to exactly one HTTP status in the API
//! layer. Only [`CoreError::PaymentInitiationFailed`] is ever retried, and
//! that happens before it is raised.

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Core Error
// =============================================================================

/// Cart, order, and access-control failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or out-of-range input.
    ///
    /// ## When This Occurs
    /// - Non-positive cart amount
    /// - Empty order item list, negative tax or shipping fee
    /// - Product payload failing field validation (one entry per field)
    #[error("{message}")]
    InvalidArgument {
        message: String,
        fields: Vec<FieldError>,
    },

    /// Referenced product, cart, or order does not exist.
    #[error("No {entity} with id: {id}")]
    NotFound { entity: String, id: String },

    /// Requested amount exceeds stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (amount: 5)
    ///      │
    ///      ▼
    /// Check inventory: available=3
    ///      │
    ///      ▼
    /// InsufficientInventory { product_id, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Cart left exactly as it was
    /// ```
    #[error("Insufficient inventory for {product_id}: available {available}, requested {requested}")]
    InsufficientInventory {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Caller is authenticated but lacks role or ownership.
    #[error("Not authorized to access this route: {0}")]
    Forbidden(String),

    /// Payment collaborator failed after bounded retries.
    #[error("Payment initiation failed: {0}")]
    PaymentInitiationFailed(String),

    /// Concurrent write lost a race that could not be merged.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidArgument error with no field breakdown.
    pub fn invalid(message: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Collapses a list of field failures into one InvalidArgument.
    pub fn from_validation(errors: Vec<ValidationError>) -> Self {
        let fields: Vec<FieldError> = errors.iter().map(FieldError::from).collect();
        let message = fields
            .iter()
            .map(|f| f.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        CoreError::InvalidArgument { message, fields }
    }
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::from_validation(vec![err])
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single field failing a validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

/// Serializable field failure carried inside `InvalidArgument`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(err: &ValidationError) -> Self {
        FieldError {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
