//! # Engines
//!
//! Request-independent business operations. Each engine owns cloned
//! repository handles and is shared by every request through [`AppState`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  route handler ──► engine ──► bazaar_core rules ──► repository          │
//! │                      │                                                  │
//! │                      └── OrderEngine ──► PaymentGateway                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`AppState`]: crate::state::AppState

pub mod cart;
pub mod catalog;
pub mod order;

pub use cart::{CartEngine, CartUpdate};
pub use catalog::CatalogEngine;
pub use order::{CreateOrderRequest, OrderEngine};

use bazaar_core::{CoreError, ValidationError};
use bazaar_db::DbError;

/// Engine failure: a domain error, or a storage error with no domain meaning.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(DbError),
}

/// Storage errors that carry domain meaning become [`CoreError`]s.
impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                EngineError::Core(CoreError::not_found(entity.to_lowercase(), id))
            }
            DbError::InsufficientInventory {
                product_id,
                available,
                requested,
            } => EngineError::Core(CoreError::InsufficientInventory {
                product_id,
                available,
                requested,
            }),
            other => EngineError::Db(other),
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(err.into())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
