//! Shared application state.

use std::sync::Arc;

use bazaar_db::Database;

use crate::auth::IdentityVerifier;
use crate::engine::{CartEngine, CatalogEngine, OrderEngine};
use crate::payment::PaymentGateway;

/// Everything a request handler needs. Held in an `Arc` by the router.
pub struct AppState {
    pub db: Database,
    pub carts: CartEngine,
    pub orders: OrderEngine,
    pub catalog: CatalogEngine,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    /// Wires every engine to repositories cloned from `db`.
    pub fn new(
        db: Database,
        verifier: Arc<dyn IdentityVerifier>,
        payments: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
    ) -> Self {
        AppState {
            carts: CartEngine::new(db.carts(), db.products()),
            orders: OrderEngine::new(db.orders(), db.products(), payments, currency),
            catalog: CatalogEngine::new(db.products()),
            verifier,
            db,
        }
    }
}
