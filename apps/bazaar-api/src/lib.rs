//! # Bazaar API
//!
//! JSON/HTTP server for the storefront: carts, orders and the catalog.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Bazaar API                                      │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  CartEngine    │  │  OrderEngine   │  │  CatalogEngine             ││
//! │  │                │  │                │  │                            ││
//! │  │ • GetCart      │  │ • CreateOrder  │  │ • CreateProduct            ││
//! │  │ • AddOrUpdate  │  │ • UpdateOrder  │  │ • UpdateProduct            ││
//! │  │ • RemoveItem   │  │ • GetOrder     │  │ • DeleteProduct            ││
//! │  │ • ClearCart    │  │ • List (mine,  │  │ • Get / List               ││
//! │  │                │  │   all)         │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  SQLite      │  │  Payment     │  │    JWT Auth              ││  │
//! │  │  │  (bazaar-db) │  │  gateway     │  │                          ││  │
//! │  │  │              │  │  + retries   │  │ Bearer credential check  ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `BAZAAR_PORT` - HTTP port (default: 5000)
//! - `BAZAAR_DB_PATH` - SQLite file (default: ./bazaar.db)
//! - `BAZAAR_DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `JWT_SECRET` - Secret for verifying bearer tokens
//! - `PAYMENT_CURRENCY` - Currency code for payment intents (default: egp)
//! - `PAYMENT_MAX_RETRIES` - Retries after a failed attempt (default: 3)
//! - `PAYMENT_TIMEOUT_MS` - Per-attempt timeout (default: 5000)
//! - `PAYMENT_INITIAL_BACKOFF_MS` - First retry delay (default: 200)

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod payment;
pub mod routes;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
