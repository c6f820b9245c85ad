//! # Repository Module
//!
//! Database repository implementations for Bazaar.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Engine (bazaar-api)                                                   │
//! │       │                                                                 │
//! │       │  carts.find_by_user("u-1")                                     │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── find_by_user(&self, user_id)                                      │
//! │  ├── insert(&self, cart)       ← UNIQUE(user_id) guards the race       │
//! │  └── save(&self, cart)         ← rewrites lines in one transaction     │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD and atomic stock decrement
//! - [`cart::CartRepository`] - One cart per user with its lines
//! - [`order::OrderRepository`] - All-or-nothing order placement

pub mod cart;
pub mod order;
pub mod product;
