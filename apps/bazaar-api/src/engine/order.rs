//! # Order Engine
//!
//! Checkout, payment confirmation and order queries.
//!
//! ## CreateOrder
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. validate request (items, tax, shippingFee)                          │
//! │  2. re-fetch every product          ── missing ──► NotFound             │
//! │     stock precheck                  ── short ────► InsufficientInventory│
//! │  3. OrderDraft::build (current catalog prices)                          │
//! │  4. payment gateway (retries)       ── fails ────► PaymentInitiation... │
//! │  5. OrderRepository::place          ── lost race ► InsufficientInventory│
//! │     (decrement stock + insert, one transaction)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is persisted unless step 5 commits.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use bazaar_core::order::{mark_paid, validate_order_request, OrderDraft, RequestedItem};
use bazaar_core::{authorize, Caller, CoreError, Order, Product, Role};
use bazaar_db::{OrderRepository, ProductRepository};

use super::EngineResult;
use crate::payment::PaymentGateway;

/// Checkout payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<RequestedItem>,
    /// Minor units.
    pub tax: Option<i64>,
    /// Minor units.
    pub shipping_fee: Option<i64>,
}

#[derive(Clone)]
pub struct OrderEngine {
    orders: OrderRepository,
    products: ProductRepository,
    payments: Arc<dyn PaymentGateway>,
    currency: String,
}

impl OrderEngine {
    pub fn new(
        orders: OrderRepository,
        products: ProductRepository,
        payments: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
    ) -> Self {
        OrderEngine {
            orders,
            products,
            payments,
            currency: currency.into(),
        }
    }

    /// Places an order for `caller` billed at current catalog prices.
    pub async fn create_order(&self, caller: &Caller, request: CreateOrderRequest) -> EngineResult<Order> {
        let (tax, shipping_fee) =
            validate_order_request(&request.items, request.tax, request.shipping_fee)?;

        let mut lines: Vec<(Product, i64)> = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = self
                .products
                .get_by_id(&item.product)
                .await?
                .ok_or_else(|| CoreError::not_found("product", &item.product))?;

            if !product.has_inventory(item.amount) {
                return Err(CoreError::InsufficientInventory {
                    product_id: product.id,
                    available: product.inventory,
                    requested: item.amount,
                }
                .into());
            }

            lines.push((product, item.amount));
        }

        let draft = OrderDraft::build(&lines, tax, shipping_fee)?;
        debug!(
            user_id = %caller.user_id,
            subtotal = %draft.subtotal,
            total = %draft.total,
            "Order priced"
        );

        let intent = self
            .payments
            .create_intent(draft.total, &self.currency)
            .await
            .map_err(|e| CoreError::PaymentInitiationFailed(e.to_string()))?;

        let order = draft.into_order(&caller.user_id, intent.client_secret);
        if let Err(e) = self.orders.place(&order).await {
            warn!(
                order_id = %order.id,
                error = %e,
                "Order rejected after payment initiation, intent orphaned"
            );
            return Err(e.into());
        }

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = order.total_cents,
            "Order created"
        );
        Ok(order)
    }

    /// Confirms payment. Only the owner or an admin may do this.
    pub async fn update_order(
        &self,
        caller: &Caller,
        order_id: &str,
        payment_intent_id: &str,
    ) -> EngineResult<Order> {
        let mut order = self.load(order_id).await?;
        authorize(caller, None, Some(&order.user_id))?;

        mark_paid(&mut order, payment_intent_id)?;
        self.orders.update_payment(&order).await?;

        info!(order_id = %order.id, "Order paid");
        Ok(order)
    }

    /// One order, visible to its owner and admins.
    pub async fn get_order(&self, caller: &Caller, order_id: &str) -> EngineResult<Order> {
        let order = self.load(order_id).await?;
        authorize(caller, None, Some(&order.user_id))?;
        Ok(order)
    }

    /// The caller's own orders.
    pub async fn list_for_user(&self, caller: &Caller) -> EngineResult<Vec<Order>> {
        Ok(self.orders.list_for_user(&caller.user_id).await?)
    }

    /// Every order. Admin only.
    pub async fn list_all(&self, caller: &Caller) -> EngineResult<Vec<Order>> {
        authorize(caller, Some(&[Role::Admin]), None)?;
        Ok(self.orders.list_all().await?)
    }

    async fn load(&self, order_id: &str) -> EngineResult<Order> {
        Ok(self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("order", order_id))?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{admin, customer, file_db, memory_db, seed_product};
    use crate::engine::EngineError;
    use crate::payment::tests::{fast_policy, FlakyGateway};
    use crate::payment::{PaymentError, RetryingGateway, SimulatedGateway};
    use bazaar_core::OrderStatus;
    use bazaar_db::Database;

    fn engine(db: &Database) -> OrderEngine {
        OrderEngine::new(db.orders(), db.products(), Arc::new(SimulatedGateway), "egp")
    }

    fn request(items: &[(&str, i64)], tax: i64, shipping_fee: i64) -> CreateOrderRequest {
        CreateOrderRequest {
            items: items
                .iter()
                .map(|(product, amount)| RequestedItem {
                    product: product.to_string(),
                    amount: *amount,
                })
                .collect(),
            tax: Some(tax),
            shipping_fee: Some(shipping_fee),
        }
    }

    async fn stock(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().inventory
    }

    #[tokio::test]
    async fn test_create_order_totals_and_stock() {
        let db = memory_db().await;
        let mug = seed_product(&db, "Mug", 1000, 10).await;
        let bowl = seed_product(&db, "Bowl", 2550, 10).await;

        let order = engine(&db)
            .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 2), (bowl.id.as_str(), 1)], 100, 500))
            .await
            .unwrap();

        assert_eq!(order.subtotal_cents, 4550);
        assert_eq!(order.total_cents, 5150);
        assert_eq!(
            order.total_cents,
            order.subtotal_cents + order.tax_cents + order.shipping_fee_cents
        );
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.client_secret.is_empty());
        assert_eq!(stock(&db, &mug.id).await, 8);
        assert_eq!(stock(&db, &bowl.id).await, 9);
    }

    #[tokio::test]
    async fn test_zero_tax_and_shipping_allowed() {
        let db = memory_db().await;
        let mug = seed_product(&db, "Mug", 1000, 10).await;

        let order = engine(&db)
            .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 1)], 0, 0))
            .await
            .unwrap();
        assert_eq!(order.total_cents, 1000);
    }

    #[tokio::test]
    async fn test_order_bills_current_catalog_price() {
        let db = memory_db().await;
        let mut mug = seed_product(&db, "Mug", 1000, 10).await;

        mug.price_cents = 1500;
        db.products().update(&mug).await.unwrap();

        let order = engine(&db)
            .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 2)], 0, 0))
            .await
            .unwrap();
        assert_eq!(order.items[0].price_cents, 1500);
        assert_eq!(order.subtotal_cents, 3000);
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let db = memory_db().await;
        let engine = engine(&db);
        let mug = seed_product(&db, "Mug", 1000, 10).await;

        let empty = engine
            .create_order(&customer("u-1"), request(&[], 0, 0))
            .await;
        assert!(matches!(empty, Err(EngineError::Core(CoreError::InvalidArgument { .. }))));

        let mut missing_tax = request(&[(mug.id.as_str(), 1)], 0, 0);
        missing_tax.tax = None;
        assert!(matches!(
            engine.create_order(&customer("u-1"), missing_tax).await,
            Err(EngineError::Core(CoreError::InvalidArgument { .. }))
        ));

        assert!(matches!(
            engine
                .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 1)], -1, 0))
                .await,
            Err(EngineError::Core(CoreError::InvalidArgument { .. }))
        ));

        assert!(matches!(
            engine
                .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 1)], i64::MAX, 1))
                .await,
            Err(EngineError::Core(CoreError::InvalidArgument { .. }))
        ));
        assert_eq!(stock(&db, &mug.id).await, 10);
    }

    #[tokio::test]
    async fn test_missing_product_fails_whole_order() {
        let db = memory_db().await;
        let mug = seed_product(&db, "Mug", 1000, 10).await;

        let err = engine(&db)
            .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 1), ("gone", 1)], 0, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Core(CoreError::NotFound { .. })));
        assert_eq!(stock(&db, &mug.id).await, 10);
        assert!(db.orders().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_failure_persists_nothing() {
        let db = memory_db().await;
        let mug = seed_product(&db, "Mug", 1000, 10).await;
        let gateway = RetryingGateway::new(
            FlakyGateway::new(10, PaymentError::Unavailable("503".into())),
            fast_policy(1),
        );
        let engine = OrderEngine::new(db.orders(), db.products(), Arc::new(gateway), "egp");

        let err = engine
            .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 1)], 0, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Core(CoreError::PaymentInitiationFailed(_))));
        assert_eq!(stock(&db, &mug.id).await, 10);
        assert!(db.orders().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transient_payment_failure_recovers() {
        let db = memory_db().await;
        let mug = seed_product(&db, "Mug", 1000, 10).await;
        let gateway = RetryingGateway::new(
            FlakyGateway::new(1, PaymentError::Timeout(std::time::Duration::from_millis(1))),
            fast_policy(3),
        );
        let engine = OrderEngine::new(db.orders(), db.products(), Arc::new(gateway), "egp");

        assert!(engine
            .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 1)], 0, 0))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_update_order_marks_paid() {
        let db = memory_db().await;
        let engine = engine(&db);
        let mug = seed_product(&db, "Mug", 1000, 10).await;
        let order = engine
            .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 1)], 100, 200))
            .await
            .unwrap();

        let paid = engine
            .update_order(&customer("u-1"), &order.id, "pi_42")
            .await
            .unwrap();

        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(paid.payment_intent_id.as_deref(), Some("pi_42"));
        assert_eq!(paid.total_cents, order.total_cents);
        assert_eq!(paid.items, order.items);
    }

    #[tokio::test]
    async fn test_update_order_access() {
        let db = memory_db().await;
        let engine = engine(&db);
        let mug = seed_product(&db, "Mug", 1000, 10).await;
        let order = engine
            .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 1)], 0, 0))
            .await
            .unwrap();

        assert!(matches!(
            engine.update_order(&customer("u-2"), &order.id, "pi_1").await,
            Err(EngineError::Core(CoreError::Forbidden(_)))
        ));
        assert!(matches!(
            engine.update_order(&customer("u-1"), &order.id, "  ").await,
            Err(EngineError::Core(CoreError::InvalidArgument { .. }))
        ));
        assert!(matches!(
            engine.update_order(&customer("u-1"), "nope", "pi_1").await,
            Err(EngineError::Core(CoreError::NotFound { .. }))
        ));
        assert!(engine.update_order(&admin(), &order.id, "pi_1").await.is_ok());

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_queries() {
        let db = memory_db().await;
        let engine = engine(&db);
        let mug = seed_product(&db, "Mug", 1000, 10).await;

        let mine = engine
            .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 1)], 0, 0))
            .await
            .unwrap();
        engine
            .create_order(&customer("u-2"), request(&[(mug.id.as_str(), 1)], 0, 0))
            .await
            .unwrap();

        assert_eq!(engine.list_for_user(&customer("u-1")).await.unwrap().len(), 1);
        assert_eq!(engine.list_all(&admin()).await.unwrap().len(), 2);
        assert!(matches!(
            engine.list_all(&customer("u-1")).await,
            Err(EngineError::Core(CoreError::Forbidden(_)))
        ));

        assert!(engine.get_order(&customer("u-1"), &mine.id).await.is_ok());
        assert!(engine.get_order(&admin(), &mine.id).await.is_ok());
        assert!(matches!(
            engine.get_order(&customer("u-2"), &mine.id).await,
            Err(EngineError::Core(CoreError::Forbidden(_)))
        ));
    }

    #[tokio::test]
    async fn test_stock_precheck() {
        let db = memory_db().await;
        let mug = seed_product(&db, "Mug", 1000, 2).await;

        let err = engine(&db)
            .create_order(&customer("u-1"), request(&[(mug.id.as_str(), 3)], 0, 0))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientInventory { available: 2, requested: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_checkout_of_last_unit() {
        let (db, path) = file_db().await;
        let chair = seed_product(&db, "Last Chair", 4999, 1).await;

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let engine = engine(&db);
                let req = request(&[(chair.id.as_str(), 1)], 0, 0);
                tokio::spawn(async move { engine.create_order(&customer(&format!("u-{i}")), req).await })
            })
            .collect();

        let mut placed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(e) => assert!(matches!(
                    e,
                    EngineError::Core(CoreError::InsufficientInventory { .. })
                )),
            }
        }

        assert_eq!(placed, 1);
        assert_eq!(stock(&db, &chair.id).await, 0);

        db.close().await;
        let _ = std::fs::remove_file(path);
    }
}
