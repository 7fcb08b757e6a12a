//! OrderManager - the order core's front door
//!
//! Resolves cart and catalog collaborators, then runs every state-machine
//! command inside one redb write transaction.
//!
//! # Command Flow
//!
//! ```text
//! checkout(user, selection)
//!     ├─ 1. Resolve cart lines (scoped to user) and products
//!     ├─ 2. Begin write transaction
//!     ├─ 3. CheckoutAction: pre-flight check, create order, reserve lines
//!     ├─ 4. Commit (any error above drops the txn -> nothing happened)
//!     └─ 5. Return the PENDING order
//!
//! handle_payment_notice(notice)
//!     ├─ 1. Begin write transaction
//!     ├─ 2. MarkPaidAction: test-and-set PENDING -> PAID, commit stock
//!     ├─ 3. Commit transaction
//!     ├─ 4. Clear the originating cart lines (failure logged, not surfaced)
//!     └─ 5. Return the notice as acknowledgement
//! ```

use shared::order::{CheckoutRequest, Order, PaymentNotice, StockAdjustment, StockLevels};
use surrealdb::engine::local::Db;
use surrealdb::Surreal;

use super::actions::{
    ActionContext, CancelOrderAction, CheckoutAction, ExpireOrderAction, MarkPaidAction,
    OrderError, OrderResult, ResolvedLine,
};
use super::ledger::StockLedger;
use super::storage::OrderStore;
use crate::db::repository::{record_id, CartRepository, ProductRepository, RepoError};

const CART_TABLE: &str = "cart_line";

impl From<RepoError> for OrderError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => OrderError::CartLineNotFound(what),
            RepoError::Database(msg) => OrderError::Database(msg),
            RepoError::Validation(msg) => OrderError::Database(msg),
        }
    }
}

/// Order manager
#[derive(Clone)]
pub struct OrderManager {
    store: OrderStore,
    products: ProductRepository,
    carts: CartRepository,
}

impl OrderManager {
    pub fn new(store: OrderStore, db: Surreal<Db>) -> Self {
        Self {
            store,
            products: ProductRepository::new(db.clone()),
            carts: CartRepository::new(db),
        }
    }

    // ========== Checkout ==========

    /// Turn a cart selection into a PENDING order with reserved stock
    pub async fn checkout(&self, user_id: i64, req: CheckoutRequest) -> OrderResult<Order> {
        if req.cart_line_ids.is_empty() {
            return Err(OrderError::EmptySelection);
        }

        tracing::info!(
            user_id = user_id,
            lines = req.cart_line_ids.len(),
            "Checkout requested"
        );

        // Resolve cart lines; a missing or foreign line aborts the checkout
        let cart_lines = self
            .carts
            .find_by_user_and_ids(user_id, &req.cart_line_ids)
            .await?;

        let mut resolved = Vec::with_capacity(req.cart_line_ids.len());
        for raw_id in &req.cart_line_ids {
            let wanted = record_id(CART_TABLE, raw_id).to_string();
            let line = cart_lines
                .iter()
                .find(|l| {
                    l.id.as_ref()
                        .map(|id| id.to_string() == wanted)
                        .unwrap_or(false)
                })
                .ok_or_else(|| OrderError::CartLineNotFound(raw_id.clone()))?;

            let product = self
                .products
                .find_by_id(&line.product)
                .await?
                .ok_or_else(|| OrderError::ProductNotFound(line.product.to_string()))?;

            resolved.push(ResolvedLine {
                cart_line_id: wanted,
                product_id: line.product.to_string(),
                title: product.title,
                unit_price: product.price,
                quantity: line.quantity,
            });
        }

        let action = CheckoutAction {
            user_id,
            lines: resolved,
            shipping_address: req.shipping_address,
            payment_method: req.payment_method,
        };

        let txn = self.store.begin_write()?;
        let ctx = ActionContext::new(&txn, &self.store, shared::util::now_millis());
        let order = action.execute(&ctx)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        Ok(order)
    }

    // ========== Queries ==========

    /// Get an order, scoped to the owning user
    pub fn get_order(&self, user_id: i64, order_id: i64) -> OrderResult<Order> {
        self.store
            .get_order(order_id)?
            .filter(|o| o.user_id == user_id)
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    /// All of a user's orders, newest first
    pub fn list_orders(&self, user_id: i64) -> OrderResult<Vec<Order>> {
        Ok(self.store.orders_for_user(user_id)?)
    }

    /// Fetch an order for payment: must belong to the user and still be
    /// PENDING. The caller builds the provider pay form from the result.
    pub fn pay_order(&self, user_id: i64, order_id: i64) -> OrderResult<Order> {
        let order = self.get_order(user_id, order_id)?;
        if order.status != shared::order::OrderStatus::Pending {
            return Err(OrderError::OrderStatusError {
                current: order.status,
                expected: shared::order::OrderStatus::Pending,
            });
        }
        Ok(order)
    }

    // ========== Payment Reconciliation ==========

    /// Apply a verified payment notification exactly once
    ///
    /// The PENDING test-and-set inside the transaction makes redelivered
    /// webhooks and a racing expiry sweep mutually exclusive with the
    /// transition. Cart clearing is deliberately outside the transaction
    /// and after it: a cart failure must not undo a recorded payment.
    pub async fn handle_payment_notice(&self, notice: PaymentNotice) -> OrderResult<PaymentNotice> {
        let order = {
            let txn = self.store.begin_write()?;
            let ctx = ActionContext::new(&txn, &self.store, shared::util::now_millis());
            let order = MarkPaidAction {
                notice: notice.clone(),
            }
            .execute(&ctx)?;
            txn.commit().map_err(super::storage::StorageError::from)?;
            order
        };

        // Clear exactly the checked-out cart lines
        let cart_line_ids: Vec<String> =
            order.lines.iter().map(|l| l.cart_line_id.clone()).collect();
        if let Err(e) = self
            .carts
            .remove_by_user_and_ids(order.user_id, &cart_line_ids)
            .await
        {
            tracing::error!(
                order_id = order.id,
                error = %e,
                "Failed to clear cart lines after payment"
            );
        } else {
            tracing::info!(
                order_id = order.id,
                user_id = order.user_id,
                lines = cart_line_ids.len(),
                "Cart lines cleared after payment"
            );
        }

        Ok(notice)
    }

    // ========== Cancellation ==========

    /// User-initiated cancellation of a pending order
    pub fn cancel_order(&self, user_id: i64, order_id: i64) -> OrderResult<Order> {
        let txn = self.store.begin_write()?;
        let ctx = ActionContext::new(&txn, &self.store, shared::util::now_millis());
        let order = CancelOrderAction { user_id, order_id }.execute(&ctx)?;
        txn.commit().map_err(super::storage::StorageError::from)?;
        Ok(order)
    }

    // ========== Expiry ==========

    /// Time out every pending order created before `cutoff`
    ///
    /// Each order runs in its own transaction; one failure is logged and the
    /// batch moves on; the next sweep retries whatever is still pending and
    /// stale. Returns the number of orders timed out.
    pub fn expire_stale(&self, now: i64, cutoff: i64) -> OrderResult<usize> {
        let candidates = self.store.pending_order_ids()?;
        let mut expired = 0;

        for order_id in candidates {
            let result = (|| -> OrderResult<Option<Order>> {
                let txn = self.store.begin_write()?;
                let ctx = ActionContext::new(&txn, &self.store, now);
                let outcome = ExpireOrderAction { order_id, cutoff }.execute(&ctx)?;
                if outcome.is_some() {
                    txn.commit().map_err(super::storage::StorageError::from)?;
                }
                Ok(outcome)
            })();

            match result {
                Ok(Some(_)) => expired += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(order_id = order_id, error = %e, "Failed to expire order");
                }
            }
        }

        if expired > 0 {
            tracing::info!(expired = expired, "Expired stale pending orders");
        }
        Ok(expired)
    }

    // ========== Stock Administration ==========

    /// Current counters for a product
    pub fn stock_levels(&self, product_id: &str) -> OrderResult<StockLevels> {
        self.store
            .get_stock(product_id)?
            .ok_or_else(|| OrderError::StockNotFound(product_id.to_string()))
    }

    /// Administrative stock override
    pub fn adjust_stock(&self, product_id: &str, adj: StockAdjustment) -> OrderResult<StockLevels> {
        let txn = self.store.begin_write()?;
        let levels = StockLedger::adjust(&txn, product_id, adj.available, adj.reserved)
            .map_err(OrderError::from)?;
        txn.commit().map_err(super::storage::StorageError::from)?;
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CartLineCreate, ProductCreate};
    use crate::db::DbService;
    use rust_decimal::Decimal;
    use shared::order::{OrderStatus, PaymentMethod};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    struct Fixture {
        manager: OrderManager,
        carts: CartRepository,
        products: ProductRepository,
    }

    async fn fixture() -> Fixture {
        let svc = DbService::new_in_memory().await.unwrap();
        let store = OrderStore::open_in_memory().unwrap();
        Fixture {
            manager: OrderManager::new(store, svc.db.clone()),
            carts: CartRepository::new(svc.db.clone()),
            products: ProductRepository::new(svc.db.clone()),
        }
    }

    /// Seed a product with stock and a cart line for user 7; returns
    /// (product_id, cart_line_id)
    async fn seed(fx: &Fixture, price: &str, available: u32, qty: u32) -> (String, String) {
        let product = fx
            .products
            .create(ProductCreate {
                title: "Widget".into(),
                price: dec(price),
                description: None,
                cover: None,
            })
            .await
            .unwrap();
        let product_id = product.id.clone().unwrap();

        fx.manager
            .adjust_stock(
                &product_id.to_string(),
                StockAdjustment {
                    available,
                    reserved: 0,
                },
            )
            .unwrap();

        let line = fx
            .carts
            .create(CartLineCreate {
                user_id: 7,
                product: product_id.clone(),
                quantity: qty,
            })
            .await
            .unwrap();

        (
            product_id.to_string(),
            line.id.unwrap().to_string(),
        )
    }

    fn checkout_req(cart_line_ids: Vec<String>) -> CheckoutRequest {
        CheckoutRequest {
            cart_line_ids,
            shipping_address: "1 Main St".into(),
            payment_method: PaymentMethod::Gateway,
        }
    }

    fn notice_for(order: &Order) -> PaymentNotice {
        PaymentNotice {
            order_id: order.id,
            trade_no: "T-100".into(),
            status: "TRADE_SUCCESS".into(),
            total_amount: order.total_amount,
            payment_time: None,
        }
    }

    #[tokio::test]
    async fn test_checkout_resolves_prices_and_reserves() {
        let fx = fixture().await;
        let (product_id, cart_line_id) = seed(&fx, "19.90", 10, 3).await;

        let order = fx
            .manager
            .checkout(7, checkout_req(vec![cart_line_id.clone()]))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, dec("59.70"));
        assert_eq!(order.lines[0].title, "Widget");
        assert_eq!(order.lines[0].cart_line_id, cart_line_id);

        let levels = fx.manager.stock_levels(&product_id).unwrap();
        assert_eq!((levels.available, levels.reserved), (7, 3));

        // Cart untouched until payment
        let lines = fx
            .carts
            .find_by_user_and_ids(7, &[cart_line_id])
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_empty_selection() {
        let fx = fixture().await;
        let err = fx.manager.checkout(7, checkout_req(vec![])).await.unwrap_err();
        assert!(matches!(err, OrderError::EmptySelection));
    }

    #[tokio::test]
    async fn test_checkout_foreign_cart_line_rejected() {
        let fx = fixture().await;
        let (_, cart_line_id) = seed(&fx, "5.00", 10, 1).await;

        // Another user tries to check out user 7's line
        let err = fx
            .manager
            .checkout(99, checkout_req(vec![cart_line_id]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::CartLineNotFound(_)));
    }

    #[tokio::test]
    async fn test_checkout_insufficient_stock() {
        let fx = fixture().await;
        let (product_id, cart_line_id) = seed(&fx, "5.00", 2, 5).await;

        let err = fx
            .manager
            .checkout(7, checkout_req(vec![cart_line_id]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { .. }));

        let levels = fx.manager.stock_levels(&product_id).unwrap();
        assert_eq!((levels.available, levels.reserved), (2, 0));
    }

    #[tokio::test]
    async fn test_payment_clears_cart_lines() {
        let fx = fixture().await;
        let (product_id, cart_line_id) = seed(&fx, "5.00", 10, 3).await;

        let order = fx
            .manager
            .checkout(7, checkout_req(vec![cart_line_id.clone()]))
            .await
            .unwrap();

        let ack = fx
            .manager
            .handle_payment_notice(notice_for(&order))
            .await
            .unwrap();
        assert_eq!(ack.order_id, order.id);

        let paid = fx.manager.get_order(7, order.id).unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(paid.trade_no.as_deref(), Some("T-100"));

        let levels = fx.manager.stock_levels(&product_id).unwrap();
        assert_eq!((levels.available, levels.reserved), (7, 0));

        // The checked-out line is gone from the cart
        let lines = fx
            .carts
            .find_by_user_and_ids(7, &[cart_line_id])
            .await
            .unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_payment_mismatch_keeps_cart() {
        let fx = fixture().await;
        let (_, cart_line_id) = seed(&fx, "5.00", 10, 3).await;

        let order = fx
            .manager
            .checkout(7, checkout_req(vec![cart_line_id.clone()]))
            .await
            .unwrap();

        let mut notice = notice_for(&order);
        notice.total_amount = dec("0.10");
        let err = fx.manager.handle_payment_notice(notice).await.unwrap_err();
        assert!(matches!(err, OrderError::PaymentAmountMismatch { .. }));

        let still_pending = fx.manager.get_order(7, order.id).unwrap();
        assert_eq!(still_pending.status, OrderStatus::Pending);

        let lines = fx
            .carts
            .find_by_user_and_ids(7, &[cart_line_id])
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_round_trip() {
        let fx = fixture().await;
        let (product_id, cart_line_id) = seed(&fx, "5.00", 10, 3).await;

        let order = fx
            .manager
            .checkout(7, checkout_req(vec![cart_line_id]))
            .await
            .unwrap();
        let cancelled = fx.manager.cancel_order(7, order.id).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let levels = fx.manager.stock_levels(&product_id).unwrap();
        assert_eq!((levels.available, levels.reserved), (10, 0));
    }

    #[tokio::test]
    async fn test_expire_stale_batch_skips_fresh_orders() {
        let fx = fixture().await;
        let (product_id, stale_line) = seed(&fx, "5.00", 10, 2).await;
        let fresh_line = {
            let line = fx
                .carts
                .create(CartLineCreate {
                    user_id: 7,
                    product: record_id("product", &product_id),
                    quantity: 1,
                })
                .await
                .unwrap();
            line.id.unwrap().to_string()
        };

        let stale = fx
            .manager
            .checkout(7, checkout_req(vec![stale_line]))
            .await
            .unwrap();
        let fresh = fx
            .manager
            .checkout(7, checkout_req(vec![fresh_line]))
            .await
            .unwrap();

        // Cutoff falls between the two creation times
        let cutoff = fresh.created_at.max(stale.created_at + 1);
        let now = cutoff + 60_000;
        let expired = fx.manager.expire_stale(now, cutoff).unwrap();
        assert_eq!(expired, 1);

        assert_eq!(
            fx.manager.get_order(7, stale.id).unwrap().status,
            OrderStatus::Timeout
        );
        assert_eq!(
            fx.manager.get_order(7, fresh.id).unwrap().status,
            OrderStatus::Pending
        );

        // Stale released its 2, fresh still holds its 1
        let levels = fx.manager.stock_levels(&product_id).unwrap();
        assert_eq!((levels.available, levels.reserved), (9, 1));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_payment_and_expiry_race_has_one_winner() {
        let fx = fixture().await;
        let (product_id, cart_line_id) = seed(&fx, "5.00", 10, 3).await;

        let order = fx
            .manager
            .checkout(7, checkout_req(vec![cart_line_id]))
            .await
            .unwrap();

        let cutoff = order.created_at + 1;
        let now = cutoff + 60_000;

        let pay_manager = fx.manager.clone();
        let pay_notice = notice_for(&order);
        let pay = tokio::spawn(async move { pay_manager.handle_payment_notice(pay_notice).await });

        let sweep_manager = fx.manager.clone();
        let sweep =
            tokio::task::spawn_blocking(move || sweep_manager.expire_stale(now, cutoff));

        let pay_result = pay.await.unwrap();
        let sweep_result = sweep.await.unwrap().unwrap();

        let final_order = fx.manager.get_order(7, order.id).unwrap();
        let levels = fx.manager.stock_levels(&product_id).unwrap();

        match (&pay_result, sweep_result) {
            // Payment won: sweeper must not have touched the order
            (Ok(_), 0) => {
                assert_eq!(final_order.status, OrderStatus::Paid);
                assert_eq!((levels.available, levels.reserved), (7, 0));
            }
            // Sweeper won: payment must have failed loudly
            (Err(OrderError::OrderStatusError { .. }), 1) => {
                assert_eq!(final_order.status, OrderStatus::Timeout);
                assert_eq!((levels.available, levels.reserved), (10, 0));
            }
            other => panic!("expected exactly one winner, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pay_order_requires_pending() {
        let fx = fixture().await;
        let (_, cart_line_id) = seed(&fx, "5.00", 10, 3).await;

        let order = fx
            .manager
            .checkout(7, checkout_req(vec![cart_line_id]))
            .await
            .unwrap();

        // Pending: allowed
        assert!(fx.manager.pay_order(7, order.id).is_ok());

        // Cancelled: rejected
        fx.manager.cancel_order(7, order.id).unwrap();
        assert!(matches!(
            fx.manager.pay_order(7, order.id),
            Err(OrderError::OrderStatusError { .. })
        ));
    }

    #[tokio::test]
    async fn test_stock_levels_missing() {
        let fx = fixture().await;
        assert!(matches!(
            fx.manager.stock_levels("product:ghost"),
            Err(OrderError::StockNotFound(_))
        ));
    }
}
