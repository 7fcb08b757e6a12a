//! Cancel-order action
//!
//! User-initiated PENDING → CANCELLED. Lookup is scoped to the owning user;
//! someone else's order id behaves exactly like a missing order.

use shared::order::{Order, OrderStatus};

use super::{ActionContext, OrderError, OrderResult};
use crate::orders::ledger::StockLedger;

/// Cancel-order action
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub user_id: i64,
    pub order_id: i64,
}

impl CancelOrderAction {
    /// Cancel a pending order and release its reservations
    pub fn execute(&self, ctx: &ActionContext<'_>) -> OrderResult<Order> {
        let mut order = ctx
            .store
            .get_order_txn(ctx.txn, self.order_id)?
            .filter(|o| o.user_id == self.user_id)
            .ok_or(OrderError::OrderNotFound(self.order_id))?;

        if order.status != OrderStatus::Pending {
            return Err(OrderError::OrderCannotCancel(order.status));
        }

        for line in &order.lines {
            StockLedger::release(ctx.txn, &line.product_id, line.quantity)?;
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = ctx.now;
        ctx.store.put_order(ctx.txn, &order)?;

        tracing::info!(order_id = order.id, user_id = self.user_id, "Order cancelled");

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::checkout::{CheckoutAction, ResolvedLine};
    use crate::orders::ledger::StockLedger;
    use crate::orders::storage::OrderStore;
    use shared::order::PaymentMethod;

    fn pending_order(store: &OrderStore) -> Order {
        let txn = store.begin_write().unwrap();
        StockLedger::adjust(&txn, "product:x", 10, 0).unwrap();
        txn.commit().unwrap();

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, store, 1000);
        let order = CheckoutAction {
            user_id: 7,
            lines: vec![ResolvedLine {
                cart_line_id: "cart_line:a".into(),
                product_id: "product:x".into(),
                title: "Widget".into(),
                unit_price: "5.00".parse().unwrap(),
                quantity: 3,
            }],
            shipping_address: "1 Main St".into(),
            payment_method: PaymentMethod::Gateway,
        }
        .execute(&ctx)
        .unwrap();
        txn.commit().unwrap();
        order
    }

    #[test]
    fn test_cancel_restores_stock() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = pending_order(&store);

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 2000);
        let cancelled = CancelOrderAction {
            user_id: 7,
            order_id: order.id,
        }
        .execute(&ctx)
        .unwrap();
        txn.commit().unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.updated_at, 2000);

        // Round-trip: back to pre-checkout counters
        let levels = store.get_stock("product:x").unwrap().unwrap();
        assert_eq!((levels.available, levels.reserved), (10, 0));
        assert!(store.pending_order_ids().unwrap().is_empty());
    }

    #[test]
    fn test_cancel_wrong_user_behaves_like_missing() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = pending_order(&store);

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 2000);
        let err = CancelOrderAction {
            user_id: 99,
            order_id: order.id,
        }
        .execute(&ctx)
        .unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(_)));
    }

    #[test]
    fn test_cancel_non_pending_rejected() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = pending_order(&store);

        // Cancel once
        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 2000);
        CancelOrderAction {
            user_id: 7,
            order_id: order.id,
        }
        .execute(&ctx)
        .unwrap();
        txn.commit().unwrap();

        // Cancel again
        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 3000);
        let err = CancelOrderAction {
            user_id: 7,
            order_id: order.id,
        }
        .execute(&ctx)
        .unwrap_err();
        assert!(matches!(
            err,
            OrderError::OrderCannotCancel(OrderStatus::Cancelled)
        ));
        drop(txn);

        // Stock untouched by the second attempt
        let levels = store.get_stock("product:x").unwrap().unwrap();
        assert_eq!((levels.available, levels.reserved), (10, 0));
    }
}
