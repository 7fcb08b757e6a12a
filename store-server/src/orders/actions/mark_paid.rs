//! Mark-paid action
//!
//! Drives PENDING → PAID from a verified payment notification. The status
//! check makes the action idempotent against webhook redelivery: a second
//! delivery finds the order already PAID and fails without touching stock.

use shared::order::{Order, OrderStatus, PaymentNotice};

use super::{ActionContext, OrderError, OrderResult};
use crate::orders::ledger::StockLedger;

/// Mark-paid action
#[derive(Debug, Clone)]
pub struct MarkPaidAction {
    pub notice: PaymentNotice,
}

impl MarkPaidAction {
    /// Validate the notification against the stored order and commit the
    /// reservation of every line
    pub fn execute(&self, ctx: &ActionContext<'_>) -> OrderResult<Order> {
        let mut order = ctx
            .store
            .get_order_txn(ctx.txn, self.notice.order_id)?
            .ok_or(OrderError::OrderNotFound(self.notice.order_id))?;

        if order.status != OrderStatus::Pending {
            return Err(OrderError::OrderStatusError {
                current: order.status,
                expected: OrderStatus::Pending,
            });
        }

        // Exact match required; a mismatch is a tampering signal, not a
        // rounding problem
        if order.total_amount != self.notice.total_amount {
            tracing::warn!(
                order_id = order.id,
                expected = %order.total_amount,
                reported = %self.notice.total_amount,
                "Payment amount mismatch"
            );
            return Err(OrderError::PaymentAmountMismatch {
                expected: order.total_amount,
                reported: self.notice.total_amount,
            });
        }

        for line in &order.lines {
            StockLedger::commit(ctx.txn, &line.product_id, line.quantity)?;
        }

        order.status = OrderStatus::Paid;
        order.trade_no = Some(self.notice.trade_no.clone());
        order.payment_time = Some(self.notice.payment_time.unwrap_or(ctx.now));
        order.updated_at = ctx.now;
        ctx.store.put_order(ctx.txn, &order)?;

        tracing::info!(
            order_id = order.id,
            trade_no = %self.notice.trade_no,
            "Order paid"
        );

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::checkout::{CheckoutAction, ResolvedLine};
    use crate::orders::ledger::StockLedger;
    use crate::orders::storage::OrderStore;
    use rust_decimal::Decimal;
    use shared::order::PaymentMethod;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    /// Seed stock and create a pending order reserving 3 of product:x
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
                unit_price: dec("5.00"),
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

    fn notice_for(order: &Order) -> PaymentNotice {
        PaymentNotice {
            order_id: order.id,
            trade_no: "T-001".into(),
            status: "TRADE_SUCCESS".into(),
            total_amount: order.total_amount,
            payment_time: Some(2000),
        }
    }

    #[test]
    fn test_mark_paid_commits_stock() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = pending_order(&store);

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 3000);
        let paid = MarkPaidAction {
            notice: notice_for(&order),
        }
        .execute(&ctx)
        .unwrap();
        txn.commit().unwrap();

        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(paid.trade_no.as_deref(), Some("T-001"));
        assert_eq!(paid.payment_time, Some(2000));
        assert_eq!(paid.updated_at, 3000);

        // available stays decremented, reserved is consumed
        let levels = store.get_stock("product:x").unwrap().unwrap();
        assert_eq!((levels.available, levels.reserved), (7, 0));

        // No longer a sweeper candidate
        assert!(store.pending_order_ids().unwrap().is_empty());
    }

    #[test]
    fn test_mark_paid_unknown_order() {
        let store = OrderStore::open_in_memory().unwrap();

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 3000);
        let err = MarkPaidAction {
            notice: PaymentNotice {
                order_id: 999,
                trade_no: "T".into(),
                status: "TRADE_SUCCESS".into(),
                total_amount: dec("1.00"),
                payment_time: None,
            },
        }
        .execute(&ctx)
        .unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(999)));
    }

    #[test]
    fn test_mark_paid_duplicate_notice_is_rejected() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = pending_order(&store);

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 3000);
        MarkPaidAction {
            notice: notice_for(&order),
        }
        .execute(&ctx)
        .unwrap();
        txn.commit().unwrap();

        // Second delivery of the same webhook
        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 4000);
        let err = MarkPaidAction {
            notice: notice_for(&order),
        }
        .execute(&ctx)
        .unwrap_err();
        match err {
            OrderError::OrderStatusError { current, expected } => {
                assert_eq!(current, OrderStatus::Paid);
                assert_eq!(expected, OrderStatus::Pending);
            }
            other => panic!("unexpected error: {other}"),
        }
        drop(txn);

        // Exactly one stock commit happened
        let levels = store.get_stock("product:x").unwrap().unwrap();
        assert_eq!((levels.available, levels.reserved), (7, 0));
    }

    #[test]
    fn test_mark_paid_amount_mismatch_leaves_order_untouched() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = pending_order(&store);

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 3000);
        let mut notice = notice_for(&order);
        notice.total_amount = dec("0.01");
        let err = MarkPaidAction { notice }.execute(&ctx).unwrap_err();
        assert!(matches!(err, OrderError::PaymentAmountMismatch { .. }));
        drop(txn);

        let stored = store.get_order(order.id).unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(stored.trade_no.is_none());

        let levels = store.get_stock("product:x").unwrap().unwrap();
        assert_eq!((levels.available, levels.reserved), (7, 3));
    }

    #[test]
    fn test_mark_paid_defaults_payment_time_to_now() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = pending_order(&store);

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 5555);
        let mut notice = notice_for(&order);
        notice.payment_time = None;
        let paid = MarkPaidAction { notice }.execute(&ctx).unwrap();
        txn.commit().unwrap();

        assert_eq!(paid.payment_time, Some(5555));
    }
}
