//! Checkout action
//!
//! Turns a set of resolved cart lines into a PENDING order plus one stock
//! reservation per line, atomically. The caller resolves cart lines against
//! the cart and catalog stores first; this action owns everything that must
//! be transactional.

use rust_decimal::Decimal;
use shared::order::{Order, OrderLine, OrderStatus, PaymentMethod};

use super::{ActionContext, OrderError, OrderResult};
use crate::orders::ledger::StockLedger;

/// A cart line resolved against the catalog: price and title are captured
/// here and frozen into the order
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub cart_line_id: String,
    pub product_id: String,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Checkout action
#[derive(Debug, Clone)]
pub struct CheckoutAction {
    pub user_id: i64,
    pub lines: Vec<ResolvedLine>,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
}

impl CheckoutAction {
    /// Create the order and reserve stock for every line
    ///
    /// The pre-flight pass rejects predictably-failing checkouts with the
    /// offending product named before anything is written. The reserve loop
    /// then re-validates each line authoritatively: inside this transaction
    /// the two cannot disagree, and any error aborts the whole transaction,
    /// so a multi-line checkout is all-or-nothing.
    pub fn execute(&self, ctx: &ActionContext<'_>) -> OrderResult<Order> {
        if self.lines.is_empty() {
            return Err(OrderError::EmptySelection);
        }

        // Pre-flight: every line must be satisfiable before any reservation
        for line in &self.lines {
            let levels = StockLedger::get(ctx.txn, &line.product_id)?;
            if levels.available < line.quantity {
                return Err(OrderError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    available: levels.available,
                    requested: line.quantity,
                });
            }
        }

        let total_amount: Decimal = self
            .lines
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum();

        let order = Order {
            id: shared::util::snowflake_id(),
            user_id: self.user_id,
            total_amount,
            shipping_address: self.shipping_address.clone(),
            payment_method: self.payment_method,
            status: OrderStatus::Pending,
            trade_no: None,
            payment_time: None,
            created_at: ctx.now,
            updated_at: ctx.now,
            lines: self
                .lines
                .iter()
                .map(|l| OrderLine {
                    cart_line_id: l.cart_line_id.clone(),
                    product_id: l.product_id.clone(),
                    title: l.title.clone(),
                    unit_price: l.unit_price,
                    quantity: l.quantity,
                })
                .collect(),
        };

        // Reservations applied in selection order
        for line in &self.lines {
            StockLedger::reserve(ctx.txn, &line.product_id, line.quantity)?;
        }

        ctx.store.put_order(ctx.txn, &order)?;

        tracing::info!(
            order_id = order.id,
            user_id = self.user_id,
            total = %order.total_amount,
            lines = order.lines.len(),
            "Order created"
        );

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::ledger::StockLedger;
    use crate::orders::storage::OrderStore;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn seed_stock(store: &OrderStore, product_id: &str, available: u32) {
        let txn = store.begin_write().unwrap();
        StockLedger::adjust(&txn, product_id, available, 0).unwrap();
        txn.commit().unwrap();
    }

    fn line(cart: &str, product: &str, price: &str, qty: u32) -> ResolvedLine {
        ResolvedLine {
            cart_line_id: cart.into(),
            product_id: product.into(),
            title: format!("Title of {product}"),
            unit_price: dec(price),
            quantity: qty,
        }
    }

    fn action(lines: Vec<ResolvedLine>) -> CheckoutAction {
        CheckoutAction {
            user_id: 7,
            lines,
            shipping_address: "1 Main St".into(),
            payment_method: PaymentMethod::Gateway,
        }
    }

    #[test]
    fn test_checkout_reserves_and_creates_pending_order() {
        let store = OrderStore::open_in_memory().unwrap();
        seed_stock(&store, "product:x", 10);

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 1000);
        let order = action(vec![line("cart_line:a", "product:x", "19.90", 3)])
            .execute(&ctx)
            .unwrap();
        txn.commit().unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, dec("59.70"));
        assert_eq!(order.created_at, 1000);
        assert_eq!(order.lines.len(), 1);

        let levels = store.get_stock("product:x").unwrap().unwrap();
        assert_eq!(levels.available, 7);
        assert_eq!(levels.reserved, 3);

        assert_eq!(store.pending_order_ids().unwrap(), vec![order.id]);
    }

    #[test]
    fn test_checkout_empty_selection() {
        let store = OrderStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 1000);
        assert!(matches!(
            action(vec![]).execute(&ctx),
            Err(OrderError::EmptySelection)
        ));
    }

    #[test]
    fn test_checkout_total_sums_all_lines() {
        let store = OrderStore::open_in_memory().unwrap();
        seed_stock(&store, "product:x", 10);
        seed_stock(&store, "product:y", 10);

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 1000);
        let order = action(vec![
            line("cart_line:a", "product:x", "10.00", 2),
            line("cart_line:b", "product:y", "0.50", 4),
        ])
        .execute(&ctx)
        .unwrap();
        txn.commit().unwrap();

        assert_eq!(order.total_amount, dec("22.00"));
        assert_eq!(order.total_quantity(), 6);
    }

    #[test]
    fn test_checkout_insufficient_stock_names_product() {
        let store = OrderStore::open_in_memory().unwrap();
        seed_stock(&store, "product:x", 10);
        seed_stock(&store, "product:y", 1);

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 1000);
        let err = action(vec![
            line("cart_line:a", "product:x", "10.00", 2),
            line("cart_line:b", "product:y", "0.50", 4),
        ])
        .execute(&ctx)
        .unwrap_err();

        match err {
            OrderError::InsufficientStock {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id, "product:y");
                assert_eq!(available, 1);
                assert_eq!(requested, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
        drop(txn);

        // All-or-nothing: neither product was touched
        let x = store.get_stock("product:x").unwrap().unwrap();
        assert_eq!((x.available, x.reserved), (10, 0));
        let y = store.get_stock("product:y").unwrap().unwrap();
        assert_eq!((y.available, y.reserved), (1, 0));
        assert!(store.pending_order_ids().unwrap().is_empty());
    }

    #[test]
    fn test_checkout_missing_stock_record() {
        let store = OrderStore::open_in_memory().unwrap();

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 1000);
        assert!(matches!(
            action(vec![line("cart_line:a", "product:ghost", "1.00", 1)]).execute(&ctx),
            Err(OrderError::StockNotFound(_))
        ));
    }

    #[test]
    fn test_checkout_price_frozen_in_lines() {
        let store = OrderStore::open_in_memory().unwrap();
        seed_stock(&store, "product:x", 5);

        let txn = store.begin_write().unwrap();
        let ctx = ActionContext::new(&txn, &store, 1000);
        let order = action(vec![line("cart_line:a", "product:x", "3.33", 2)])
            .execute(&ctx)
            .unwrap();
        txn.commit().unwrap();

        let stored = store.get_order(order.id).unwrap().unwrap();
        assert_eq!(stored.lines[0].unit_price, dec("3.33"));
        assert_eq!(stored.lines[0].cart_line_id, "cart_line:a");
    }
}
