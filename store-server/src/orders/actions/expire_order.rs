//! Expire-order action
//!
//! Sweeper-initiated PENDING → TIMEOUT. Unlike the other transitions, losing
//! here is normal: the candidate set is computed from a stale read, so an
//! order that got paid or cancelled in the meantime, or that is no longer
//! old enough, is skipped rather than failed.

use shared::order::{Order, OrderStatus};

use super::{ActionContext, OrderResult};
use crate::orders::ledger::StockLedger;

/// Expire-order action
#[derive(Debug, Clone)]
pub struct ExpireOrderAction {
    pub order_id: i64,
    /// Orders created strictly before this instant (Unix millis) are stale
    pub cutoff: i64,
}

impl ExpireOrderAction {
    /// Time out a stale pending order and release its reservations
    ///
    /// Returns `Ok(None)` when the order no longer qualifies: missing (never
    /// committed), already in a terminal state, or created at/after the
    /// cutoff. The status re-check happens inside this transaction, so the
    /// sweeper can never override a payment that won the race.
    pub fn execute(&self, ctx: &ActionContext<'_>) -> OrderResult<Option<Order>> {
        let Some(mut order) = ctx.store.get_order_txn(ctx.txn, self.order_id)? else {
            return Ok(None);
        };

        if order.status != OrderStatus::Pending || order.created_at >= self.cutoff {
            return Ok(None);
        }

        for line in &order.lines {
            StockLedger::release(ctx.txn, &line.product_id, line.quantity)?;
        }

        order.status = OrderStatus::Timeout;
        order.updated_at = ctx.now;
        ctx.store.put_order(ctx.txn, &order)?;

        tracing::info!(
            order_id = order.id,
            created_at = order.created_at,
            cutoff = self.cutoff,
            "Order timed out"
        );

        Ok(Some(order))
    }
}
