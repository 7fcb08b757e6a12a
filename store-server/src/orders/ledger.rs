//! Stock reservation ledger
//!
//! Per-product `available` / `reserved` counters, mutated only through the
//! operations below. Every operation runs against the caller's write
//! transaction, so the availability check and the counter update are one
//! indivisible step: there is no window for a concurrent checkout between
//! "read current state" and "write new state".
//!
//! Counter semantics:
//! - `reserve`: available -= qty, reserved += qty (fails if available < qty)
//! - `release`: reserved -= qty (clamped at 0), available += qty
//! - `commit`:  reserved -= qty (clamped at 0); available was already
//!   decremented at reserve time, the stock is now permanently consumed
//! - `adjust`:  administrative overwrite of both counters

use redb::{ReadableTable, WriteTransaction};
use shared::order::StockLevels;
use thiserror::Error;

use super::storage::STOCK_TABLE;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("No stock record for product {0}")]
    StockNotFound(String),

    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: u32,
        requested: u32,
    },

    #[error(transparent)]
    Storage(#[from] super::storage::StorageError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Stock ledger operating on an explicit write transaction
pub struct StockLedger;

impl StockLedger {
    fn load(txn: &WriteTransaction, product_id: &str) -> LedgerResult<StockLevels> {
        let table = txn
            .open_table(STOCK_TABLE)
            .map_err(super::storage::StorageError::from)?;
        let levels = match table
            .get(product_id)
            .map_err(super::storage::StorageError::from)?
        {
            Some(value) => serde_json::from_slice(value.value())
                .map_err(super::storage::StorageError::from)?,
            None => return Err(LedgerError::StockNotFound(product_id.to_string())),
        };
        Ok(levels)
    }

    fn save(txn: &WriteTransaction, product_id: &str, levels: StockLevels) -> LedgerResult<()> {
        let mut table = txn
            .open_table(STOCK_TABLE)
            .map_err(super::storage::StorageError::from)?;
        let value = serde_json::to_vec(&levels).map_err(super::storage::StorageError::from)?;
        table
            .insert(product_id, value.as_slice())
            .map_err(super::storage::StorageError::from)?;
        Ok(())
    }

    /// Current counters for a product
    pub fn get(txn: &WriteTransaction, product_id: &str) -> LedgerResult<StockLevels> {
        Self::load(txn, product_id)
    }

    /// Reserve `qty` units, failing if not enough are available
    ///
    /// The check and the decrement happen against the same transactional
    /// view; callers that pre-checked availability earlier still go through
    /// this authoritative check.
    pub fn reserve(txn: &WriteTransaction, product_id: &str, qty: u32) -> LedgerResult<StockLevels> {
        let levels = Self::load(txn, product_id)?;
        if levels.available < qty {
            return Err(LedgerError::InsufficientStock {
                product_id: product_id.to_string(),
                available: levels.available,
                requested: qty,
            });
        }
        let updated = StockLevels {
            available: levels.available - qty,
            reserved: levels.reserved + qty,
        };
        Self::save(txn, product_id, updated)?;
        tracing::info!(
            product_id = %product_id,
            qty = qty,
            available = updated.available,
            reserved = updated.reserved,
            "Stock reserved"
        );
        Ok(updated)
    }

    /// Return `qty` reserved units to the available pool
    ///
    /// `reserved` is clamped at zero; a clamp firing means someone released
    /// more than was reserved, which is worth noticing but not worth
    /// corrupting the counters over.
    pub fn release(txn: &WriteTransaction, product_id: &str, qty: u32) -> LedgerResult<StockLevels> {
        let levels = Self::load(txn, product_id)?;
        if levels.reserved < qty {
            tracing::warn!(
                product_id = %product_id,
                reserved = levels.reserved,
                qty = qty,
                "Release exceeds reserved quantity, clamping to zero"
            );
        }
        let updated = StockLevels {
            available: levels.available + qty,
            reserved: levels.reserved.saturating_sub(qty),
        };
        Self::save(txn, product_id, updated)?;
        tracing::info!(
            product_id = %product_id,
            qty = qty,
            available = updated.available,
            reserved = updated.reserved,
            "Stock released"
        );
        Ok(updated)
    }

    /// Permanently consume `qty` reserved units after payment
    ///
    /// Only `reserved` moves; `available` was already decremented when the
    /// reservation was made.
    pub fn commit(txn: &WriteTransaction, product_id: &str, qty: u32) -> LedgerResult<StockLevels> {
        let levels = Self::load(txn, product_id)?;
        if levels.reserved < qty {
            tracing::warn!(
                product_id = %product_id,
                reserved = levels.reserved,
                qty = qty,
                "Commit exceeds reserved quantity, clamping to zero"
            );
        }
        let updated = StockLevels {
            available: levels.available,
            reserved: levels.reserved.saturating_sub(qty),
        };
        Self::save(txn, product_id, updated)?;
        tracing::info!(
            product_id = %product_id,
            qty = qty,
            available = updated.available,
            reserved = updated.reserved,
            "Stock committed"
        );
        Ok(updated)
    }

    /// Administrative overwrite, bypassing the reserve/release/commit protocol
    ///
    /// Creates the stock record if it does not exist yet. Inventory tooling
    /// only; order flow never calls this.
    pub fn adjust(
        txn: &WriteTransaction,
        product_id: &str,
        available: u32,
        reserved: u32,
    ) -> LedgerResult<StockLevels> {
        let updated = StockLevels {
            available,
            reserved,
        };
        Self::save(txn, product_id, updated)?;
        tracing::info!(
            product_id = %product_id,
            available = available,
            reserved = reserved,
            "Stock adjusted"
        );
        Ok(updated)
    }
}
