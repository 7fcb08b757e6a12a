//! redb-based storage layer for orders and the stock ledger
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Full order aggregate (lines embedded) |
//! | `pending_orders` | `order_id` | `()` | Index of PENDING orders for the sweeper |
//! | `stock` | `product_id` | `StockLevels` | Per-product available/reserved counters |
//!
//! # Transactions
//!
//! redb admits a single write transaction at a time. Every state-machine
//! transition and every ledger mutation runs inside one explicit
//! [`WriteTransaction`] handed down from the caller, so "load, check status,
//! mutate" is indivisible with respect to every other writer. Dropping an
//! uncommitted transaction aborts it: a checkout that fails on its fourth
//! line leaves no order and no reservation behind.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::order::{Order, StockLevels};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Order aggregates: key = order id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

/// Pending-order index: key = order id, value = empty (existence check)
const PENDING_ORDERS_TABLE: TableDefinition<i64, ()> = TableDefinition::new("pending_orders");

/// Stock counters: key = product id, value = JSON-serialized StockLevels
pub(crate) const STOCK_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("stock");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order and stock storage backed by redb
///
/// Commits are durable as soon as `commit()` returns; the database file is
/// always in a consistent state thanks to copy-on-write with an atomic
/// pointer swap.
#[derive(Clone)]
pub struct OrderStore {
    db: Arc<Database>,
}

impl OrderStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Create all tables so later read transactions never hit a missing table
    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(PENDING_ORDERS_TABLE)?;
            let _ = write_txn.open_table(STOCK_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    ///
    /// Blocks while another write transaction is open; this serialization is
    /// what makes the status test-and-set race-free.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Order Operations ==========

    /// Store (insert or overwrite) an order, maintaining the pending index
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(order)?;
            table.insert(order.id, value.as_slice())?;
        }
        let mut index = txn.open_table(PENDING_ORDERS_TABLE)?;
        if order.status.is_terminal() {
            index.remove(order.id)?;
        } else {
            index.insert(order.id, ())?;
        }
        Ok(())
    }

    /// Get an order by id (within a write transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: i64,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by id (read-only)
    pub fn get_order(&self, order_id: i64) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All orders belonging to a user, newest first
    pub fn orders_for_user(&self, user_id: i64) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.user_id == user_id {
                orders.push(order);
            }
        }

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Ids of all orders currently in the pending index
    ///
    /// The sweeper re-checks status and staleness per order inside its own
    /// write transaction; this listing is only a candidate set.
    pub fn pending_order_ids(&self) -> StorageResult<Vec<i64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_ORDERS_TABLE)?;

        let mut ids = Vec::new();
        for result in table.iter()? {
            let (key, _value) = result?;
            ids.push(key.value());
        }
        Ok(ids)
    }

    // ========== Stock Operations ==========

    /// Get stock counters for a product (within a write transaction)
    pub fn get_stock_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StorageResult<Option<StockLevels>> {
        let table = txn.open_table(STOCK_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Overwrite stock counters for a product (within a write transaction)
    pub fn put_stock(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        levels: StockLevels,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(STOCK_TABLE)?;
        let value = serde_json::to_vec(&levels)?;
        table.insert(product_id, value.as_slice())?;
        Ok(())
    }

    /// Get stock counters for a product (read-only)
    pub fn get_stock(&self, product_id: &str) -> StorageResult<Option<StockLevels>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STOCK_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}
