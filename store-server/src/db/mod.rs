//! Database Module
//!
//! Embedded SurrealDB holding the collaborator data this service consumes:
//! the product catalog (price/title resolution at checkout) and the cart
//! (line selection, post-payment clearing). Order and stock state live in
//! the redb store, not here.

pub mod models;
pub mod repository;

use shared::error::AppError;
use surrealdb::engine::local::{Db, RocksDb};
use surrealdb::Surreal;

const NAMESPACE: &str = "store";
const DATABASE: &str = "main";

/// Database service, owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the database at the given path
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        tracing::info!(path = %db_path, "Database connection established");
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, AppError> {
        use surrealdb::engine::local::Mem;

        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;
        Ok(Self { db })
    }
}
