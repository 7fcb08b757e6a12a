//! Repository Module
//!
//! CRUD access to the SurrealDB collaborator tables.

pub mod cart;
pub mod product;

pub use cart::CartRepository;
pub use product::ProductRepository;

use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: "table:key" strings everywhere outside the database
// =============================================================================
//
// surrealdb::RecordId handles all ids:
//   - parse:  let id: RecordId = "product:abc".parse()?;
//   - create: let id = RecordId::from_table_key("product", "abc");
//   - string: id.to_string() -> "product:abc"

/// Coerce a caller-supplied id (either "table:key" or a bare key) into a
/// RecordId of the given table
pub fn record_id(table: &str, id: &str) -> RecordId {
    match id.parse::<RecordId>() {
        Ok(rid) if rid.table() == table => rid,
        _ => RecordId::from_table_key(table, id),
    }
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
