//! Cart line model
//!
//! Owned by the cart subsystem; the order core only reads a user's selected
//! lines at checkout and deletes the checked-out lines once the order is
//! paid. A pending order does not empty the cart.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub user_id: i64,
    pub product: RecordId,
    pub quantity: u32,
    pub created_at: i64,
}

/// Payload for creating a cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineCreate {
    pub user_id: i64,
    pub product: RecordId,
    pub quantity: u32,
}
