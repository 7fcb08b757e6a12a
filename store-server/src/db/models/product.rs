//! Product catalog model
//!
//! Consumed read-only by the order core: checkout resolves a product to its
//! current title and price for the order-line snapshot. Price changes after
//! checkout never touch existing orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub title: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    pub created_at: i64,
}

/// Payload for creating a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub title: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}
