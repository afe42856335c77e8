//! Order header and line-item rows.

use chrono::{DateTime, Utc};
use meridian_core::{IdentityHash, OrderId, OrderItemId, OrderReference, OrderStatus};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// A persisted order header.
///
/// Contains no PII: the customer's contact address only exists as
/// `identity_hash`, and `order_reference` is random.
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_reference: OrderReference,
    pub identity_hash: IdentityHash,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// An order header about to be inserted. The id is storage-assigned.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_reference: OrderReference,
    pub identity_hash: IdentityHash,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A persisted line item.
///
/// Title and price are denormalized at purchase time and stay immutable even
/// if the catalog text later changes.
#[derive(Debug, Clone, FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub document_id: String,
    pub document_title: String,
    pub unit_price: Decimal,
    pub quantity: i64,
}
