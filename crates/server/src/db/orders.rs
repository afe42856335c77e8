//! Order repository.
//!
//! Write side serves the fulfillment pipeline (insert-only); read side
//! serves the analytics aggregator (recency-bounded scans). There are no
//! UPDATE or DELETE operations on this surface.

use chrono::{DateTime, Utc};
use meridian_core::OrderId;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderItem};
use crate::validation::CartItem;

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert the order header and return the storage-assigned id.
    ///
    /// The header must exist before items are inserted, because items
    /// reference the generated id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order reference collides
    /// with an existing one (the uniqueness guarantee lives here, not in the
    /// generator). Returns `RepositoryError::Database` for other failures;
    /// the caller treats any header failure as fatal to the checkout.
    pub async fn create_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let (id,): (OrderId,) = sqlx::query_as(
            r"
            INSERT INTO orders
                (order_reference, identity_hash, total_amount, status, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&order.order_reference)
        .bind(&order.identity_hash)
        .bind(order.total_amount)
        .bind(order.status)
        .bind(order.created_at)
        .bind(order.expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Insert the line items for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails. The caller
    /// logs and continues: a header without items is a reconciliation task,
    /// not a failed checkout.
    pub async fn insert_items(
        &self,
        order_id: OrderId,
        items: &[CartItem],
    ) -> Result<(), RepositoryError> {
        for item in items {
            sqlx::query(
                r"
                INSERT INTO order_items
                    (order_id, document_id, document_title, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order_id)
            .bind(&item.id)
            .bind(&item.title)
            .bind(item.unit_price)
            .bind(i64::from(item.quantity))
            .execute(self.pool)
            .await?;
        }

        Ok(())
    }

    /// List order headers, newest first, optionally bounded by recency.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_orders(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = match since {
            Some(cutoff) => {
                sqlx::query_as::<_, Order>(
                    r"
                    SELECT id, order_reference, identity_hash, total_amount,
                           status, created_at, expires_at
                    FROM orders
                    WHERE created_at >= $1
                    ORDER BY created_at DESC
                    ",
                )
                .bind(cutoff)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Order>(
                    r"
                    SELECT id, order_reference, identity_hash, total_amount,
                           status, created_at, expires_at
                    FROM orders
                    ORDER BY created_at DESC
                    ",
                )
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(orders)
    }

    /// List line items in insertion order, optionally bounded by the owning
    /// order's recency.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_items(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = match since {
            Some(cutoff) => {
                sqlx::query_as::<_, OrderItem>(
                    r"
                    SELECT oi.id, oi.order_id, oi.document_id, oi.document_title,
                           oi.unit_price, oi.quantity
                    FROM order_items oi
                    JOIN orders o ON o.id = oi.order_id
                    WHERE o.created_at >= $1
                    ORDER BY oi.id
                    ",
                )
                .bind(cutoff)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderItem>(
                    r"
                    SELECT id, order_id, document_id, document_title,
                           unit_price, quantity
                    FROM order_items
                    ORDER BY id
                    ",
                )
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(items)
    }
}
