//! Catalog route handler.

use axum::Json;

use crate::catalog::{CatalogListing, listings};

/// The purchasable document bundles.
///
/// GET /api/catalog
///
/// Read-only: this is the marketing site's product data source, and the
/// authoritative whitelist behind checkout validation. Nothing a client
/// sends can change it.
pub async fn list() -> Json<Vec<CatalogListing>> {
    Json(listings())
}
