//! Operator analytics route handler.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use crate::analytics::{AnalyticsSummary, compute_analytics};
use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::auth::RequireOperator;
use crate::state::AppState;

/// Aggregate order statistics for the admin view.
///
/// GET /api/analytics
///
/// Gated by the operator bearer token; everything served here is already
/// non-identifying because orders never store raw contact addresses.
#[instrument(skip_all)]
pub async fn summary(
    _: RequireOperator,
    State(state): State<AppState>,
) -> Result<Json<AnalyticsSummary>> {
    let repo = OrderRepository::new(state.pool());

    let orders = repo.list_orders(None).await?;
    let items = repo.list_items(None).await?;

    Ok(Json(compute_analytics(
        &orders,
        &items,
        Utc::now().date_naive(),
    )))
}
