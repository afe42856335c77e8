//! Checkout route handler: the order fulfillment pipeline.
//!
//! Stages run strictly in sequence for one request: validate, derive the
//! identity hash and order reference, issue signed links (all items, each
//! succeeding or falling back), persist the header then the items, notify.
//! The failure semantics are deliberately asymmetric and must stay that way:
//! a header insert failure aborts the checkout, an item insert failure does
//! not (the customer still gets their links email), and a notification
//! failure aborts even though the order is already persisted. "The customer
//! must get their documents" outranks bookkeeping consistency.

use axum::{Json, extract::State};
use chrono::{DateTime, Duration, Utc};
use meridian_core::{IdentityHash, OrderReference, OrderStatus};
use serde::Serialize;
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::links::{self, LINK_TTL_HOURS};
use crate::models::NewOrder;
use crate::state::AppState;
use crate::validation::{self, CheckoutForm};

/// Response for a completed checkout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub order_reference: OrderReference,
    pub expires_at: DateTime<Utc>,
}

/// Process a checkout submission.
///
/// POST /api/checkout
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<CheckoutForm>,
) -> Result<Json<CheckoutResponse>> {
    let request = validation::validate(form).map_err(AppError::Validation)?;

    let identity_hash = IdentityHash::of_email(&request.email);
    let order_reference = OrderReference::generate();
    let total = request.total();

    let created_at = Utc::now();
    let expires_at = created_at + Duration::hours(LINK_TTL_HOURS);

    // Every item gets a link (or an unavailable marker) before anything is
    // persisted.
    let links = links::issue_links(state.storage(), &request.items).await;

    let repo = OrderRepository::new(state.pool());

    // Header insert failure is fatal: without it there is no order
    // reference to report and no record to reconcile against.
    let order_id = repo
        .create_order(&NewOrder {
            order_reference: order_reference.clone(),
            identity_hash,
            total_amount: total,
            status: OrderStatus::Completed,
            created_at,
            expires_at,
        })
        .await?;

    // Item insert failure is NOT fatal. The header exists and the customer
    // must still receive their links; the missing line items are recovered
    // by reconciliation.
    if let Err(e) = repo.insert_items(order_id, &request.items).await {
        tracing::error!(
            order_reference = %order_reference,
            order_id = %order_id,
            error = %e,
            "Order items not recorded, continuing with delivery"
        );
    }

    // Notification failure is fatal even though the order is persisted: an
    // order the customer never heard about is the worse inconsistency, and
    // operators reconcile it from the logs.
    state
        .mailer()
        .send_order_confirmation(
            &request.name,
            &request.email,
            &order_reference,
            total,
            expires_at,
            &links,
        )
        .await?;

    tracing::info!(
        order_reference = %order_reference,
        items = request.items.len(),
        "Checkout completed"
    );

    Ok(Json(CheckoutResponse {
        success: true,
        order_reference,
        expires_at,
    }))
}
