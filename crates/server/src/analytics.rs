//! Analytics aggregation over persisted orders.
//!
//! A pure read-and-fold: the handler fetches orders and line items, this
//! module reduces them. No PII can leak here because orders never store raw
//! addresses in the first place.

use chrono::{Days, NaiveDate};
use meridian_core::{OrderReference, OrderStatus};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Order, OrderItem};

/// Width of the orders-over-time series, in days.
pub const TIME_SERIES_DAYS: u64 = 30;

/// Number of entries in the popularity ranking.
pub const POPULAR_DOCUMENTS_LIMIT: usize = 5;

/// Number of orders in the recent-orders list.
pub const RECENT_ORDERS_LIMIT: usize = 10;

/// The aggregate structure served to the operator view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_orders: usize,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    pub popular_documents: Vec<PopularDocument>,
    pub recent_orders: Vec<RecentOrder>,
    pub orders_over_time: Vec<DailyBucket>,
}

/// A document ranked by units sold across all orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularDocument {
    pub document_id: String,
    pub title: String,
    pub units_sold: i64,
}

/// A recent order, reduced to its non-identifying fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub order_reference: OrderReference,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One day of the orders-over-time series.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub count: u64,
    pub revenue: Decimal,
}

/// Fold persisted orders and line items into the operator summary.
///
/// The time series always has one bucket per day in the trailing
/// [`TIME_SERIES_DAYS`]-day range ending at `today` (inclusive), zeroed
/// where no orders fall, regardless of data sparsity. Document popularity
/// ranks by summed quantity; ties keep first-appearance order.
#[must_use]
pub fn compute_analytics(orders: &[Order], items: &[OrderItem], today: NaiveDate) -> AnalyticsSummary {
    let total_orders = orders.len();
    let total_revenue: Decimal = orders.iter().map(|o| o.total_amount).sum();

    let average_order_value = if total_orders == 0 {
        Decimal::ZERO
    } else {
        (total_revenue / Decimal::from(total_orders)).round_dp(2)
    };

    AnalyticsSummary {
        total_orders,
        total_revenue,
        average_order_value,
        popular_documents: popular_documents(items),
        recent_orders: recent_orders(orders),
        orders_over_time: orders_over_time(orders, today),
    }
}

/// Rank documents by total units sold, first-seen order breaking ties.
fn popular_documents(items: &[OrderItem]) -> Vec<PopularDocument> {
    let mut ranking: Vec<PopularDocument> = Vec::new();

    for item in items {
        match ranking
            .iter_mut()
            .find(|doc| doc.document_id == item.document_id)
        {
            Some(doc) => doc.units_sold += item.quantity,
            None => ranking.push(PopularDocument {
                document_id: item.document_id.clone(),
                title: item.document_title.clone(),
                units_sold: item.quantity,
            }),
        }
    }

    // Stable sort keeps first-appearance order for equal counts.
    ranking.sort_by(|a, b| b.units_sold.cmp(&a.units_sold));
    ranking.truncate(POPULAR_DOCUMENTS_LIMIT);
    ranking
}

/// The newest orders, reduced to non-identifying fields.
fn recent_orders(orders: &[Order]) -> Vec<RecentOrder> {
    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    sorted
        .into_iter()
        .take(RECENT_ORDERS_LIMIT)
        .map(|order| RecentOrder {
            order_reference: order.order_reference.clone(),
            total_amount: order.total_amount,
            status: order.status,
            created_at: order.created_at,
        })
        .collect()
}

/// Daily buckets for the trailing window, pre-initialized to zero.
fn orders_over_time(orders: &[Order], today: NaiveDate) -> Vec<DailyBucket> {
    let mut buckets: Vec<DailyBucket> = (0..TIME_SERIES_DAYS)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| DailyBucket {
            date,
            count: 0,
            revenue: Decimal::ZERO,
        })
        .collect();

    let Some(first_day) = buckets.first().map(|b| b.date) else {
        return buckets;
    };

    for order in orders {
        let day = order.created_at.date_naive();
        if day < first_day || day > today {
            continue;
        }

        if let Some(bucket) = buckets.iter_mut().find(|b| b.date == day) {
            bucket.count += 1;
            bucket.revenue += order.total_amount;
        }
    }

    buckets
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use meridian_core::{IdentityHash, OrderId, OrderItemId};

    use super::*;

    fn order(id: i64, day: &str, total: i64) -> Order {
        let created_at = Utc
            .from_utc_datetime(&format!("{day}T10:00:00").parse().unwrap());
        Order {
            id: OrderId::new(id),
            order_reference: OrderReference::generate(),
            identity_hash: IdentityHash::of("customer@example.com"),
            total_amount: Decimal::from(total),
            status: OrderStatus::Completed,
            created_at,
            expires_at: created_at + chrono::Duration::hours(48),
        }
    }

    fn item(id: i64, order_id: i64, document_id: &str, quantity: i64) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(id),
            order_id: OrderId::new(order_id),
            document_id: document_id.to_string(),
            document_title: document_id.to_uppercase(),
            unit_price: Decimal::from(100),
            quantity,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    #[test]
    fn test_zero_orders_zero_everything() {
        let summary = compute_analytics(&[], &[], today());

        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.total_revenue, Decimal::ZERO);
        assert_eq!(summary.average_order_value, Decimal::ZERO);
        assert!(summary.popular_documents.is_empty());
        assert!(summary.recent_orders.is_empty());

        // The series still has one zeroed entry per day in range.
        assert_eq!(summary.orders_over_time.len(), 30);
        assert!(
            summary
                .orders_over_time
                .iter()
                .all(|b| b.count == 0 && b.revenue == Decimal::ZERO)
        );
    }

    #[test]
    fn test_totals_and_average() {
        let orders = vec![
            order(1, "2026-08-05", 500),
            order(2, "2026-08-05", 350),
            order(3, "2026-08-06", 150),
        ];

        let summary = compute_analytics(&orders, &[], today());

        assert_eq!(summary.total_orders, 3);
        assert_eq!(summary.total_revenue, Decimal::from(1000));
        assert_eq!(summary.average_order_value, Decimal::new(33_333, 2));
    }

    #[test]
    fn test_popularity_ranked_by_units() {
        let items = vec![
            item(1, 1, "gdpr-readiness", 1),
            item(2, 1, "soc2-policy-pack", 3),
            item(3, 2, "gdpr-readiness", 1),
            item(4, 3, "hipaa-essentials", 1),
        ];

        let summary = compute_analytics(&[], &items, today());
        let ids: Vec<&str> = summary
            .popular_documents
            .iter()
            .map(|d| d.document_id.as_str())
            .collect();

        assert_eq!(ids, ["soc2-policy-pack", "gdpr-readiness", "hipaa-essentials"]);
        assert_eq!(summary.popular_documents[0].units_sold, 3);
        assert_eq!(summary.popular_documents[1].units_sold, 2);
    }

    #[test]
    fn test_popularity_ties_keep_first_seen_order() {
        let items = vec![
            item(1, 1, "privacy-impact-kit", 2),
            item(2, 1, "vendor-dd-checklist", 2),
        ];

        let summary = compute_analytics(&[], &items, today());
        let ids: Vec<&str> = summary
            .popular_documents
            .iter()
            .map(|d| d.document_id.as_str())
            .collect();

        assert_eq!(ids, ["privacy-impact-kit", "vendor-dd-checklist"]);
    }

    #[test]
    fn test_popularity_truncated_to_limit() {
        let items: Vec<OrderItem> = (0..8)
            .map(|i| item(i, 1, &format!("doc-{i}"), 1))
            .collect();

        let summary = compute_analytics(&[], &items, today());
        assert_eq!(summary.popular_documents.len(), POPULAR_DOCUMENTS_LIMIT);
    }

    #[test]
    fn test_recent_orders_newest_first_and_capped() {
        let orders: Vec<Order> = (1..=12)
            .map(|i| order(i, &format!("2026-07-{:02}", i + 10), 100))
            .collect();

        let summary = compute_analytics(&orders, &[], today());

        assert_eq!(summary.recent_orders.len(), RECENT_ORDERS_LIMIT);
        let first = summary.recent_orders.first().unwrap();
        let last = summary.recent_orders.last().unwrap();
        assert!(first.created_at > last.created_at);
    }

    #[test]
    fn test_time_series_buckets_orders_by_day() {
        let orders = vec![
            order(1, "2026-08-05", 500),
            order(2, "2026-08-05", 350),
            order(3, "2026-08-06", 150),
            // Outside the trailing window: ignored by the series.
            order(4, "2026-01-01", 999),
        ];

        let summary = compute_analytics(&orders, &[], today());
        let series = &summary.orders_over_time;

        assert_eq!(series.len(), 30);
        assert_eq!(series.last().unwrap().date, today());
        assert_eq!(series.last().unwrap().count, 1);
        assert_eq!(series.last().unwrap().revenue, Decimal::from(150));

        let yesterday = &series[28];
        assert_eq!(yesterday.count, 2);
        assert_eq!(yesterday.revenue, Decimal::from(850));

        // The out-of-window order still counts toward totals.
        assert_eq!(summary.total_orders, 4);
    }

    #[test]
    fn test_series_is_contiguous_ascending() {
        let summary = compute_analytics(&[], &[], today());
        let dates: Vec<NaiveDate> = summary.orders_over_time.iter().map(|b| b.date).collect();

        for pair in dates.windows(2) {
            assert_eq!(pair[1], pair[0].succ_opt().unwrap());
        }
    }
}
