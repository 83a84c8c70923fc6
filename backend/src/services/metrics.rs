//! Dashboard metrics

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::AppResult;

#[derive(Clone)]
pub struct MetricsService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingProduct {
    pub product_number: String,
    pub color: String,
    pub ordered: i64,
    pub allocated: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics {
    pub total_shops: i64,
    pub total_series: i64,
    pub total_orders: i64,
    pub total_ordered: i64,
    pub total_allocated: i64,
    pub total_pending: i64,
    pub completion_percentage: i64,
    pub top_pending_products: Vec<PendingProduct>,
}

#[derive(Debug, FromRow)]
struct TotalsRow {
    total_shops: i64,
    total_series: i64,
    total_orders: i64,
    total_ordered: i64,
    total_allocated: i64,
}

/// Allocated share of everything ordered, rounded to a whole percent
pub fn completion_percentage(ordered: i64, allocated: i64) -> i64 {
    if ordered <= 0 {
        return 0;
    }
    ((allocated as f64 / ordered as f64) * 100.0).round() as i64
}

impl MetricsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn dashboard(&self) -> AppResult<DashboardMetrics> {
        let totals = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM shops) AS total_shops,
                (SELECT COUNT(*) FROM series) AS total_series,
                (SELECT COUNT(*) FROM orders_meta) AS total_orders,
                (SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM order_colors) AS total_ordered,
                (SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM order_allocations) AS total_allocated
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let top_pending_products = sqlx::query_as::<_, PendingProduct>(
            r#"
            WITH allocated AS (
                SELECT order_number, product_number, LOWER(color) AS color_key,
                       SUM(quantity) AS quantity
                FROM order_allocations
                GROUP BY order_number, product_number, LOWER(color)
            )
            SELECT oc.product_number,
                   MIN(oc.color) AS color,
                   SUM(oc.quantity)::BIGINT AS ordered,
                   COALESCE(SUM(a.quantity), 0)::BIGINT AS allocated,
                   (SUM(oc.quantity) - COALESCE(SUM(a.quantity), 0))::BIGINT AS pending
            FROM order_colors oc
            LEFT JOIN allocated a
                ON a.order_number = oc.order_number
               AND a.product_number = oc.product_number
               AND a.color_key = LOWER(oc.color)
            GROUP BY oc.product_number, LOWER(oc.color)
            HAVING SUM(oc.quantity) - COALESCE(SUM(a.quantity), 0) > 0
            ORDER BY pending DESC, oc.product_number
            LIMIT 5
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(DashboardMetrics {
            total_shops: totals.total_shops,
            total_series: totals.total_series,
            total_orders: totals.total_orders,
            total_ordered: totals.total_ordered,
            total_allocated: totals.total_allocated,
            total_pending: totals.total_ordered - totals.total_allocated,
            completion_percentage: completion_percentage(
                totals.total_ordered,
                totals.total_allocated,
            ),
            top_pending_products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(10, 7), 70);
        assert_eq!(completion_percentage(3, 2), 67);
        assert_eq!(completion_percentage(10, 15), 150);
    }
}
