//! Stock on hand

use serde::Serialize;
use shared::ScopeFilter;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Stock row joined with its shop and series
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockEntry {
    pub shop_id: Uuid,
    pub shop_number: String,
    pub series_id: Option<Uuid>,
    pub series_name: String,
    pub product_number: String,
    pub color: String,
    pub stock_on_hand: i64,
}

impl StockService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stock levels, optionally narrowed to a shop and/or series
    pub async fn list_stock(&self, filter: &ScopeFilter) -> AppResult<Vec<StockEntry>> {
        let entries = sqlx::query_as::<_, StockEntry>(
            r#"
            SELECT s.shop_id, sh.shop_number, se.id AS series_id, s.series_name,
                   s.product_number, s.color, s.stock_quantity AS stock_on_hand
            FROM stock_on_hand s
            JOIN shops sh ON sh.id = s.shop_id
            LEFT JOIN LATERAL (
                SELECT id FROM series
                WHERE series_name = s.series_name AND (shop_id = s.shop_id OR is_generic)
                ORDER BY is_generic
                LIMIT 1
            ) se ON TRUE
            WHERE ($1::uuid IS NULL OR s.shop_id = $1)
              AND ($2::text IS NULL OR s.series_name = $2)
            ORDER BY sh.shop_number, s.series_name, s.product_number, s.color
            "#,
        )
        .bind(filter.shop_id)
        .bind(filter.series_name.as_deref())
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}
