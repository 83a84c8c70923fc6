//! Shops and product series

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{validate_color, Scope, Series, Shop};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{duplicate_on_conflict, AppError, AppResult};

/// Catalog service for shops and the series they order from
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Input for registering a shop
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShopInput {
    #[validate(length(min = 1, max = 64))]
    pub shop_number: String,
}

/// Input for defining a series
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSeriesInput {
    /// `None` creates a generic series visible to every shop
    pub shop_id: Option<Uuid>,
    #[validate(length(min = 1, max = 128))]
    pub series_name: String,
    #[validate(length(min = 1))]
    pub colors: Vec<String>,
    pub unit: Option<String>,
}

#[derive(Debug, FromRow)]
struct ShopRow {
    id: Uuid,
    shop_number: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<ShopRow> for Shop {
    fn from(row: ShopRow) -> Self {
        Shop {
            id: row.id,
            shop_number: row.shop_number,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SeriesRow {
    id: Uuid,
    shop_id: Option<Uuid>,
    series_name: String,
    colors: Vec<String>,
    unit: Option<String>,
    is_generic: bool,
    created_at: DateTime<Utc>,
}

impl From<SeriesRow> for Series {
    fn from(row: SeriesRow) -> Self {
        Series {
            id: row.id,
            shop_id: row.shop_id,
            series_name: row.series_name,
            colors: row.colors,
            unit: row.unit,
            is_generic: row.is_generic,
            created_at: row.created_at,
        }
    }
}

const SERIES_COLUMNS: &str = "id, shop_id, series_name, colors, unit, is_generic, created_at";

impl CatalogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_shop(&self, input: CreateShopInput) -> AppResult<Shop> {
        input.validate()?;

        let row = sqlx::query_as::<_, ShopRow>(
            r#"
            INSERT INTO shops (shop_number)
            VALUES ($1)
            RETURNING id, shop_number, is_active, created_at
            "#,
        )
        .bind(input.shop_number.trim())
        .fetch_one(&self.db)
        .await
        .map_err(|e| duplicate_on_conflict(e, "shop_number"))?;

        tracing::info!(shop_number = %row.shop_number, "Shop created");
        Ok(row.into())
    }

    pub async fn list_shops(&self) -> AppResult<Vec<Shop>> {
        let rows = sqlx::query_as::<_, ShopRow>(
            "SELECT id, shop_number, is_active, created_at FROM shops ORDER BY shop_number",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Shop::from).collect())
    }

    pub async fn get_shop(&self, shop_id: Uuid) -> AppResult<Shop> {
        sqlx::query_as::<_, ShopRow>(
            "SELECT id, shop_number, is_active, created_at FROM shops WHERE id = $1",
        )
        .bind(shop_id)
        .fetch_optional(&self.db)
        .await?
        .map(Shop::from)
        .ok_or_else(|| AppError::NotFound("Shop".to_string()))
    }

    pub async fn create_series(&self, input: CreateSeriesInput) -> AppResult<Series> {
        input.validate()?;
        for color in &input.colors {
            validate_color(color).map_err(|msg| AppError::invalid("colors", msg))?;
        }
        if let Some(shop_id) = input.shop_id {
            self.get_shop(shop_id).await?;
        }

        let colors: Vec<String> = input.colors.iter().map(|c| c.trim().to_string()).collect();
        let row = sqlx::query_as::<_, SeriesRow>(&format!(
            r#"
            INSERT INTO series (shop_id, series_name, colors, unit, is_generic)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            SERIES_COLUMNS
        ))
        .bind(input.shop_id)
        .bind(input.series_name.trim())
        .bind(&colors)
        .bind(&input.unit)
        .bind(input.shop_id.is_none())
        .fetch_one(&self.db)
        .await
        .map_err(|e| duplicate_on_conflict(e, "series_name"))?;

        tracing::info!(series = %row.series_name, generic = row.is_generic, "Series created");
        Ok(row.into())
    }

    /// All series, or those a shop can order from (its own plus generic ones)
    pub async fn list_series(&self, shop_id: Option<Uuid>) -> AppResult<Vec<Series>> {
        let rows = sqlx::query_as::<_, SeriesRow>(&format!(
            r#"
            SELECT {} FROM series
            WHERE $1::uuid IS NULL OR shop_id = $1 OR is_generic
            ORDER BY series_name
            "#,
            SERIES_COLUMNS
        ))
        .bind(shop_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Series::from).collect())
    }

    pub async fn get_series(&self, series_id: Uuid) -> AppResult<Series> {
        sqlx::query_as::<_, SeriesRow>(&format!(
            "SELECT {} FROM series WHERE id = $1",
            SERIES_COLUMNS
        ))
        .bind(series_id)
        .fetch_optional(&self.db)
        .await?
        .map(Series::from)
        .ok_or_else(|| AppError::NotFound("Series".to_string()))
    }

    /// Series a shop can order from by that name, after checking the shop exists
    async fn find_series(&self, shop_id: Uuid, series_name: &str) -> AppResult<Option<Series>> {
        self.get_shop(shop_id).await?;

        let series = sqlx::query_as::<_, SeriesRow>(&format!(
            r#"
            SELECT {} FROM series
            WHERE series_name = $2 AND (shop_id = $1 OR is_generic)
            ORDER BY is_generic
            LIMIT 1
            "#,
            SERIES_COLUMNS
        ))
        .bind(shop_id)
        .bind(series_name)
        .fetch_optional(&self.db)
        .await?
        .map(Series::from);

        Ok(series)
    }

    /// Resolve a series by name for a shop, rejecting ones it cannot order from
    pub async fn require_series(&self, shop_id: Uuid, series_name: &str) -> AppResult<Series> {
        self.find_series(shop_id, series_name)
            .await?
            .ok_or_else(|| AppError::invalid("series_name", "Series is not available to this shop"))
    }

    /// Resolve the shop and series a read is scoped to
    pub async fn require_scope(&self, scope: &Scope) -> AppResult<Series> {
        scope_series(self.find_series(scope.shop_id, &scope.series_name).await?)
    }
}

/// A scope naming a series the shop cannot see does not exist
fn scope_series(found: Option<Series>) -> AppResult<Series> {
    found.ok_or_else(|| AppError::NotFound("Series".to_string()))
}
