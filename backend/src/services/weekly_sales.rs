//! Weekly sales sheets and the stock movements they cause

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    apply_sale, validate_color, validate_product_number, validate_week_id, week_id, Scope,
    ScopeFilter, StockDelta, WeeklySalesItem, WeeklySalesSheet,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::catalog::CatalogService;
use crate::services::ledger_store::LedgerStore;

/// Weekly sales service
#[derive(Clone)]
pub struct WeeklySalesService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OpenWeekInput {
    pub shop_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub series_name: String,
    /// "YYYY-WW"; the current ISO week when omitted
    pub week_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemInput {
    #[validate(length(min = 1))]
    pub product_number: String,
    #[validate(length(min = 1))]
    pub color: String,
    #[validate(range(min = 1))]
    pub quantity: i64,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemInput {
    #[validate(range(min = 1))]
    pub quantity: Option<i64>,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, FromRow)]
struct SheetRow {
    id: Uuid,
    shop_id: Uuid,
    series_name: String,
    week_id: String,
    is_closed: bool,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl From<SheetRow> for WeeklySalesSheet {
    fn from(row: SheetRow) -> Self {
        WeeklySalesSheet {
            id: row.id,
            shop_id: row.shop_id,
            series_name: row.series_name,
            week_id: row.week_id,
            is_closed: row.is_closed,
            created_at: row.created_at,
            closed_at: row.closed_at,
        }
    }
}

fn sheet_scope(sheet: &WeeklySalesSheet) -> Scope {
    Scope::new(sheet.shop_id, sheet.series_name.clone())
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    sheet_id: Uuid,
    product_number: String,
    color: String,
    quantity: i64,
    unit_price: Decimal,
}

impl From<ItemRow> for WeeklySalesItem {
    fn from(row: ItemRow) -> Self {
        WeeklySalesItem {
            id: row.id,
            sheet_id: row.sheet_id,
            product_number: row.product_number,
            color: row.color,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

const SHEET_COLUMNS: &str = "id, shop_id, series_name, week_id, is_closed, created_at, closed_at";
const ITEM_COLUMNS: &str =
    "id, meta_id AS sheet_id, product_number, color, quantity, unit_price";

fn check_price(price: Decimal) -> AppResult<()> {
    if price.is_sign_negative() {
        return Err(AppError::invalid("unit_price", "Unit price cannot be negative"));
    }
    Ok(())
}

impl WeeklySalesService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Return the sheet for a shop/series/week, creating it on first use
    pub async fn open_week(&self, input: OpenWeekInput) -> AppResult<WeeklySalesSheet> {
        input.validate()?;

        let week = match input.week_id {
            Some(w) => {
                validate_week_id(w.trim()).map_err(|msg| AppError::invalid("week_id", msg))?;
                w.trim().to_string()
            }
            None => week_id(Utc::now().date_naive()),
        };
        let series = CatalogService::new(self.db.clone())
            .require_series(input.shop_id, input.series_name.trim())
            .await?;

        sqlx::query(
            r#"
            INSERT INTO weekly_sales_meta (shop_id, series_name, week_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (shop_id, series_name, week_id) DO NOTHING
            "#,
        )
        .bind(input.shop_id)
        .bind(&series.series_name)
        .bind(&week)
        .execute(&self.db)
        .await?;

        let sheet = sqlx::query_as::<_, SheetRow>(&format!(
            "SELECT {} FROM weekly_sales_meta WHERE shop_id = $1 AND series_name = $2 AND week_id = $3",
            SHEET_COLUMNS
        ))
        .bind(input.shop_id)
        .bind(&series.series_name)
        .bind(&week)
        .fetch_one(&self.db)
        .await?;

        Ok(sheet.into())
    }

    pub async fn list_sheets(
        &self,
        filter: &ScopeFilter,
        week: Option<&str>,
    ) -> AppResult<Vec<WeeklySalesSheet>> {
        let rows = sqlx::query_as::<_, SheetRow>(&format!(
            r#"
            SELECT {} FROM weekly_sales_meta
            WHERE ($1::uuid IS NULL OR shop_id = $1)
              AND ($2::text IS NULL OR series_name = $2)
              AND ($3::text IS NULL OR week_id = $3)
            ORDER BY week_id DESC, series_name
            "#,
            SHEET_COLUMNS
        ))
        .bind(filter.shop_id)
        .bind(filter.series_name.as_deref())
        .bind(week)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(WeeklySalesSheet::from).collect())
    }

    pub async fn list_items(&self, sheet_id: Uuid) -> AppResult<Vec<WeeklySalesItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM weekly_sales_items WHERE meta_id = $1 ORDER BY created_at",
            ITEM_COLUMNS
        ))
        .bind(sheet_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(WeeklySalesItem::from).collect())
    }

    /// Record a sale and take it out of stock
    pub async fn add_item(&self, sheet_id: Uuid, input: AddItemInput) -> AppResult<WeeklySalesItem> {
        input.validate()?;
        let product_number = input.product_number.trim();
        let color = input.color.trim();
        validate_product_number(product_number)
            .map_err(|msg| AppError::invalid("product_number", msg))?;
        validate_color(color).map_err(|msg| AppError::invalid("color", msg))?;
        check_price(input.unit_price)?;

        let mut tx = self.db.begin().await?;
        let sheet = lock_open_sheet(&mut tx, sheet_id).await?;
        let scope = sheet_scope(&sheet);

        let available =
            LedgerStore::lock_stock_quantity(&mut tx, &scope, product_number, color).await?;
        apply_sale(available, input.quantity)?;
        adjust_stock(&mut tx, &scope, product_number, color, -input.quantity).await?;

        let item = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO weekly_sales_items (meta_id, product_number, color, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(sheet_id)
        .bind(product_number)
        .bind(color)
        .bind(input.quantity)
        .bind(input.unit_price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            week_id = %sheet.week_id,
            product_number = %item.product_number,
            quantity = item.quantity,
            "Sale recorded"
        );
        Ok(item.into())
    }

    /// Change quantity and/or price; stock moves by the quantity difference
    pub async fn update_item(
        &self,
        sheet_id: Uuid,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> AppResult<WeeklySalesItem> {
        input.validate()?;
        if let Some(price) = input.unit_price {
            check_price(price)?;
        }

        let mut tx = self.db.begin().await?;
        let sheet = lock_open_sheet(&mut tx, sheet_id).await?;
        let scope = sheet_scope(&sheet);
        let current = lock_item(&mut tx, sheet_id, item_id).await?;

        let quantity = input.quantity.unwrap_or(current.quantity);
        let unit_price = input.unit_price.unwrap_or(current.unit_price);
        let delta = quantity - current.quantity;

        if delta != 0 {
            let available = LedgerStore::lock_stock_quantity(
                &mut tx,
                &scope,
                &current.product_number,
                &current.color,
            )
            .await?;
            apply_sale(available, delta)?;
            adjust_stock(&mut tx, &scope, &current.product_number, &current.color, -delta).await?;
        }

        let item = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE weekly_sales_items SET quantity = $2, unit_price = $3
            WHERE id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .bind(quantity)
        .bind(unit_price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(week_id = %sheet.week_id, item_id = %item_id, delta, "Sale updated");
        Ok(item.into())
    }

    /// Remove a sale and put its quantity back into stock
    pub async fn delete_item(&self, sheet_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let sheet = lock_open_sheet(&mut tx, sheet_id).await?;
        let scope = sheet_scope(&sheet);
        let current = lock_item(&mut tx, sheet_id, item_id).await?;

        adjust_stock(
            &mut tx,
            &scope,
            &current.product_number,
            &current.color,
            current.quantity,
        )
        .await?;

        sqlx::query("DELETE FROM weekly_sales_items WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(week_id = %sheet.week_id, item_id = %item_id, "Sale deleted");
        Ok(())
    }

    /// Close a week; no further changes are accepted afterwards
    pub async fn close_week(&self, sheet_id: Uuid) -> AppResult<WeeklySalesSheet> {
        let mut tx = self.db.begin().await?;
        let sheet = lock_open_sheet(&mut tx, sheet_id).await?;

        let closed = sqlx::query_as::<_, SheetRow>(&format!(
            r#"
            UPDATE weekly_sales_meta SET is_closed = TRUE, closed_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SHEET_COLUMNS
        ))
        .bind(sheet.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(week_id = %closed.week_id, series = %closed.series_name, "Week closed");
        Ok(closed.into())
    }
}

async fn lock_open_sheet(conn: &mut PgConnection, sheet_id: Uuid) -> AppResult<WeeklySalesSheet> {
    let sheet: WeeklySalesSheet = sqlx::query_as::<_, SheetRow>(&format!(
        "SELECT {} FROM weekly_sales_meta WHERE id = $1 FOR UPDATE",
        SHEET_COLUMNS
    ))
    .bind(sheet_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Weekly sales sheet".to_string()))?
    .into();

    if sheet.is_closed {
        return Err(AppError::WeekClosed(sheet.week_id));
    }
    Ok(sheet)
}

async fn lock_item(conn: &mut PgConnection, sheet_id: Uuid, item_id: Uuid) -> AppResult<ItemRow> {
    sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {} FROM weekly_sales_items WHERE id = $1 AND meta_id = $2 FOR UPDATE",
        ITEM_COLUMNS
    ))
    .bind(item_id)
    .bind(sheet_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Sales item".to_string()))
}

async fn adjust_stock(
    conn: &mut PgConnection,
    scope: &Scope,
    product_number: &str,
    color: &str,
    delta: i64,
) -> AppResult<()> {
    LedgerStore::apply_stock_delta(
        conn,
        &StockDelta {
            shop_id: scope.shop_id,
            series_name: scope.series_name.clone(),
            product_number: product_number.to_string(),
            color: color.to_string(),
            delta,
        },
    )
    .await
}
