//! Order placement, edits and the negative-pending repair

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    allocated_to, compare_order_numbers, next_order_number, validate_color,
    validate_product_number, NormalizationReport, Order, OrderLine, Scope, ScopeFilter,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::config::NumberingConfig;
use crate::error::{AppError, AppResult};
use crate::services::catalog::CatalogService;
use crate::services::ledger_store::{LedgerStore, OrderRow, ORDER_COLUMNS};

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
    numbering: NumberingConfig,
}

/// Quantities per color for one product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductQuantities {
    pub product_number: String,
    pub quantities: BTreeMap<String, i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub shop_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub series_name: String,
    pub order_date: Option<NaiveDate>,
    #[validate(length(min = 1))]
    pub products: Vec<ProductQuantities>,
}

/// Full replacement of an order's scope and lines
#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceOrderInput {
    pub shop_id: Uuid,
    pub series_id: Uuid,
    #[validate(length(min = 1))]
    pub products: Vec<ProductQuantities>,
}

/// One order line with its fulfillment so far
#[derive(Debug, Clone, Serialize)]
pub struct OrderLineView {
    pub product_number: String,
    pub color: String,
    pub quantity: i64,
    pub allocated: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLineView>,
}

/// Expand product/color quantity maps into order lines.
///
/// Non-positive quantities are skipped. Colors repeated with a different
/// case collapse into one line.
pub fn lines_from_products(
    order_number: &str,
    scope: &Scope,
    products: &[ProductQuantities],
) -> AppResult<Vec<OrderLine>> {
    let mut lines: Vec<OrderLine> = Vec::new();

    for product in products {
        let product_number = product.product_number.trim();
        validate_product_number(product_number)
            .map_err(|msg| AppError::invalid("product_number", msg))?;

        for (color, &quantity) in &product.quantities {
            if quantity <= 0 {
                continue;
            }
            let color = color.trim();
            validate_color(color).map_err(|msg| AppError::invalid("color", msg))?;

            if let Some(existing) = lines
                .iter_mut()
                .find(|l| l.matches(order_number, product_number, color))
            {
                existing.quantity += quantity;
                continue;
            }

            lines.push(OrderLine {
                order_number: order_number.to_string(),
                shop_id: scope.shop_id,
                series_name: scope.series_name.clone(),
                product_number: product_number.to_string(),
                color: color.to_string(),
                quantity,
            });
        }
    }

    if lines.is_empty() {
        return Err(AppError::invalid(
            "products",
            "Order needs at least one line with a positive quantity",
        ));
    }

    Ok(lines)
}

impl OrderService {
    pub fn new(db: PgPool, numbering: NumberingConfig) -> Self {
        Self { db, numbering }
    }

    /// Place a new order
    pub async fn create_order(&self, input: CreateOrderInput) -> AppResult<OrderDetail> {
        input.validate()?;

        let catalog = CatalogService::new(self.db.clone());
        let series = catalog
            .require_series(input.shop_id, input.series_name.trim())
            .await?;
        let scope = Scope::new(input.shop_id, series.series_name);
        let order_date = input.order_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;

        // Serialize number generation across concurrent creates.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('orders_meta.order_number'))")
            .execute(&mut *tx)
            .await?;

        let existing: Vec<String> = sqlx::query_scalar("SELECT order_number FROM orders_meta")
            .fetch_all(&mut *tx)
            .await?;
        let order_number = next_order_number(
            &self.numbering.order_prefix,
            existing.iter().map(String::as_str),
        );

        let lines = lines_from_products(&order_number, &scope, &input.products)?;

        sqlx::query(
            r#"
            INSERT INTO orders_meta (order_number, shop_id, series_name, order_date, status, is_closed)
            VALUES ($1, $2, $3, $4, 'pending', FALSE)
            "#,
        )
        .bind(&order_number)
        .bind(scope.shop_id)
        .bind(&scope.series_name)
        .bind(order_date)
        .execute(&mut *tx)
        .await?;

        insert_lines(&mut tx, &lines).await?;

        tx.commit().await?;

        tracing::info!(
            order_number = %order_number,
            lines = lines.len(),
            "Order created"
        );

        self.get_order(&order_number).await
    }

    /// Replace an order's shop, series and every line
    pub async fn replace_order(
        &self,
        order_number: &str,
        input: ReplaceOrderInput,
    ) -> AppResult<OrderDetail> {
        input.validate()?;

        let catalog = CatalogService::new(self.db.clone());
        catalog.get_shop(input.shop_id).await?;
        let series = catalog.get_series(input.series_id).await.map_err(|e| match e {
            AppError::NotFound(_) => AppError::invalid("series_id", "Unknown series"),
            other => other,
        })?;
        if !series.available_to(input.shop_id) {
            return Err(AppError::invalid(
                "series_id",
                "Series is not available to this shop",
            ));
        }

        let mut tx = self.db.begin().await?;

        let order_number: String = sqlx::query_scalar(
            "SELECT order_number FROM orders_meta WHERE LOWER(order_number) = LOWER($1) FOR UPDATE",
        )
        .bind(order_number.trim())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {}", order_number)))?;

        let scope = Scope::new(input.shop_id, series.series_name);
        let lines = lines_from_products(&order_number, &scope, &input.products)?;

        sqlx::query("UPDATE orders_meta SET shop_id = $1, series_name = $2 WHERE order_number = $3")
            .bind(scope.shop_id)
            .bind(&scope.series_name)
            .bind(&order_number)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM order_colors WHERE order_number = $1")
            .bind(&order_number)
            .execute(&mut *tx)
            .await?;

        insert_lines(&mut tx, &lines).await?;

        tx.commit().await?;

        tracing::info!(order_number = %order_number, lines = lines.len(), "Order replaced");

        self.get_order(&order_number).await
    }

    /// Delete an order with its lines and allocations
    pub async fn delete_order(&self, order_number: &str) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let order_number: String = sqlx::query_scalar(
            "SELECT order_number FROM orders_meta WHERE LOWER(order_number) = LOWER($1) FOR UPDATE",
        )
        .bind(order_number.trim())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {}", order_number)))?;

        let released = sqlx::query("DELETE FROM order_allocations WHERE order_number = $1")
            .bind(&order_number)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM order_colors WHERE order_number = $1")
            .bind(&order_number)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM orders_meta WHERE order_number = $1")
            .bind(&order_number)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(order_number = %order_number, allocations = released, "Order deleted");
        Ok(())
    }

    /// Order with per-line allocated and pending quantities
    pub async fn get_order(&self, order_number: &str) -> AppResult<OrderDetail> {
        let order: Order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders_meta WHERE LOWER(order_number) = LOWER($1)",
            ORDER_COLUMNS
        ))
        .bind(order_number.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {}", order_number)))?
        .try_into()?;

        let mut conn = self.db.acquire().await?;
        let lines = LedgerStore::order_lines(&mut conn, &order.order_number).await?;
        let allocations = LedgerStore::order_allocations(&mut conn, &order.order_number).await?;

        let lines = lines
            .into_iter()
            .map(|line| {
                let allocated = allocated_to(
                    &allocations,
                    &line.order_number,
                    &line.product_number,
                    &line.color,
                );
                OrderLineView {
                    pending: line.quantity - allocated,
                    allocated,
                    product_number: line.product_number,
                    color: line.color,
                    quantity: line.quantity,
                }
            })
            .collect();

        Ok(OrderDetail { order, lines })
    }

    /// Orders oldest first, optionally narrowed to a shop and/or series
    pub async fn list_orders(&self, filter: &ScopeFilter) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {} FROM orders_meta
            WHERE ($1::uuid IS NULL OR shop_id = $1)
              AND ($2::text IS NULL OR series_name = $2)
            "#,
            ORDER_COLUMNS
        ))
        .bind(filter.shop_id)
        .bind(filter.series_name.as_deref())
        .fetch_all(&self.db)
        .await?;

        let mut orders = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        orders.sort_by(|a, b| compare_order_numbers(&a.order_number, &b.order_number));
        Ok(orders)
    }

    /// The number the next created order would get
    pub async fn next_order_number(&self) -> AppResult<String> {
        let existing: Vec<String> = sqlx::query_scalar("SELECT order_number FROM orders_meta")
            .fetch_all(&self.db)
            .await?;
        Ok(next_order_number(
            &self.numbering.order_prefix,
            existing.iter().map(String::as_str),
        ))
    }

    /// Clamp negative pending quantities to zero and recompute statuses
    pub async fn normalize_negatives(&self) -> AppResult<NormalizationReport> {
        let mut tx = self.db.begin().await?;

        LedgerStore::lock_orders(&mut tx, None).await?;
        let mut ledger = LedgerStore::load_demand(&mut tx, None).await?;
        let report = ledger.normalize_negative_pending();

        if report.is_empty() {
            tx.commit().await?;
            return Ok(report);
        }

        LedgerStore::persist_normalization(&mut tx, &report).await?;
        tx.commit().await?;

        tracing::info!(
            lines = report.adjusted_lines.len(),
            orders = report.status_changes.len(),
            "Negative pending quantities normalized"
        );

        Ok(report)
    }
}

async fn insert_lines(conn: &mut PgConnection, lines: &[OrderLine]) -> AppResult<()> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO order_colors
                (order_number, shop_id, series_name, product_number, color, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&line.order_number)
        .bind(line.shop_id)
        .bind(&line.series_name)
        .bind(&line.product_number)
        .bind(&line.color)
        .bind(line.quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
