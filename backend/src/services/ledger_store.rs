//! Postgres persistence for the fulfillment ledger
//!
//! Every function takes the connection of an open transaction. Callers
//! lock what they are about to change, load a snapshot, run the shared
//! engine on it, and hand the resulting deltas back here to be written.

use chrono::NaiveDate;
use shared::{
    Allocation, BatchCompletion, Ledger, NormalizationReport, Order, OrderLine, OrderStatus,
    ReceiveBatch, ReceiveLine, Scope, StockDelta, StockOnHand,
};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, FromRow)]
pub(crate) struct OrderRow {
    order_number: String,
    shop_id: Uuid,
    series_name: String,
    order_date: NaiveDate,
    status: String,
    is_closed: bool,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> AppResult<Self> {
        let status = OrderStatus::parse(&row.status).ok_or_else(|| {
            AppError::Internal(format!(
                "Order {} has unknown status '{}'",
                row.order_number, row.status
            ))
        })?;
        Ok(Order {
            order_number: row.order_number,
            shop_id: row.shop_id,
            series_name: row.series_name,
            order_date: row.order_date,
            status,
            is_closed: row.is_closed,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct OrderLineRow {
    order_number: String,
    shop_id: Uuid,
    series_name: String,
    product_number: String,
    color: String,
    quantity: i64,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            order_number: row.order_number,
            shop_id: row.shop_id,
            series_name: row.series_name,
            product_number: row.product_number,
            color: row.color,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReceiveBatchRow {
    receive_number: String,
    shop_id: Uuid,
    series_name: String,
    dispatch_date: Option<NaiveDate>,
    estimated_arrival_date: Option<NaiveDate>,
    mode_of_transport: Option<String>,
    notes: Option<String>,
    is_completed: bool,
}

impl From<ReceiveBatchRow> for ReceiveBatch {
    fn from(row: ReceiveBatchRow) -> Self {
        ReceiveBatch {
            receive_number: row.receive_number,
            shop_id: row.shop_id,
            series_name: row.series_name,
            dispatch_date: row.dispatch_date,
            estimated_arrival_date: row.estimated_arrival_date,
            mode_of_transport: row.mode_of_transport,
            notes: row.notes,
            is_completed: row.is_completed,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReceiveLineRow {
    receive_number: String,
    order_number: Option<String>,
    product_number: String,
    color: String,
    quantity: i64,
    actual_arrival_date: Option<NaiveDate>,
}

impl From<ReceiveLineRow> for ReceiveLine {
    fn from(row: ReceiveLineRow) -> Self {
        ReceiveLine {
            receive_number: row.receive_number,
            order_number: row.order_number.filter(|o| !o.is_empty()),
            product_number: row.product_number,
            color: row.color,
            quantity: row.quantity,
            actual_arrival_date: row.actual_arrival_date,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AllocationRow {
    order_number: String,
    receive_number: String,
    product_number: String,
    color: String,
    quantity: i64,
}

impl From<AllocationRow> for Allocation {
    fn from(row: AllocationRow) -> Self {
        Allocation {
            order_number: row.order_number,
            receive_number: row.receive_number,
            product_number: row.product_number,
            color: row.color,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, FromRow)]
struct StockRow {
    shop_id: Uuid,
    series_name: String,
    product_number: String,
    color: String,
    stock_quantity: i64,
}

impl From<StockRow> for StockOnHand {
    fn from(row: StockRow) -> Self {
        StockOnHand {
            shop_id: row.shop_id,
            series_name: row.series_name,
            product_number: row.product_number,
            color: row.color,
            stock_quantity: row.stock_quantity,
        }
    }
}

pub(crate) const ORDER_COLUMNS: &str =
    "order_number, shop_id, series_name, order_date, status, is_closed";

pub(crate) const BATCH_COLUMNS: &str = "receive_number, shop_id, series_name, dispatch_date, \
     estimated_arrival_date, mode_of_transport, notes, is_completed";

/// Repository over the ledger tables
pub struct LedgerStore;

impl LedgerStore {
    /// Lock a receive batch row for the rest of the transaction
    pub async fn lock_batch(conn: &mut PgConnection, receive_number: &str) -> AppResult<ReceiveBatch> {
        let row = sqlx::query_as::<_, ReceiveBatchRow>(&format!(
            "SELECT {} FROM received_meta WHERE receive_number = $1 FOR UPDATE",
            BATCH_COLUMNS
        ))
        .bind(receive_number)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Receive batch {}", receive_number)))?;

        Ok(row.into())
    }

    /// Lock the order metadata rows of a scope (all orders when `None`)
    pub async fn lock_orders(conn: &mut PgConnection, scope: Option<&Scope>) -> AppResult<()> {
        let (shop_id, series_name) = scope_binds(scope);
        sqlx::query(
            r#"
            SELECT order_number FROM orders_meta
            WHERE ($1::uuid IS NULL OR shop_id = $1)
              AND ($2::text IS NULL OR series_name = $2)
            FOR UPDATE
            "#,
        )
        .bind(shop_id)
        .bind(series_name)
        .fetch_all(&mut *conn)
        .await?;

        Ok(())
    }

    /// Orders, order lines and their allocations
    pub async fn load_demand(conn: &mut PgConnection, scope: Option<&Scope>) -> AppResult<Ledger> {
        let (shop_id, series_name) = scope_binds(scope);

        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_number, shop_id, series_name, order_date, status, is_closed
            FROM orders_meta
            WHERE ($1::uuid IS NULL OR shop_id = $1)
              AND ($2::text IS NULL OR series_name = $2)
            ORDER BY id
            "#,
        )
        .bind(shop_id)
        .bind(series_name)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect::<AppResult<Vec<_>>>()?;

        let order_lines = sqlx::query_as::<_, OrderLineRow>(
            r#"
            SELECT order_number, shop_id, series_name, product_number, color, quantity
            FROM order_colors
            WHERE ($1::uuid IS NULL OR shop_id = $1)
              AND ($2::text IS NULL OR series_name = $2)
            ORDER BY id
            "#,
        )
        .bind(shop_id)
        .bind(series_name)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(OrderLine::from)
        .collect();

        let allocations = sqlx::query_as::<_, AllocationRow>(
            r#"
            SELECT oa.order_number, oa.receive_number, oa.product_number, oa.color, oa.quantity
            FROM order_allocations oa
            JOIN orders_meta om ON om.order_number = oa.order_number
            WHERE ($1::uuid IS NULL OR om.shop_id = $1)
              AND ($2::text IS NULL OR om.series_name = $2)
            ORDER BY oa.id
            "#,
        )
        .bind(shop_id)
        .bind(series_name)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Allocation::from)
        .collect();

        Ok(Ledger {
            orders,
            order_lines,
            allocations,
            ..Ledger::default()
        })
    }

    /// Lines of a single order
    pub async fn order_lines(conn: &mut PgConnection, order_number: &str) -> AppResult<Vec<OrderLine>> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r#"
            SELECT order_number, shop_id, series_name, product_number, color, quantity
            FROM order_colors WHERE order_number = $1 ORDER BY id
            "#,
        )
        .bind(order_number)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    /// Allocations recorded against a single order
    pub async fn order_allocations(
        conn: &mut PgConnection,
        order_number: &str,
    ) -> AppResult<Vec<Allocation>> {
        let rows = sqlx::query_as::<_, AllocationRow>(
            r#"
            SELECT order_number, receive_number, product_number, color, quantity
            FROM order_allocations WHERE order_number = $1 ORDER BY id
            "#,
        )
        .bind(order_number)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(Allocation::from).collect())
    }

    /// Full snapshot: demand plus receives and stock
    pub async fn load(conn: &mut PgConnection, scope: Option<&Scope>) -> AppResult<Ledger> {
        let mut ledger = Self::load_demand(conn, scope).await?;
        let (shop_id, series_name) = scope_binds(scope);

        ledger.batches = sqlx::query_as::<_, ReceiveBatchRow>(&format!(
            r#"
            SELECT {} FROM received_meta
            WHERE ($1::uuid IS NULL OR shop_id = $1)
              AND ($2::text IS NULL OR series_name = $2)
            ORDER BY receive_number
            "#,
            BATCH_COLUMNS
        ))
        .bind(shop_id)
        .bind(series_name)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(ReceiveBatch::from)
        .collect();

        ledger.receive_lines = sqlx::query_as::<_, ReceiveLineRow>(
            r#"
            SELECT rc.receive_number, rc.order_number, rc.product_number, rc.color,
                   rc.quantity, rc.actual_arrival_date
            FROM received_colors rc
            JOIN received_meta rm ON rm.receive_number = rc.receive_number
            WHERE ($1::uuid IS NULL OR rm.shop_id = $1)
              AND ($2::text IS NULL OR rm.series_name = $2)
            ORDER BY rc.id
            "#,
        )
        .bind(shop_id)
        .bind(series_name)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(ReceiveLine::from)
        .collect();

        ledger.stock = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT shop_id, series_name, product_number, color, stock_quantity
            FROM stock_on_hand
            WHERE ($1::uuid IS NULL OR shop_id = $1)
              AND ($2::text IS NULL OR series_name = $2)
            ORDER BY id
            "#,
        )
        .bind(shop_id)
        .bind(series_name)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(StockOnHand::from)
        .collect();

        Ok(ledger)
    }

    /// Write the result of `Ledger::complete_batch`
    pub async fn persist_completion(
        conn: &mut PgConnection,
        completion: &BatchCompletion,
    ) -> AppResult<()> {
        let flagged = sqlx::query(
            "UPDATE received_meta SET is_completed = TRUE WHERE receive_number = $1 AND is_completed = FALSE",
        )
        .bind(&completion.receive_number)
        .execute(&mut *conn)
        .await?;

        // The batch row is locked, so this only trips if the caller skipped the lock.
        if flagged.rows_affected() != 1 {
            return Err(AppError::InvalidStateTransition(format!(
                "Receive batch {} is already completed",
                completion.receive_number
            )));
        }

        sqlx::query(
            r#"
            UPDATE received_colors
            SET is_completed = TRUE, actual_arrival_date = $2
            WHERE receive_number = $1
            "#,
        )
        .bind(&completion.receive_number)
        .bind(completion.arrival_date)
        .execute(&mut *conn)
        .await?;

        for allocation in &completion.allocations {
            sqlx::query(
                r#"
                INSERT INTO order_allocations
                    (order_number, receive_number, product_number, color, quantity)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&allocation.order_number)
            .bind(&allocation.receive_number)
            .bind(&allocation.product_number)
            .bind(&allocation.color)
            .bind(allocation.quantity)
            .execute(&mut *conn)
            .await?;
        }

        if !completion.closed_orders.is_empty() {
            sqlx::query(
                r#"
                UPDATE orders_meta
                SET status = 'completed', is_closed = TRUE
                WHERE order_number = ANY($1)
                "#,
            )
            .bind(&completion.closed_orders)
            .execute(&mut *conn)
            .await?;
        }

        for delta in &completion.stock_increments {
            Self::apply_stock_delta(conn, delta).await?;
        }

        Ok(())
    }

    /// Write the result of `Ledger::normalize_negative_pending`
    pub async fn persist_normalization(
        conn: &mut PgConnection,
        report: &NormalizationReport,
    ) -> AppResult<()> {
        for line in &report.adjusted_lines {
            sqlx::query(
                r#"
                UPDATE order_colors
                SET quantity = $1
                WHERE order_number = $2 AND product_number = $3 AND LOWER(color) = LOWER($4)
                "#,
            )
            .bind(line.new_quantity)
            .bind(&line.order_number)
            .bind(&line.product_number)
            .bind(&line.color)
            .execute(&mut *conn)
            .await?;
        }

        for change in &report.status_changes {
            sqlx::query("UPDATE orders_meta SET status = $1, is_closed = $2 WHERE order_number = $3")
                .bind(change.status.as_str())
                .bind(change.is_closed)
                .bind(&change.order_number)
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }

    /// Add a signed delta to a stock row, creating it if needed
    pub async fn apply_stock_delta(conn: &mut PgConnection, delta: &StockDelta) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_on_hand (shop_id, series_name, product_number, color, stock_quantity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (shop_id, series_name, product_number, LOWER(color))
            DO UPDATE SET stock_quantity = stock_on_hand.stock_quantity + EXCLUDED.stock_quantity,
                          updated_at = NOW()
            "#,
        )
        .bind(delta.shop_id)
        .bind(&delta.series_name)
        .bind(&delta.product_number)
        .bind(&delta.color)
        .bind(delta.delta)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Current stock for one product/color, locking the row if it exists
    pub async fn lock_stock_quantity(
        conn: &mut PgConnection,
        scope: &Scope,
        product_number: &str,
        color: &str,
    ) -> AppResult<i64> {
        let quantity = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT stock_quantity FROM stock_on_hand
            WHERE shop_id = $1 AND series_name = $2
              AND product_number = $3 AND LOWER(color) = LOWER($4)
            FOR UPDATE
            "#,
        )
        .bind(scope.shop_id)
        .bind(&scope.series_name)
        .bind(product_number)
        .bind(color)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(quantity.unwrap_or(0))
    }
}

fn scope_binds(scope: Option<&Scope>) -> (Option<Uuid>, Option<&str>) {
    match scope {
        Some(s) => (Some(s.shop_id), Some(s.series_name.as_str())),
        None => (None, None),
    }
}
