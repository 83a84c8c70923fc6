//! Receive batches and the completion trigger that runs allocation

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    next_receive_number, validate_color, validate_order_number, validate_product_number,
    validate_quantity, validate_receive_number, BatchCompletion, LedgerError, ReceiveBatch, ReceiveLine, Scope,
    ScopeFilter,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::config::NumberingConfig;
use crate::error::{duplicate_on_conflict, AppError, AppResult};
use crate::services::catalog::CatalogService;
use crate::services::ledger_store::{LedgerStore, ReceiveBatchRow, ReceiveLineRow, BATCH_COLUMNS};

/// Receiving service
#[derive(Clone)]
pub struct ReceivingService {
    db: PgPool,
    numbering: NumberingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveLineInput {
    /// Order the shipment was packed for, if any
    pub order_number: Option<String>,
    pub product_number: String,
    pub color: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReceiveInput {
    /// Generated from the configured prefix when omitted
    pub receive_number: Option<String>,
    pub shop_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub series_name: String,
    pub dispatch_date: Option<NaiveDate>,
    pub estimated_arrival_date: Option<NaiveDate>,
    pub mode_of_transport: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub lines: Vec<ReceiveLineInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceReceiveInput {
    pub dispatch_date: Option<NaiveDate>,
    pub estimated_arrival_date: Option<NaiveDate>,
    pub mode_of_transport: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub lines: Vec<ReceiveLineInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiveDetail {
    #[serde(flatten)]
    pub batch: ReceiveBatch,
    pub lines: Vec<ReceiveLine>,
}

/// Normalize and check line input before anything is written
fn build_lines(receive_number: &str, input: &[ReceiveLineInput]) -> AppResult<Vec<ReceiveLine>> {
    input
        .iter()
        .map(|line| {
            let product_number = line.product_number.trim();
            let color = line.color.trim();
            validate_product_number(product_number)
                .map_err(|msg| AppError::invalid("product_number", msg))?;
            validate_color(color).map_err(|msg| AppError::invalid("color", msg))?;
            validate_quantity(line.quantity).map_err(|msg| AppError::invalid("quantity", msg))?;

            let order_number = line
                .order_number
                .as_deref()
                .map(str::trim)
                .filter(|o| !o.is_empty());
            if let Some(order_number) = order_number {
                validate_order_number(order_number)
                    .map_err(|msg| AppError::invalid("order_number", msg))?;
            }

            Ok(ReceiveLine {
                receive_number: receive_number.to_string(),
                order_number: order_number.map(str::to_string),
                product_number: product_number.to_string(),
                color: color.to_string(),
                quantity: line.quantity,
                actual_arrival_date: None,
            })
        })
        .collect()
}

impl ReceivingService {
    pub fn new(db: PgPool, numbering: NumberingConfig) -> Self {
        Self { db, numbering }
    }

    /// Record a dispatched or announced batch
    pub async fn create_receive(&self, input: CreateReceiveInput) -> AppResult<ReceiveDetail> {
        input.validate()?;

        let series = CatalogService::new(self.db.clone())
            .require_series(input.shop_id, input.series_name.trim())
            .await?;
        let scope = Scope::new(input.shop_id, series.series_name);

        let receive_number = match input.receive_number.as_deref().map(str::trim) {
            Some(number) if !number.is_empty() => {
                validate_receive_number(number)
                    .map_err(|msg| AppError::invalid("receive_number", msg))?;
                number.to_string()
            }
            _ => self.next_receive_number().await?,
        };
        let lines = build_lines(&receive_number, &input.lines)?;

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO received_meta
                (receive_number, shop_id, series_name, dispatch_date,
                 estimated_arrival_date, mode_of_transport, notes, is_completed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE)
            "#,
        )
        .bind(&receive_number)
        .bind(scope.shop_id)
        .bind(&scope.series_name)
        .bind(input.dispatch_date)
        .bind(input.estimated_arrival_date)
        .bind(&input.mode_of_transport)
        .bind(&input.notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_on_conflict(e, "receive_number"))?;

        insert_lines(&mut tx, &scope, &lines).await?;

        tx.commit().await?;

        tracing::info!(
            receive_number = %receive_number,
            lines = lines.len(),
            dispatched = input.dispatch_date.is_some(),
            "Receive batch created"
        );

        self.get_receive(&receive_number).await
    }

    /// Replace the metadata and all lines of a batch that has not completed
    pub async fn replace_receive(
        &self,
        receive_number: &str,
        input: ReplaceReceiveInput,
    ) -> AppResult<ReceiveDetail> {
        input.validate()?;
        let lines = build_lines(receive_number, &input.lines)?;

        let mut tx = self.db.begin().await?;

        let batch = LedgerStore::lock_batch(&mut tx, receive_number).await?;
        if batch.is_completed {
            return Err(AppError::InvalidStateTransition(format!(
                "Receive batch {} is completed and can no longer be edited",
                receive_number
            )));
        }
        let scope = Scope::new(batch.shop_id, batch.series_name);

        sqlx::query(
            r#"
            UPDATE received_meta
            SET dispatch_date = $2, estimated_arrival_date = $3,
                mode_of_transport = $4, notes = $5
            WHERE receive_number = $1
            "#,
        )
        .bind(receive_number)
        .bind(input.dispatch_date)
        .bind(input.estimated_arrival_date)
        .bind(&input.mode_of_transport)
        .bind(&input.notes)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM received_colors WHERE receive_number = $1")
            .bind(receive_number)
            .execute(&mut *tx)
            .await?;

        insert_lines(&mut tx, &scope, &lines).await?;

        tx.commit().await?;

        tracing::info!(receive_number = %receive_number, lines = lines.len(), "Receive batch replaced");

        self.get_receive(receive_number).await
    }

    /// Mark a batch received and allocate it against open orders.
    ///
    /// Allocation rows, order closures, arrival dates, the completion flag
    /// and stock increments are written in one transaction.
    pub async fn mark_completed(&self, receive_number: &str) -> AppResult<BatchCompletion> {
        let mut tx = self.db.begin().await?;

        let batch = LedgerStore::lock_batch(&mut tx, receive_number).await?;
        if batch.is_completed {
            return Err(LedgerError::BatchAlreadyCompleted(batch.receive_number).into());
        }

        let scope = Scope::new(batch.shop_id, batch.series_name.clone());
        LedgerStore::lock_orders(&mut tx, Some(&scope)).await?;

        let mut ledger = LedgerStore::load(&mut tx, Some(&scope)).await?;
        let completion = ledger.complete_batch(&batch.receive_number, Utc::now().date_naive())?;

        LedgerStore::persist_completion(&mut tx, &completion).await?;
        tx.commit().await?;

        for row in &completion.overflow {
            tracing::warn!(
                receive_number = %completion.receive_number,
                order_number = %row.order_number,
                product_number = %row.product_number,
                color = %row.color,
                quantity = row.quantity,
                "Over-delivery assigned to last open order"
            );
        }
        for surplus in &completion.dropped {
            tracing::warn!(
                receive_number = %completion.receive_number,
                product_number = %surplus.product_number,
                color = %surplus.color,
                quantity = surplus.quantity,
                "Received quantity had no matching order line"
            );
        }

        tracing::info!(
            receive_number = %completion.receive_number,
            allocated = completion.allocated_quantity(),
            allocation_rows = completion.allocations.len(),
            closed_orders = completion.closed_orders.len(),
            "Receive batch completed"
        );

        Ok(completion)
    }

    pub async fn get_receive(&self, receive_number: &str) -> AppResult<ReceiveDetail> {
        let batch: ReceiveBatch = sqlx::query_as::<_, ReceiveBatchRow>(&format!(
            "SELECT {} FROM received_meta WHERE receive_number = $1",
            BATCH_COLUMNS
        ))
        .bind(receive_number)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Receive batch {}", receive_number)))?
        .into();

        let lines = sqlx::query_as::<_, ReceiveLineRow>(
            r#"
            SELECT receive_number, order_number, product_number, color, quantity, actual_arrival_date
            FROM received_colors WHERE receive_number = $1 ORDER BY id
            "#,
        )
        .bind(receive_number)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(ReceiveLine::from)
        .collect();

        Ok(ReceiveDetail { batch, lines })
    }

    /// Batches with their lines, newest number first
    pub async fn list_receives(&self, filter: &ScopeFilter) -> AppResult<Vec<ReceiveDetail>> {
        let batches = sqlx::query_as::<_, ReceiveBatchRow>(&format!(
            r#"
            SELECT {} FROM received_meta
            WHERE ($1::uuid IS NULL OR shop_id = $1)
              AND ($2::text IS NULL OR series_name = $2)
            ORDER BY receive_number DESC
            "#,
            BATCH_COLUMNS
        ))
        .bind(filter.shop_id)
        .bind(filter.series_name.as_deref())
        .fetch_all(&self.db)
        .await?;

        let lines: Vec<ReceiveLine> = sqlx::query_as::<_, ReceiveLineRow>(
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
        .bind(filter.shop_id)
        .bind(filter.series_name.as_deref())
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(ReceiveLine::from)
        .collect();

        Ok(batches
            .into_iter()
            .map(|row| {
                let batch = ReceiveBatch::from(row);
                let lines = lines
                    .iter()
                    .filter(|l| l.receive_number == batch.receive_number)
                    .cloned()
                    .collect();
                ReceiveDetail { batch, lines }
            })
            .collect())
    }

    pub async fn next_receive_number(&self) -> AppResult<String> {
        let last: Option<String> = sqlx::query_scalar(
            r#"
            SELECT receive_number FROM received_meta
            ORDER BY LENGTH(receive_number) DESC, receive_number DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.db)
        .await?;

        Ok(next_receive_number(&self.numbering.receive_prefix, last.as_deref())?)
    }
}

async fn insert_lines(conn: &mut PgConnection, scope: &Scope, lines: &[ReceiveLine]) -> AppResult<()> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO received_colors
                (receive_number, order_number, shop_id, series_name, product_number, color, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&line.receive_number)
        .bind(&line.order_number)
        .bind(scope.shop_id)
        .bind(&scope.series_name)
        .bind(&line.product_number)
        .bind(&line.color)
        .bind(line.quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
