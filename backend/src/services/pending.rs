//! Read-only pending views for a shop and series

use serde::Serialize;
use shared::{InTransitRow, Ledger, ManufacturingRow, Scope, TotalPendingRow};
use sqlx::PgPool;

use crate::error::AppResult;
use crate::services::catalog::CatalogService;
use crate::services::ledger_store::LedgerStore;

/// Pending view service
#[derive(Clone)]
pub struct PendingService {
    db: PgPool,
}

/// All three views computed from the same snapshot
#[derive(Debug, Serialize)]
pub struct PendingOverview {
    pub manufacturing: Vec<ManufacturingRow>,
    pub in_transit: Vec<InTransitRow>,
    pub total_pending: Vec<TotalPendingRow>,
}

impl PendingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Consistent read of one scope's ledger
    async fn snapshot(&self, scope: &Scope) -> AppResult<Ledger> {
        CatalogService::new(self.db.clone()).require_scope(scope).await?;

        let mut tx = self.db.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let ledger = LedgerStore::load(&mut tx, Some(scope)).await?;
        tx.commit().await?;
        Ok(ledger)
    }

    pub async fn manufacturing(&self, scope: &Scope) -> AppResult<Vec<ManufacturingRow>> {
        Ok(self.snapshot(scope).await?.manufacturing_view(scope))
    }

    pub async fn in_transit(&self, scope: &Scope) -> AppResult<Vec<InTransitRow>> {
        Ok(self.snapshot(scope).await?.in_transit_view(scope))
    }

    pub async fn total_pending(&self, scope: &Scope) -> AppResult<Vec<TotalPendingRow>> {
        Ok(self.snapshot(scope).await?.total_pending_view(scope))
    }

    pub async fn overview(&self, scope: &Scope) -> AppResult<PendingOverview> {
        let ledger = self.snapshot(scope).await?;
        Ok(PendingOverview {
            manufacturing: ledger.manufacturing_view(scope),
            in_transit: ledger.in_transit_view(scope),
            total_pending: ledger.total_pending_view(scope),
        })
    }
}
