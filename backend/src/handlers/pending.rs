//! HTTP handlers for the pending views

use axum::{
    extract::{Path, State},
    Json,
};
use shared::{InTransitRow, ManufacturingRow, Scope, TotalPendingRow};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::pending::{PendingOverview, PendingService};
use crate::AppState;

pub async fn pending_overview(
    State(state): State<AppState>,
    Path((shop_id, series_name)): Path<(Uuid, String)>,
) -> AppResult<Json<PendingOverview>> {
    let service = PendingService::new(state.db);
    let overview = service.overview(&Scope::new(shop_id, series_name)).await?;
    Ok(Json(overview))
}

/// Ordered quantity not yet dispatched from the factory
pub async fn manufacturing_pending(
    State(state): State<AppState>,
    Path((shop_id, series_name)): Path<(Uuid, String)>,
) -> AppResult<Json<Vec<ManufacturingRow>>> {
    let service = PendingService::new(state.db);
    let rows = service
        .manufacturing(&Scope::new(shop_id, series_name))
        .await?;
    Ok(Json(rows))
}

/// Dispatched batches awaiting arrival
pub async fn in_transit(
    State(state): State<AppState>,
    Path((shop_id, series_name)): Path<(Uuid, String)>,
) -> AppResult<Json<Vec<InTransitRow>>> {
    let service = PendingService::new(state.db);
    let rows = service.in_transit(&Scope::new(shop_id, series_name)).await?;
    Ok(Json(rows))
}

/// Ordered minus allocated, negatives included
pub async fn total_pending(
    State(state): State<AppState>,
    Path((shop_id, series_name)): Path<(Uuid, String)>,
) -> AppResult<Json<Vec<TotalPendingRow>>> {
    let service = PendingService::new(state.db);
    let rows = service
        .total_pending(&Scope::new(shop_id, series_name))
        .await?;
    Ok(Json(rows))
}
