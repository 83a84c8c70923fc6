//! HTTP handlers for stock on hand

use axum::{
    extract::{Path, State},
    Json,
};
use shared::ScopeFilter;

use crate::error::{AppError, AppResult};
use crate::services::stock::{StockEntry, StockService};
use crate::AppState;

/// Stock for a shop and series; either segment may be "all"
pub async fn list_stock(
    State(state): State<AppState>,
    Path((shop, series)): Path<(String, String)>,
) -> AppResult<Json<Vec<StockEntry>>> {
    let filter =
        ScopeFilter::from_segments(&shop, &series).map_err(|msg| AppError::invalid("shop_id", msg))?;
    let service = StockService::new(state.db);
    let entries = service.list_stock(&filter).await?;
    Ok(Json(entries))
}
