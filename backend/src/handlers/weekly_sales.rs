//! HTTP handlers for weekly sales sheets

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{ScopeFilter, WeeklySalesItem, WeeklySalesSheet};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::weekly_sales::{
    AddItemInput, OpenWeekInput, UpdateItemInput, WeeklySalesService,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SheetQuery {
    pub shop_id: Option<Uuid>,
    pub series_name: Option<String>,
    pub week_id: Option<String>,
}

pub async fn open_week(
    State(state): State<AppState>,
    Json(input): Json<OpenWeekInput>,
) -> AppResult<Json<WeeklySalesSheet>> {
    let service = WeeklySalesService::new(state.db);
    let sheet = service.open_week(input).await?;
    Ok(Json(sheet))
}

pub async fn list_sheets(
    State(state): State<AppState>,
    Query(query): Query<SheetQuery>,
) -> AppResult<Json<Vec<WeeklySalesSheet>>> {
    let filter = ScopeFilter {
        shop_id: query.shop_id,
        series_name: query.series_name,
    };
    let service = WeeklySalesService::new(state.db);
    let sheets = service
        .list_sheets(&filter, query.week_id.as_deref())
        .await?;
    Ok(Json(sheets))
}

pub async fn list_items(
    State(state): State<AppState>,
    Path(sheet_id): Path<Uuid>,
) -> AppResult<Json<Vec<WeeklySalesItem>>> {
    let service = WeeklySalesService::new(state.db);
    let items = service.list_items(sheet_id).await?;
    Ok(Json(items))
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(sheet_id): Path<Uuid>,
    Json(input): Json<AddItemInput>,
) -> AppResult<(StatusCode, Json<WeeklySalesItem>)> {
    let service = WeeklySalesService::new(state.db);
    let item = service.add_item(sheet_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((sheet_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<WeeklySalesItem>> {
    let service = WeeklySalesService::new(state.db);
    let item = service.update_item(sheet_id, item_id, input).await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path((sheet_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let service = WeeklySalesService::new(state.db);
    service.delete_item(sheet_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn close_week(
    State(state): State<AppState>,
    Path(sheet_id): Path<Uuid>,
) -> AppResult<Json<WeeklySalesSheet>> {
    let service = WeeklySalesService::new(state.db);
    let sheet = service.close_week(sheet_id).await?;
    Ok(Json(sheet))
}
