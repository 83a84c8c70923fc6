//! HTTP handlers for shops and series

use axum::{
    extract::{Path, State},
    Json,
};
use shared::{Series, Shop};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::catalog::{CatalogService, CreateSeriesInput, CreateShopInput};
use crate::AppState;

pub async fn create_shop(
    State(state): State<AppState>,
    Json(input): Json<CreateShopInput>,
) -> AppResult<Json<Shop>> {
    let service = CatalogService::new(state.db);
    let shop = service.create_shop(input).await?;
    Ok(Json(shop))
}

pub async fn list_shops(State(state): State<AppState>) -> AppResult<Json<Vec<Shop>>> {
    let service = CatalogService::new(state.db);
    let shops = service.list_shops().await?;
    Ok(Json(shops))
}

pub async fn get_shop(
    State(state): State<AppState>,
    Path(shop_id): Path<Uuid>,
) -> AppResult<Json<Shop>> {
    let service = CatalogService::new(state.db);
    let shop = service.get_shop(shop_id).await?;
    Ok(Json(shop))
}

pub async fn create_series(
    State(state): State<AppState>,
    Json(input): Json<CreateSeriesInput>,
) -> AppResult<Json<Series>> {
    let service = CatalogService::new(state.db);
    let series = service.create_series(input).await?;
    Ok(Json(series))
}

pub async fn list_series(State(state): State<AppState>) -> AppResult<Json<Vec<Series>>> {
    let service = CatalogService::new(state.db);
    let series = service.list_series(None).await?;
    Ok(Json(series))
}

/// Series a shop can order from
pub async fn list_shop_series(
    State(state): State<AppState>,
    Path(shop_id): Path<Uuid>,
) -> AppResult<Json<Vec<Series>>> {
    let service = CatalogService::new(state.db);
    service.get_shop(shop_id).await?;
    let series = service.list_series(Some(shop_id)).await?;
    Ok(Json(series))
}
