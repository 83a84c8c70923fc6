//! HTTP handlers for orders

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use shared::{NormalizationReport, Order};

use crate::error::AppResult;
use crate::handlers::ScopeQuery;
use crate::services::orders::{CreateOrderInput, OrderDetail, OrderService, ReplaceOrderInput};
use crate::AppState;

#[derive(Serialize)]
pub struct NextNumberResponse {
    pub next_number: String,
}

fn service(state: AppState) -> OrderService {
    OrderService::new(state.db, state.config.numbering.clone())
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<OrderDetail>)> {
    let order = service(state).create_order(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = service(state).list_orders(&query.into()).await?;
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    let order = service(state).get_order(&order_number).await?;
    Ok(Json(order))
}

pub async fn replace_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(input): Json<ReplaceOrderInput>,
) -> AppResult<Json<OrderDetail>> {
    let order = service(state).replace_order(&order_number, input).await?;
    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<StatusCode> {
    service(state).delete_order(&order_number).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn next_order_number(
    State(state): State<AppState>,
) -> AppResult<Json<NextNumberResponse>> {
    let next_number = service(state).next_order_number().await?;
    Ok(Json(NextNumberResponse { next_number }))
}

/// Repair lines whose pending quantity went negative after manual edits
pub async fn normalize_negatives(
    State(state): State<AppState>,
) -> AppResult<Json<NormalizationReport>> {
    let report = service(state).normalize_negatives().await?;
    Ok(Json(report))
}
