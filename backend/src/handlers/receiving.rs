//! HTTP handlers for receive batches

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::BatchCompletion;

use crate::error::AppResult;
use crate::handlers::{NextNumberResponse, ScopeQuery};
use crate::services::receiving::{
    CreateReceiveInput, ReceiveDetail, ReceivingService, ReplaceReceiveInput,
};
use crate::AppState;

fn service(state: AppState) -> ReceivingService {
    ReceivingService::new(state.db, state.config.numbering.clone())
}

pub async fn create_receive(
    State(state): State<AppState>,
    Json(input): Json<CreateReceiveInput>,
) -> AppResult<(StatusCode, Json<ReceiveDetail>)> {
    let receive = service(state).create_receive(input).await?;
    Ok((StatusCode::CREATED, Json(receive)))
}

pub async fn list_receives(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<Vec<ReceiveDetail>>> {
    let receives = service(state).list_receives(&query.into()).await?;
    Ok(Json(receives))
}

pub async fn get_receive(
    State(state): State<AppState>,
    Path(receive_number): Path<String>,
) -> AppResult<Json<ReceiveDetail>> {
    let receive = service(state).get_receive(&receive_number).await?;
    Ok(Json(receive))
}

pub async fn replace_receive(
    State(state): State<AppState>,
    Path(receive_number): Path<String>,
    Json(input): Json<ReplaceReceiveInput>,
) -> AppResult<Json<ReceiveDetail>> {
    let receive = service(state)
        .replace_receive(&receive_number, input)
        .await?;
    Ok(Json(receive))
}

/// Mark a batch received, triggering FIFO allocation
pub async fn complete_receive(
    State(state): State<AppState>,
    Path(receive_number): Path<String>,
) -> AppResult<Json<BatchCompletion>> {
    let completion = service(state).mark_completed(&receive_number).await?;
    Ok(Json(completion))
}

pub async fn next_receive_number(
    State(state): State<AppState>,
) -> AppResult<Json<NextNumberResponse>> {
    let next_number = service(state).next_receive_number().await?;
    Ok(Json(NextNumberResponse { next_number }))
}
