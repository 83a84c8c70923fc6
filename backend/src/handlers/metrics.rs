//! HTTP handler for the dashboard

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::metrics::{DashboardMetrics, MetricsService};
use crate::AppState;

pub async fn dashboard_metrics(State(state): State<AppState>) -> AppResult<Json<DashboardMetrics>> {
    let service = MetricsService::new(state.db);
    let metrics = service.dashboard().await?;
    Ok(Json(metrics))
}
