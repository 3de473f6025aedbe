use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Serialize;
use sewa_core::aggregate::DashboardSummary;
use sewa_sync::Repair;

use crate::{
    ApiState,
    handlers::{actor, attendance::DateQuery},
    middleware::error_handling::AppError,
};

#[derive(Debug, Serialize)]
pub struct FixPointsResponse {
    pub corrected: usize,
}

pub async fn get_dashboard(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    let summary = state
        .engine
        .dashboard(actor(&state).as_ref(), query.date)
        .await?;
    Ok(Json(summary))
}

pub async fn fix_points(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<FixPointsResponse>, AppError> {
    let corrected = state
        .engine
        .fix_attendance_points(actor(&state).as_ref())
        .await?;
    Ok(Json(FixPointsResponse { corrected }))
}

pub async fn repair_attendance(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Repair>, AppError> {
    let repair = state
        .engine
        .repair_attendance_scores(actor(&state).as_ref())
        .await?;
    Ok(Json(repair))
}
