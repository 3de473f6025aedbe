use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use sewa_core::models::AttendanceRecord;
use sewa_sync::{AttendanceOutcome, DayReset};

use crate::{ApiState, handlers::actor, middleware::error_handling::AppError};

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

pub async fn list_attendance(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<DateQuery>,
) -> Json<Vec<AttendanceRecord>> {
    let date = query.date.unwrap_or_else(|| state.engine.today());
    let records: Vec<AttendanceRecord> = state
        .engine
        .store()
        .read(|e| {
            e.attendance()
                .iter()
                .filter(|a| a.date == date)
                .cloned()
                .collect()
        })
        .await;
    Json(records)
}

pub async fn toggle_attendance(
    State(state): State<Arc<ApiState>>,
    Path(sewadar_id): Path<String>,
) -> Result<Json<AttendanceOutcome>, AppError> {
    let outcome = state
        .engine
        .toggle_attendance(actor(&state).as_ref(), &sewadar_id)
        .await?;
    Ok(Json(outcome))
}

pub async fn unmark_day(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DayReset>, AppError> {
    let date = query.date.unwrap_or_else(|| state.engine.today());
    let reset = state
        .engine
        .unmark_day(actor(&state).as_ref(), date)
        .await?;
    Ok(Json(reset))
}
