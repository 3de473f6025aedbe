use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use sewa_core::models::{Gender, Group, Sewadar};
use sewa_sync::Registration;

use crate::{ApiState, handlers::actor, middleware::error_handling::AppError};

#[derive(Debug, Deserialize)]
pub struct AddSewadarRequest {
    pub name: String,
    pub gender: Gender,
    pub group: Group,
}

pub async fn list_sewadars(State(state): State<Arc<ApiState>>) -> Json<Vec<Sewadar>> {
    let sewadars: Vec<Sewadar> = state.engine.store().read(|e| e.sewadars().to_vec()).await;
    Json(sewadars)
}

/// Registers the sewadar and marks them present in one call.
pub async fn add_sewadar(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<AddSewadarRequest>,
) -> Result<(StatusCode, Json<Registration>), AppError> {
    let registration = state
        .engine
        .add_sewadar(
            actor(&state).as_ref(),
            &payload.name,
            payload.gender,
            payload.group,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn resync_roster(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<Sewadar>>, AppError> {
    let roster = state
        .engine
        .resync_roster(actor(&state).as_ref(), state.roster_seed.clone())
        .await?;
    Ok(Json(roster))
}
