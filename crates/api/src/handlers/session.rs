use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use sewa_core::models::{ViewState, Volunteer};
use sewa_core::roles::Operation;
use sewa_sync::SyncMode;

use crate::{ApiState, middleware::error_handling::AppError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub volunteer_id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    pub view: ViewState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub volunteer: Option<Volunteer>,
    pub view: ViewState,
    pub mode: SyncMode,
    /// What the active volunteer may do; the view layer hides everything else.
    pub allowed: Vec<Operation>,
}

fn describe(state: &ApiState) -> SessionResponse {
    let current = state.session.current();
    SessionResponse {
        allowed: state.engine.gate().allowed(current.volunteer.as_ref()),
        volunteer: current.volunteer,
        view: current.view,
        mode: state.engine.mode(),
    }
}

pub async fn get_session(State(state): State<Arc<ApiState>>) -> Json<SessionResponse> {
    Json(describe(&state))
}

pub async fn login(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    state
        .session
        .login(state.engine.gate(), &payload.volunteer_id, &payload.password)?;
    Ok(Json(describe(&state)))
}

pub async fn logout(State(state): State<Arc<ApiState>>) -> Result<Json<SessionResponse>, AppError> {
    state.session.logout()?;
    state.confirm.clear();
    Ok(Json(describe(&state)))
}

pub async fn set_view(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<ViewRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    state.session.set_view(state.engine.gate(), payload.view)?;
    Ok(Json(describe(&state)))
}
