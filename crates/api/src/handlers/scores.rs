use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sewa_core::errors::SewaError;
use sewa_core::models::{DEFAULT_GAME_POINTS, ScoreRecord};
use sewa_core::roles::Operation;
use sewa_sync::Tap;

use crate::{ApiState, handlers::actor, middleware::error_handling::AppError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreQuery {
    pub sewadar_id: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardRequest {
    pub sewadar_id: String,
    pub game: String,
    pub points: Option<i32>,
}

/// Returned for the first tap of a delete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequired {
    pub score_id: String,
    pub message: String,
}

pub async fn list_scores(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ScoreQuery>,
) -> Json<Vec<ScoreRecord>> {
    let scores: Vec<ScoreRecord> = state
        .engine
        .store()
        .read(|e| {
            e.scores()
                .iter()
                .filter(|s| query.include_deleted || s.is_live())
                .filter(|s| {
                    query
                        .sewadar_id
                        .as_deref()
                        .is_none_or(|id| s.sewadar_id == id)
                })
                .cloned()
                .collect()
        })
        .await;
    Json(scores)
}

pub async fn award_score(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<AwardRequest>,
) -> Result<(StatusCode, Json<ScoreRecord>), AppError> {
    let score = state
        .engine
        .award_score(
            actor(&state).as_ref(),
            &payload.sewadar_id,
            &payload.game,
            payload.points.unwrap_or(DEFAULT_GAME_POINTS),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(score)))
}

/// Soft-deletes a score on the second tap inside the confirmation window.
pub async fn delete_score(
    State(state): State<Arc<ApiState>>,
    Path(score_id): Path<String>,
) -> Result<Response, AppError> {
    let actor = actor(&state);
    if !state
        .engine
        .gate()
        .can_act(actor.as_ref(), Operation::DeleteScore)
    {
        return Err(SewaError::Permission(format!("{:?}", Operation::DeleteScore)).into());
    }

    let known = state
        .engine
        .store()
        .read(|e| e.score(&score_id).is_some())
        .await;
    if !known {
        return Err(SewaError::NotFound(format!("Score {} not found", score_id)).into());
    }

    match state.confirm.tap(&score_id) {
        Tap::Armed => {
            let body = ConfirmRequired {
                message: "Tap delete again to confirm.".to_string(),
                score_id,
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
        Tap::Confirmed => {
            let score = state
                .engine
                .delete_score(actor.as_ref(), &score_id)
                .await?;
            Ok(Json(score).into_response())
        }
    }
}
