use axum::{
    Router,
    routing::{delete, get},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/scores",
            get(handlers::scores::list_scores).post(handlers::scores::award_score),
        )
        .route("/scores/:id", delete(handlers::scores::delete_score))
}
