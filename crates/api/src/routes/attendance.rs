use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/attendance", get(handlers::attendance::list_attendance))
        .route(
            "/attendance/unmark-day",
            post(handlers::attendance::unmark_day),
        )
        .route(
            "/attendance/:sewadar_id/toggle",
            post(handlers::attendance::toggle_attendance),
        )
}
