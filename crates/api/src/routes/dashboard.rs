use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/dashboard/fix-points", post(handlers::dashboard::fix_points))
        .route(
            "/dashboard/repair-attendance",
            post(handlers::dashboard::repair_attendance),
        )
}
