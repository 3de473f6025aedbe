use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/sewadars",
            get(handlers::sewadars::list_sewadars).post(handlers::sewadars::add_sewadar),
        )
        .route("/sewadars/resync", post(handlers::sewadars::resync_roster))
}
