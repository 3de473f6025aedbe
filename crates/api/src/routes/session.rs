use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/session", get(handlers::session::get_session))
        .route("/session/login", post(handlers::session::login))
        .route("/session/logout", post(handlers::session::logout))
        .route("/session/view", put(handlers::session::set_view))
}
