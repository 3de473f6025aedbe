//! # Error Handling Middleware
//!
//! Maps [`SewaError`] to HTTP status codes and a JSON body of the form
//! `{ "error": "<message>" }`. Remote and internal failures are logged in full
//! but reported to the caller with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sewa_core::errors::SewaError;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use sewa_api::middleware::error_handling::AppError;
/// use sewa_core::errors::SewaError;
///
/// async fn handler(name: String) -> Result<Json<String>, AppError> {
///     if name.trim().is_empty() {
///         return Err(AppError(SewaError::Validation("Name is required".into())));
///     }
///     Ok(Json(name))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub SewaError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SewaError::Validation(_) => StatusCode::BAD_REQUEST,
            SewaError::Authentication(_) => StatusCode::UNAUTHORIZED,
            SewaError::Permission(_) => StatusCode::FORBIDDEN,
            SewaError::NotFound(_) => StatusCode::NOT_FOUND,
            SewaError::Capacity(_) => StatusCode::CONFLICT,
            SewaError::RemoteWrite(_) | SewaError::PartialWrite { .. } => StatusCode::BAD_GATEWAY,
            SewaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, "request failed: {:#}", self.0);
        }

        let body = Json(json!({ "error": self.0.user_message() }));
        (status, body).into_response()
    }
}

impl From<SewaError> for AppError {
    fn from(err: SewaError) -> Self {
        AppError(err)
    }
}

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(SewaError::Internal(err.into()))
    }
}

pub fn map_error(err: SewaError) -> Response {
    AppError(err).into_response()
}
