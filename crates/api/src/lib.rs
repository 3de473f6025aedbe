//! # Sewa API
//!
//! HTTP surface over the sync engine. A view layer calls these endpoints to
//! log volunteers in, mark attendance, award and delete points, and read the
//! scoreboard and dashboard.
//!
//! ## Architecture
//!
//! - **Routes**: URL structure, one module per resource
//! - **Handlers**: request processing on top of [`sewa_sync::Engine`]
//! - **Middleware**: error to status code mapping
//! - **Config**: environment configuration
//!
//! The acting volunteer of every request is the session's active volunteer.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use eyre::{Result, WrapErr};
use sewa_core::models::Sewadar;
use sewa_sync::{Confirmation, Engine, Session};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    pub engine: Arc<Engine>,
    /// Volunteer and view of this client, persisted in the engine's cache.
    pub session: Session,
    /// Pending double-tap for score deletion.
    pub confirm: Confirmation,
    /// Roster written by the clean sync.
    pub roster_seed: Vec<Sewadar>,
}

impl ApiState {
    pub fn new(engine: Arc<Engine>, roster_seed: Vec<Sewadar>) -> Self {
        let session = Session::restore(engine.store().cache().clone(), engine.origin());
        Self {
            engine,
            session,
            confirm: Confirmation::default(),
            roster_seed,
        }
    }

    pub fn with_confirmation(mut self, confirm: Confirmation) -> Self {
        self.confirm = confirm;
        self
    }
}

/// Builds the application router with all routes attached to `state`.
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::session::routes())
        .merge(routes::sewadars::routes())
        .merge(routes::attendance::routes())
        .merge(routes::scores::routes())
        .merge(routes::dashboard::routes())
        .with_state(state)
}

/// Installs the global `tracing` subscriber at the configured level.
pub fn init_tracing(config: &config::ApiConfig) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Serves the API until the process is stopped.
pub async fn start_server(config: config::ApiConfig, state: Arc<ApiState>) -> Result<()> {
    let app = create_router(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let origins = origins
            .iter()
            .map(|origin| {
                origin
                    .parse()
                    .wrap_err_with(|| format!("Invalid CORS origin {}", origin))
            })
            .collect::<Result<Vec<_>>>()?;

        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(origins)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    let app = app
        .layer(tower_http::timeout::TimeoutLayer::new(Duration::from_secs(
            config.request_timeout,
        )))
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
