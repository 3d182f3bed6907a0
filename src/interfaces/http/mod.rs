//! HTTP frontend: the multiorder API, a health check, and the single-page
//! application served from disk for every other path.

pub mod error;
pub mod handlers;

use crate::application::engine::DispatchEngine;
use crate::config::ServerConfig;
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub engine: DispatchEngine,
}

impl AppState {
    pub fn new(engine: DispatchEngine) -> Self {
        Self { engine }
    }
}

/// Builds the application router: API routes, the static site fallback, and
/// request tracing bounded by the configured request timeout.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    // Unknown paths fall back to the index document with a 200.
    let spa = ServeDir::new(&config.static_dir).fallback(ServeFile::new(config.index_path()));

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/multiorder", post(handlers::multiorder))
        .fallback_service(spa)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .with_state(state)
}
