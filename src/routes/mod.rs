//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
  routing::{get, post},
  Router,
};
use tower_http::{
  cors::{Any, CorsLayer},
  services::{ServeDir, ServeFile},
  trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (one session per connection, push-capable)
/// - REST-ish API under `/api/v1/...` (explicit sessionId, poll for timers)
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
  // Static files with SPA fallback
  let static_service = ServeDir::new("./static")
    .append_index_html_on_directories(true)
    .not_found_service(ServeFile::new("./static/index.html"));

  Router::new()
    // WebSocket
    .route("/ws", get(ws::ws_upgrade))
    // HTTP API
    .route("/api/v1/health", get(http::http_health))
    .route("/api/v1/session", post(http::http_create_session).get(http::http_get_session))
    .route("/api/v1/start", post(http::http_post_start))
    .route("/api/v1/answer", post(http::http_post_answer))
    .route("/api/v1/shape", post(http::http_post_shape))
    .route("/api/v1/multiplier", post(http::http_post_multiplier))
    .route("/api/v1/move", post(http::http_post_move))
    .route("/api/v1/movement", post(http::http_post_movement))
    .route("/api/v1/restart", post(http::http_post_restart))
    .route("/api/v1/reset", post(http::http_post_reset))
    // State + CORS + HTTP tracing
    .with_state(state)
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
    // Frontend fallback
    .fallback_service(static_service)
}
