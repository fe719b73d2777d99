//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; errors map to status codes via `TrainerError`.
//!
//! HTTP clients have no push channel, so scheduled auto-advances still run
//! server-side and the client observes them by polling `GET /api/v1/session`.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::logic::{self, TrainerError};
use crate::protocol::*;
use crate::state::AppState;

impl IntoResponse for TrainerError {
  fn into_response(self) -> Response {
    let status = match &self {
      TrainerError::UnknownSession(_) => StatusCode::NOT_FOUND,
      TrainerError::InvalidLevel(_) | TrainerError::InvalidNumericInput(_) => StatusCode::BAD_REQUEST,
      TrainerError::OutOfPhase => StatusCode::CONFLICT,
    };
    (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let session_id = state.create_session().await;
  info!(target: "vertex_trainer", %session_id, "HTTP session created");
  Json(CreateSessionOut { session_id })
}

#[instrument(level = "info", skip(state), fields(%q.session_id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionQuery>,
) -> Result<Json<SnapshotOut>, TrainerError> {
  Ok(Json(logic::get_snapshot(&state, &q.session_id).await?))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, body.level))]
pub async fn http_post_start(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartIn>,
) -> Result<Json<ChallengeOut>, TrainerError> {
  let out = logic::do_start_challenge(&state, &body.session_id, body.level, None).await?;
  info!(target: "session", id = %body.session_id, level = body.level, "HTTP challenge started");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, blocks = body.blocks.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerResultOut>, TrainerError> {
  let out = logic::do_submit_answer(&state, &body.session_id, body.blocks, None).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, ?body.shape))]
pub async fn http_post_shape(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ShapeIn>,
) -> Result<Json<ShapeResultOut>, TrainerError> {
  let out = logic::do_select_shape(&state, &body.session_id, body.shape, None).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, %body.value))]
pub async fn http_post_multiplier(
  State(state): State<Arc<AppState>>,
  Json(body): Json<MultiplierIn>,
) -> Result<Json<MultiplierResultOut>, TrainerError> {
  let out = logic::do_submit_multiplier(&state, &body.session_id, &body.value, None).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, ?body.direction, %body.amount))]
pub async fn http_post_move(
  State(state): State<Arc<AppState>>,
  Json(body): Json<MoveIn>,
) -> Result<Json<MoveAppliedOut>, TrainerError> {
  let out = logic::do_move(&state, &body.session_id, body.direction, &body.amount).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_movement(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionRefIn>,
) -> Result<Json<MovementResultOut>, TrainerError> {
  let out = logic::do_submit_movement(&state, &body.session_id, None).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_restart(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionRefIn>,
) -> Result<Json<SnapshotOut>, TrainerError> {
  Ok(Json(logic::do_restart_equation(&state, &body.session_id).await?))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_reset(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionRefIn>,
) -> Result<Json<SnapshotOut>, TrainerError> {
  Ok(Json(logic::do_reset(&state, &body.session_id).await?))
}
