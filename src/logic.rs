//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! Each operation locks the session store, dispatches to the state machine,
//! converts the outcome into protocol DTOs, and spawns one-shot timers for
//! any scheduled auto-advances. A timer re-locks the store and fires the
//! action with the phase-entry token captured at scheduling time; if the
//! session moved on (or is gone) the firing is a no-op.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument};

use crate::domain::{Direction, InputBlock, Level, Shape};
use crate::parser;
use crate::protocol::{
  self, AnswerResultOut, ChallengeOut, MoveAppliedOut, MovementResultOut, MultiplierResultOut,
  PhaseOut, ServerWsMessage, ShapeResultOut, SnapshotOut,
};
use crate::session::{DelayedAction, Scheduled, Session};
use crate::state::AppState;

/// Channel used to push timer-fired transitions to a WebSocket client.
/// HTTP clients have no push channel; they observe transitions by polling
/// the snapshot.
pub type PushSender = UnboundedSender<ServerWsMessage>;

#[derive(Debug, Error)]
pub enum TrainerError {
  #[error("unknown sessionId: {0}")]
  UnknownSession(String),
  #[error("unsupported level: {0} (expected 1 or 2)")]
  InvalidLevel(u8),
  /// Non-numeric (or non-positive, where a positive scalar is required)
  /// learner input. Surfaced as a blocking notice; never counted as an
  /// attempt.
  #[error("{0}")]
  InvalidNumericInput(String),
  #[error("operation not available in the current phase")]
  OutOfPhase,
}

#[instrument(level = "info", skip(state, push), fields(%session_id, level))]
pub async fn do_start_challenge(
  state: &Arc<AppState>,
  session_id: &str,
  level: u8,
  push: Option<&PushSender>,
) -> Result<ChallengeOut, TrainerError> {
  let level = Level::try_from(level).map_err(|_| TrainerError::InvalidLevel(level))?;
  let mut sessions = state.sessions.write().await;
  let session = get_mut(&mut sessions, session_id)?;
  let outcome = session.start_challenge(level, &state.config);
  let out = protocol::challenge_out(session).ok_or(TrainerError::OutOfPhase)?;
  schedule_all(state, session_id, outcome.scheduled, push);
  Ok(out)
}

#[instrument(level = "info", skip(state, blocks, push), fields(%session_id, blocks = blocks.len()))]
pub async fn do_submit_answer(
  state: &Arc<AppState>,
  session_id: &str,
  blocks: Vec<InputBlock>,
  push: Option<&PushSender>,
) -> Result<AnswerResultOut, TrainerError> {
  let mut sessions = state.sessions.write().await;
  let session = get_mut(&mut sessions, session_id)?;
  let res = session
    .submit_answer(blocks, &state.config)
    .ok_or(TrainerError::OutOfPhase)?;
  info!(target: "session", id = %session_id, correct = res.correct, accepted = res.accepted, "Answer evaluated");
  let out = AnswerResultOut {
    correct: res.correct,
    no_match: res.no_match,
    locked: !res.accepted,
    breakdown: res.breakdown,
    feedback: res.outcome.feedback.clone(),
  };
  schedule_all(state, session_id, res.outcome.scheduled, push);
  Ok(out)
}

#[instrument(level = "info", skip(state, push), fields(%session_id, ?shape))]
pub async fn do_select_shape(
  state: &Arc<AppState>,
  session_id: &str,
  shape: Shape,
  push: Option<&PushSender>,
) -> Result<ShapeResultOut, TrainerError> {
  let mut sessions = state.sessions.write().await;
  let session = get_mut(&mut sessions, session_id)?;
  let res = session
    .select_shape(shape, &state.config)
    .ok_or(TrainerError::OutOfPhase)?;
  let out = ShapeResultOut { correct: res.correct, notice: res.notice };
  schedule_all(state, session_id, res.outcome.scheduled, push);
  Ok(out)
}

#[instrument(level = "info", skip(state, push), fields(%session_id, %value))]
pub async fn do_submit_multiplier(
  state: &Arc<AppState>,
  session_id: &str,
  value: &str,
  push: Option<&PushSender>,
) -> Result<MultiplierResultOut, TrainerError> {
  let parsed = parser::parse_amount(value).filter(|v| *v > 0.0);
  let Some(parsed) = parsed else {
    return Err(TrainerError::InvalidNumericInput(state.config.messages.multiplier_invalid.clone()));
  };
  let mut sessions = state.sessions.write().await;
  let session = get_mut(&mut sessions, session_id)?;
  let res = session
    .submit_multiplier(parsed, &state.config)
    .ok_or(TrainerError::OutOfPhase)?;
  let out = MultiplierResultOut {
    correct: res.correct,
    toast: res.outcome.toast.clone(),
    notice: res.notice,
  };
  schedule_all(state, session_id, res.outcome.scheduled, push);
  Ok(out)
}

#[instrument(level = "info", skip(state), fields(%session_id, ?direction, %amount))]
pub async fn do_move(
  state: &Arc<AppState>,
  session_id: &str,
  direction: Direction,
  amount: &str,
) -> Result<MoveAppliedOut, TrainerError> {
  // Signed amounts are fine here; only non-numeric input is rejected.
  let Some(amount) = parser::parse_amount(amount) else {
    return Err(TrainerError::InvalidNumericInput(state.config.messages.move_invalid.clone()));
  };
  let mut sessions = state.sessions.write().await;
  let session = get_mut(&mut sessions, session_id)?;
  let transform = session
    .apply_move(direction, amount)
    .ok_or(TrainerError::OutOfPhase)?;
  Ok(MoveAppliedOut { transform, render: protocol::render_out(session) })
}

#[instrument(level = "info", skip(state, push), fields(%session_id))]
pub async fn do_submit_movement(
  state: &Arc<AppState>,
  session_id: &str,
  push: Option<&PushSender>,
) -> Result<MovementResultOut, TrainerError> {
  let mut sessions = state.sessions.write().await;
  let session = get_mut(&mut sessions, session_id)?;
  let res = session
    .submit_movement(&state.config)
    .ok_or(TrainerError::OutOfPhase)?;
  let out = MovementResultOut {
    correct: res.correct,
    h_correct: res.h_correct,
    k_correct: res.k_correct,
    retry: res.retry,
    feedback: res.outcome.feedback.clone(),
  };
  schedule_all(state, session_id, res.outcome.scheduled, push);
  Ok(out)
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn do_restart_equation(
  state: &Arc<AppState>,
  session_id: &str,
) -> Result<SnapshotOut, TrainerError> {
  let mut sessions = state.sessions.write().await;
  let session = get_mut(&mut sessions, session_id)?;
  session.restart_equation().ok_or(TrainerError::OutOfPhase)?;
  Ok(protocol::snapshot(session))
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn do_reset(state: &Arc<AppState>, session_id: &str) -> Result<SnapshotOut, TrainerError> {
  let mut sessions = state.sessions.write().await;
  let session = get_mut(&mut sessions, session_id)?;
  session.reset_to_main();
  Ok(protocol::snapshot(session))
}

#[instrument(level = "debug", skip(state), fields(%session_id))]
pub async fn get_snapshot(state: &Arc<AppState>, session_id: &str) -> Result<SnapshotOut, TrainerError> {
  let sessions = state.sessions.read().await;
  let session = sessions
    .get(session_id)
    .ok_or_else(|| TrainerError::UnknownSession(session_id.to_string()))?;
  Ok(protocol::snapshot(session))
}

fn get_mut<'a>(
  sessions: &'a mut std::collections::HashMap<String, Session>,
  session_id: &str,
) -> Result<&'a mut Session, TrainerError> {
  sessions
    .get_mut(session_id)
    .ok_or_else(|| TrainerError::UnknownSession(session_id.to_string()))
}

fn schedule_all(
  state: &Arc<AppState>,
  session_id: &str,
  scheduled: Vec<Scheduled>,
  push: Option<&PushSender>,
) {
  for sch in scheduled {
    spawn_scheduled(state.clone(), session_id.to_string(), sch, push.cloned());
  }
}

/// Run one scheduled action (and any follow-ups it chains into, such as
/// reveal → autofill → advance) on its own task. Each step sleeps, fires
/// under the write lock, and pushes the resulting transition to the client
/// when a push channel exists.
pub fn spawn_scheduled(state: Arc<AppState>, session_id: String, first: Scheduled, push: Option<PushSender>) {
  tokio::spawn(async move {
    let mut pending = vec![first];
    while let Some(sch) = pending.pop() {
      tokio::time::sleep(sch.delay).await;
      let msg = {
        let mut sessions = state.sessions.write().await;
        let Some(session) = sessions.get_mut(&session_id) else { return };
        let Some(outcome) = session.fire(sch.token, sch.action, &state.config) else { return };
        pending.extend(outcome.scheduled.iter().copied());
        match sch.action {
          // Autofill changes the input blocks, not the phase.
          DelayedAction::AutofillAnswer => ServerWsMessage::Snapshot(protocol::snapshot(session)),
          _ => ServerWsMessage::Phase(PhaseOut {
            phase: session.phase(),
            render: protocol::render_out(session),
            feedback: outcome.feedback,
          }),
        }
      };
      if let Some(tx) = &push {
        // A closed channel just means the client went away.
        let _ = tx.send(msg);
      }
    }
  });
}
