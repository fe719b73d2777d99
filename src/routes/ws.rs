//! WebSocket upgrade + message loop. Each connection owns one session: the
//! session is created on upgrade, announced with a `session` message, and
//! removed on disconnect. Client messages get a single JSON reply; timer
//! firings arrive as extra `phase`/`snapshot` pushes through an mpsc channel.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::logic::{self, PushSender, TrainerError};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "vertex_trainer", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let session_id = state.create_session().await;
  info!(target: "vertex_trainer", %session_id, "WebSocket connected");

  let (tx, mut rx) = mpsc::unbounded_channel::<ServerWsMessage>();

  // Announce the fresh session so the client learns its id and initial view.
  let hello = {
    let sessions = state.sessions.read().await;
    sessions.get(&session_id).map(ServerWsMessage::session)
  };
  if let Some(hello) = hello {
    if send_json(&mut socket, &hello).await.is_err() {
      state.remove_session(&session_id).await;
      return;
    }
  }

  loop {
    tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => {
          let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
            Ok(msg) => {
              debug!(target: "vertex_trainer", %session_id, "WS received: {:?}", &msg);
              handle_client_ws(msg, &state, &session_id, &tx).await
            }
            Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
          };
          if send_json(&mut socket, &reply).await.is_err() {
            break;
          }
        }
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Ok(_)) => {}
        Some(Err(e)) => {
          error!(target: "vertex_trainer", %session_id, error = %e, "WS receive error");
          break;
        }
      },
      pushed = rx.recv() => match pushed {
        Some(msg) => {
          if send_json(&mut socket, &msg).await.is_err() {
            break;
          }
        }
        // We hold a sender, so the channel only closes when this task drops it.
        None => break,
      },
    }
  }

  state.remove_session(&session_id).await;
  info!(target: "vertex_trainer", %session_id, "WebSocket disconnected");
}

async fn send_json(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await.map_err(|e| {
    error!(target: "vertex_trainer", error = %e, "WS send error");
    e
  })
}

#[instrument(level = "info", skip(state, tx), fields(%session_id))]
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &Arc<AppState>,
  session_id: &str,
  tx: &PushSender,
) -> ServerWsMessage {
  let push = Some(tx);
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartChallenge { level } => {
      match logic::do_start_challenge(state, session_id, level, push).await {
        Ok(out) => ServerWsMessage::Challenge(out),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::SubmitAnswer { blocks } => {
      match logic::do_submit_answer(state, session_id, blocks, push).await {
        Ok(out) => ServerWsMessage::AnswerResult(out),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::SelectShape { shape } => {
      match logic::do_select_shape(state, session_id, shape, push).await {
        Ok(out) => ServerWsMessage::ShapeResult(out),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::SubmitMultiplier { value } => {
      match logic::do_submit_multiplier(state, session_id, &value, push).await {
        Ok(out) => ServerWsMessage::MultiplierResult(out),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::Move { direction, amount } => {
      match logic::do_move(state, session_id, direction, &amount).await {
        Ok(out) => ServerWsMessage::MoveApplied(out),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::SubmitMovement => {
      match logic::do_submit_movement(state, session_id, push).await {
        Ok(out) => ServerWsMessage::MovementResult(out),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::RestartEquation => {
      match logic::do_restart_equation(state, session_id).await {
        Ok(out) => ServerWsMessage::Snapshot(out),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::Reset => match logic::do_reset(state, session_id).await {
      Ok(out) => ServerWsMessage::Snapshot(out),
      Err(e) => error_reply(e),
    },

    ClientWsMessage::Snapshot => match logic::get_snapshot(state, session_id).await {
      Ok(out) => ServerWsMessage::Snapshot(out),
      Err(e) => error_reply(e),
    },
  }
}

/// Learner-facing rejections (bad numeric input, wrong phase) come back as
/// notices; everything else is a hard error.
fn error_reply(e: TrainerError) -> ServerWsMessage {
  match e {
    TrainerError::InvalidNumericInput(_) | TrainerError::OutOfPhase => {
      ServerWsMessage::Notice { message: e.to_string() }
    }
    other => ServerWsMessage::Error { message: other.to_string() },
  }
}
