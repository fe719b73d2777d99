//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable so the backend and the UI shell can evolve
//! independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Direction, Equation, Feedback, InputBlock, SessionPhase, Shape};
use crate::format;
use crate::session::{GraphTransform, Session};
use crate::validator::FieldBreakdown;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  StartChallenge {
    level: u8,
  },
  SubmitAnswer {
    blocks: Vec<InputBlock>,
  },
  SelectShape {
    shape: Shape,
  },
  SubmitMultiplier {
    value: String,
  },
  Move {
    direction: Direction,
    amount: String,
  },
  SubmitMovement,
  RestartEquation,
  Reset,
  Snapshot,
}

/// Messages the server sends back over WebSocket. `Phase` and `Snapshot`
/// are also pushed when a scheduled auto-advance fires.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Session {
    #[serde(rename = "sessionId")]
    session_id: String,
    snapshot: SnapshotOut,
  },
  Challenge(ChallengeOut),
  AnswerResult(AnswerResultOut),
  ShapeResult(ShapeResultOut),
  MultiplierResult(MultiplierResultOut),
  MoveApplied(MoveAppliedOut),
  MovementResult(MovementResultOut),
  Phase(PhaseOut),
  Snapshot(SnapshotOut),
  Notice {
    message: String,
  },
  Error {
    message: String,
  },
}

impl ServerWsMessage {
  pub fn session(session: &Session) -> Self {
    ServerWsMessage::Session {
      session_id: session.id().to_string(),
      snapshot: snapshot(session),
    }
  }
}

/// Render parameters for the frontend canvas: draw `y = a(x-h)² + k` on a
/// coordinate system that keeps the vertex in frame.
#[derive(Debug, Serialize)]
pub struct RenderOut {
  pub a: f64,
  pub h: f64,
  pub k: f64,
}

pub fn render_out(session: &Session) -> RenderOut {
  let (a, h, k) = session.render_params();
  RenderOut { a, h, k }
}

/// DTO for challenge delivery (shared by WS and HTTP).
#[derive(Debug, Serialize)]
pub struct ChallengeOut {
  pub level: u8,
  pub phase: SessionPhase,
  pub equation: Equation,
  /// `$y = ax^2 + bx + c$`, the problem as displayed.
  pub standard_form: String,
  /// `$y = a(x - h)^2 + k$`, the movement-phase target.
  pub vertex_target: String,
  /// `$y = ax^2$`, the unshifted graph the movement phase starts from.
  pub base_graph: String,
}

pub fn challenge_out(session: &Session) -> Option<ChallengeOut> {
  let eq = session.equation()?;
  Some(ChallengeOut {
    level: session.level().as_u8(),
    phase: session.phase(),
    equation: *eq,
    standard_form: format::standard_form(eq),
    vertex_target: format::target_vertex(eq),
    base_graph: format::base_graph(eq, session.level()),
  })
}

#[derive(Debug, Serialize)]
pub struct AnswerResultOut {
  pub correct: bool,
  /// True when no canonical template matched the input.
  pub no_match: bool,
  /// True when the submission was ignored because the phase is locked.
  pub locked: bool,
  pub breakdown: Option<FieldBreakdown>,
  pub feedback: Option<Feedback>,
}

#[derive(Debug, Serialize)]
pub struct ShapeResultOut {
  pub correct: bool,
  /// Blocking notice on a wrong pick (selection cleared, unlimited retries).
  pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MultiplierResultOut {
  pub correct: bool,
  pub toast: Option<String>,
  pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoveAppliedOut {
  pub transform: GraphTransform,
  pub render: RenderOut,
}

#[derive(Debug, Serialize)]
pub struct MovementResultOut {
  pub correct: bool,
  pub h_correct: bool,
  pub k_correct: bool,
  /// True when the check happened in the retry phase.
  pub retry: bool,
  pub feedback: Option<Feedback>,
}

/// Pushed when a scheduled auto-advance changes the phase.
#[derive(Debug, Serialize)]
pub struct PhaseOut {
  pub phase: SessionPhase,
  pub render: RenderOut,
  pub feedback: Option<Feedback>,
}

/// Full session view for polling clients and reconnects.
#[derive(Debug, Serialize)]
pub struct SnapshotOut {
  pub level: u8,
  pub phase: SessionPhase,
  pub equation: Option<Equation>,
  pub standard_form: Option<String>,
  pub vertex_target: Option<String>,
  pub base_graph: Option<String>,
  pub wrong_attempts: u32,
  pub graph_attempts: u32,
  pub selected_shape: Option<Shape>,
  pub transform: GraphTransform,
  pub render: RenderOut,
  pub input: Vec<InputBlock>,
  pub feedback: Option<Feedback>,
}

pub fn snapshot(session: &Session) -> SnapshotOut {
  let eq = session.equation();
  SnapshotOut {
    level: session.level().as_u8(),
    phase: session.phase(),
    equation: eq.copied(),
    standard_form: eq.map(format::standard_form),
    vertex_target: eq.map(format::target_vertex),
    base_graph: eq.map(|e| format::base_graph(e, session.level())),
    wrong_attempts: session.wrong_attempts(),
    graph_attempts: session.graph_attempts(),
    selected_shape: session.selected_shape(),
    transform: session.transform(),
    render: render_out(session),
    input: session.input().to_vec(),
    feedback: session.feedback().cloned(),
  }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[derive(Serialize)]
pub struct CreateSessionOut {
  #[serde(rename = "sessionId")]
  pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
  #[serde(rename = "sessionId")]
  pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StartIn {
  #[serde(rename = "sessionId")]
  pub session_id: String,
  pub level: u8,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
  #[serde(rename = "sessionId")]
  pub session_id: String,
  pub blocks: Vec<InputBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ShapeIn {
  #[serde(rename = "sessionId")]
  pub session_id: String,
  pub shape: Shape,
}

#[derive(Debug, Deserialize)]
pub struct MultiplierIn {
  #[serde(rename = "sessionId")]
  pub session_id: String,
  pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveIn {
  #[serde(rename = "sessionId")]
  pub session_id: String,
  pub direction: Direction,
  pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRefIn {
  #[serde(rename = "sessionId")]
  pub session_id: String,
}
