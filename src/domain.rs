//! Domain models used by the backend: levels, equations, phases, shapes,
//! learner input blocks, and feedback.

use serde::{Deserialize, Serialize};

/// Difficulty level. Level one fixes `a = 1`; level two adds a leading
/// coefficient and the shape/multiplier sub-steps of the graph challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
  One,
  Two,
}

impl Level {
  pub fn as_u8(self) -> u8 {
    match self {
      Level::One => 1,
      Level::Two => 2,
    }
  }
}

impl TryFrom<u8> for Level {
  type Error = String;
  fn try_from(v: u8) -> Result<Self, Self::Error> {
    match v {
      1 => Ok(Level::One),
      2 => Ok(Level::Two),
      other => Err(format!("unsupported level: {}", other)),
    }
  }
}

impl From<Level> for u8 {
  fn from(l: Level) -> u8 { l.as_u8() }
}

/// A quadratic `y = ax² + bx + c` together with its exact completed-square
/// vertex `(h, k)`. Built once per challenge, immutable afterwards.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Equation {
  pub a: i32,
  pub b: i32,
  pub c: i32,
  pub h: f64,
  pub k: f64,
}

impl Equation {
  /// Derives `(h, k)` from the completed-square identity
  /// `ax² + bx + c = a(x + b/2a)² + (c - b²/4a)`.
  pub fn new(a: i32, b: i32, c: i32) -> Self {
    let af = a as f64;
    let bf = b as f64;
    let cf = c as f64;
    let h = -bf / (2.0 * af);
    let k = cf - (bf * bf) / (4.0 * af);
    Self { a, b, c, h, k }
  }

  /// The exact answer triple the learner is asked to reproduce.
  pub fn answer(&self) -> VertexCandidate {
    VertexCandidate { a: self.a as f64, h: self.h, k: self.k }
  }
}

/// Parsed candidate for the vertex form `a(x - h)² + k`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VertexCandidate {
  pub a: f64,
  pub h: f64,
  pub k: f64,
}

/// Concavity the learner believes matches `sign(a)`.
/// `Down` (∪, opening upward from the bottom button row) is correct for
/// `a > 0`, `Up` (∩) for `a < 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
  Up,
  Down,
}

/// Directional nudge applied to the graph. `right`/`up` are positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  Up,
  Down,
  Left,
  Right,
}

/// Which part of the session the learner is currently in.
/// One-directional except `Main` (global reset target) and `RetryMovement`,
/// which keeps looping on repeated failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
  Main,
  SolvingEquation,
  ShapeSelection,
  MultiplierCheck,
  Movement,
  RetryMovement,
  Success,
}

impl SessionPhase {
  pub fn is_movement(self) -> bool {
    matches!(self, SessionPhase::Movement | SessionPhase::RetryMovement)
  }
}

/// One symbolic block of the learner's composed answer. Blocks are
/// concatenated (whitespace stripped) before parsing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputBlock {
  pub value: String,
  pub kind: BlockKind,
}

impl InputBlock {
  pub fn new(value: impl Into<String>, kind: BlockKind) -> Self {
    Self { value: value.into(), kind }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
  Number,
  Variable,
  Operator,
  Parenthesis,
  Power,
}

/// Feedback surfaced to the learner. The kind maps onto the frontend's
/// feedback styles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
  pub kind: FeedbackKind,
  pub text: String,
}

impl Feedback {
  pub fn new(kind: FeedbackKind, text: impl Into<String>) -> Self {
    Self { kind, text: text.into() }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
  Success,
  Error,
  Warning,
  Info,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn completed_square_identity() {
    let eq = Equation::new(1, -4, -1);
    assert_eq!(eq.h, 2.0);
    assert_eq!(eq.k, -5.0);

    let eq = Equation::new(-2, 4, 3);
    assert_eq!(eq.h, -1.0);
    assert_eq!(eq.k, 5.0);
  }

  #[test]
  fn level_conversion_bounds() {
    assert_eq!(Level::try_from(1), Ok(Level::One));
    assert_eq!(Level::try_from(2), Ok(Level::Two));
    assert!(Level::try_from(0).is_err());
    assert!(Level::try_from(3).is_err());
  }
}
