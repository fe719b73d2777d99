//! The per-learner session state machine.
//!
//! Flow:
//!   Main → SolvingEquation → (ShapeSelection → MultiplierCheck at level 2)
//!        → Movement → (RetryMovement)* → Success
//!
//! Every operation is synchronous and happens under the session lock. Timed
//! auto-advances are never executed here: they come back as `Scheduled`
//! values (delay + action + the phase-entry token at scheduling time) and
//! the caller decides how to run them. Firing a scheduled action whose
//! token no longer matches the current epoch is a no-op, so a pending timer
//! can never act on a session that has moved on or been reset.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::TrainerConfig;
use crate::domain::{
  Direction, Equation, Feedback, FeedbackKind, InputBlock, Level, SessionPhase, Shape,
};
use crate::format;
use crate::generator;
use crate::parser;
use crate::util::fill_template;
use crate::validator::{self, FieldBreakdown, MOVEMENT_TOLERANCE};

/// Accumulated graph translation. `up`/`down` move `k`, `left`/`right` move
/// `h`; `right` and `up` are the positive directions. No validation lives
/// here — `submit_movement` reads this state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GraphTransform {
  pub h: f64,
  pub k: f64,
}

impl GraphTransform {
  pub fn apply(&mut self, direction: Direction, amount: f64) {
    match direction {
      Direction::Up => self.k += amount,
      Direction::Down => self.k -= amount,
      Direction::Left => self.h -= amount,
      Direction::Right => self.h += amount,
    }
  }

  pub fn reset(&mut self) {
    *self = Self::default();
  }
}

/// A delayed auto-advance, returned as data. `token` is the session epoch at
/// scheduling time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduled {
  pub token: u64,
  pub delay: Duration,
  pub action: DelayedAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayedAction {
  /// Enter the graph phase (Movement at level 1, ShapeSelection at level 2).
  AdvanceToGraph,
  /// Populate the input blocks with the revealed answer, then advance.
  AutofillAnswer,
  AdvanceToMultiplier,
  AdvanceToMovement,
  /// Reset the transform and enter RetryMovement.
  BeginRetry,
  AdvanceToSuccess,
}

/// What a transition produced: feedback for the banner, an optional toast,
/// and any follow-up timers to schedule.
#[derive(Clone, Debug, Default)]
pub struct Outcome {
  pub feedback: Option<Feedback>,
  pub toast: Option<String>,
  pub scheduled: Vec<Scheduled>,
}

pub struct AnswerOutcome {
  /// False when the answer was ignored because the phase is locked
  /// (a correct answer or the reveal already fired).
  pub accepted: bool,
  pub correct: bool,
  pub no_match: bool,
  pub breakdown: Option<FieldBreakdown>,
  /// The revealed vertex form, set only the moment the reveal fires.
  pub revealed: Option<String>,
  pub outcome: Outcome,
}

pub struct ShapeOutcome {
  pub correct: bool,
  pub notice: Option<String>,
  pub outcome: Outcome,
}

pub struct MultiplierOutcome {
  pub correct: bool,
  pub notice: Option<String>,
  pub outcome: Outcome,
}

pub struct MovementOutcome {
  pub correct: bool,
  pub h_correct: bool,
  pub k_correct: bool,
  /// True when the check happened in the retry phase.
  pub retry: bool,
  pub outcome: Outcome,
}

pub struct Session {
  id: String,
  level: Level,
  equation: Option<Equation>,
  phase: SessionPhase,
  /// Phase-entry token; bumped on every phase change and reset.
  epoch: u64,
  wrong_attempts: u32,
  graph_attempts: u32,
  selected_shape: Option<Shape>,
  transform: GraphTransform,
  input: Vec<InputBlock>,
  /// Set once a correct answer is accepted or the reveal fires; further
  /// submissions in this challenge are ignored.
  locked: bool,
  feedback: Option<Feedback>,
}

impl Session {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      level: Level::One,
      equation: None,
      phase: SessionPhase::Main,
      epoch: 0,
      wrong_attempts: 0,
      graph_attempts: 0,
      selected_shape: None,
      transform: GraphTransform::default(),
      input: Vec::new(),
      locked: false,
      feedback: None,
    }
  }

  // ----- read-only accessors (consumed by the presentation layer) -----

  pub fn id(&self) -> &str { &self.id }
  pub fn level(&self) -> Level { self.level }
  pub fn equation(&self) -> Option<&Equation> { self.equation.as_ref() }
  pub fn phase(&self) -> SessionPhase { self.phase }
  pub fn epoch(&self) -> u64 { self.epoch }
  pub fn wrong_attempts(&self) -> u32 { self.wrong_attempts }
  pub fn graph_attempts(&self) -> u32 { self.graph_attempts }
  pub fn selected_shape(&self) -> Option<Shape> { self.selected_shape }
  pub fn transform(&self) -> GraphTransform { self.transform }
  pub fn input(&self) -> &[InputBlock] { &self.input }
  pub fn feedback(&self) -> Option<&Feedback> { self.feedback.as_ref() }

  /// Semantic parameters for the renderer: draw `y = a(x-h)² + k`.
  /// Level 1 always starts from `y = x²`; level 2 from the scaled parabola.
  pub fn render_params(&self) -> (f64, f64, f64) {
    let a = match (self.level, self.equation) {
      (Level::Two, Some(eq)) => eq.a as f64,
      _ => 1.0,
    };
    (a, self.transform.h, self.transform.k)
  }

  // ----- operations -----

  /// Start a fresh challenge with a newly generated equation.
  pub fn start_challenge(&mut self, level: Level, cfg: &TrainerConfig) -> Outcome {
    let eq = generator::generate(level);
    self.start_with(level, eq, cfg)
  }

  /// Start a challenge with a caller-supplied equation (deterministic path).
  pub fn start_with(&mut self, level: Level, equation: Equation, _cfg: &TrainerConfig) -> Outcome {
    self.level = level;
    self.equation = Some(equation);
    self.wrong_attempts = 0;
    self.graph_attempts = 0;
    self.selected_shape = None;
    self.transform.reset();
    self.input.clear();
    self.locked = false;
    self.feedback = None;
    self.set_phase(SessionPhase::SolvingEquation);
    info!(
      target: "session", id = %self.id, level = level.as_u8(),
      a = equation.a, b = equation.b, c = equation.c, h = equation.h, k = equation.k,
      "Challenge started"
    );
    Outcome::default()
  }

  /// Back to the algebra step with the same equation.
  pub fn restart_equation(&mut self) -> Option<Outcome> {
    self.equation?;
    self.wrong_attempts = 0;
    self.graph_attempts = 0;
    self.selected_shape = None;
    self.transform.reset();
    self.input.clear();
    self.locked = false;
    self.feedback = None;
    self.set_phase(SessionPhase::SolvingEquation);
    Some(Outcome::default())
  }

  /// Global reset: back to the main screen from any state. Pending timers
  /// die on the epoch bump.
  pub fn reset_to_main(&mut self) -> Outcome {
    self.equation = None;
    self.wrong_attempts = 0;
    self.graph_attempts = 0;
    self.selected_shape = None;
    self.transform.reset();
    self.input.clear();
    self.locked = false;
    self.feedback = None;
    self.set_phase(SessionPhase::Main);
    Outcome::default()
  }

  /// Evaluate a composed answer. `None` outside the algebra phase.
  pub fn submit_answer(&mut self, blocks: Vec<InputBlock>, cfg: &TrainerConfig) -> Option<AnswerOutcome> {
    if self.phase != SessionPhase::SolvingEquation {
      return None;
    }
    let eq = self.equation?;
    if self.locked {
      return Some(AnswerOutcome {
        accepted: false,
        correct: false,
        no_match: false,
        breakdown: None,
        revealed: None,
        outcome: Outcome::default(),
      });
    }

    let text = format::blocks_to_string(&blocks);
    self.input = blocks;
    let candidate = parser::parse(&text, self.level);
    let no_match = candidate.is_none();
    let breakdown = candidate
      .map(|c| validator::check(&c, &eq, self.level))
      .unwrap_or_else(FieldBreakdown::all_wrong);

    if breakdown.is_correct() {
      self.locked = true;
      let feedback = self.put_feedback(FeedbackKind::Success, cfg.messages.answer_correct.clone());
      info!(target: "session", id = %self.id, input = %text, "Answer correct");
      return Some(AnswerOutcome {
        accepted: true,
        correct: true,
        no_match,
        breakdown: Some(breakdown),
        revealed: None,
        outcome: Outcome {
          feedback: Some(feedback),
          toast: None,
          scheduled: vec![self.schedule(cfg.timing.answer_advance_ms, DelayedAction::AdvanceToGraph)],
        },
      });
    }

    self.wrong_attempts += 1;
    info!(
      target: "session", id = %self.id, input = %text, attempts = self.wrong_attempts, no_match,
      "Answer wrong"
    );

    let (feedback, revealed, scheduled) = if self.wrong_attempts == 1 {
      (
        self.put_feedback(FeedbackKind::Error, cfg.messages.answer_wrong_first.clone()),
        None,
        Vec::new(),
      )
    } else if self.wrong_attempts >= 5 {
      // Reveal the full vertex form, then autofill and auto-advance. The
      // lock makes the reveal fire at most once per challenge.
      self.locked = true;
      let answer = format::vertex_form(&eq, self.level);
      let text = fill_template(&cfg.messages.answer_reveal, &[("answer", answer.as_str())]);
      (
        self.put_feedback(FeedbackKind::Warning, text),
        Some(answer),
        vec![self.schedule(cfg.timing.reveal_autofill_ms, DelayedAction::AutofillAnswer)],
      )
    } else {
      (
        self.put_feedback(FeedbackKind::Warning, cfg.messages.answer_wrong_partial.clone()),
        None,
        Vec::new(),
      )
    };

    Some(AnswerOutcome {
      accepted: true,
      correct: false,
      no_match,
      breakdown: Some(breakdown),
      revealed,
      outcome: Outcome { feedback: Some(feedback), toast: None, scheduled },
    })
  }

  /// Shape pick in the ShapeSelection step. Unlimited retries, no counter.
  pub fn select_shape(&mut self, shape: Shape, cfg: &TrainerConfig) -> Option<ShapeOutcome> {
    if self.phase != SessionPhase::ShapeSelection {
      return None;
    }
    let eq = self.equation?;
    // a > 0 opens upward (∪) → the "down" card is the match; a < 0 → "up".
    let correct = (eq.a > 0 && shape == Shape::Down) || (eq.a < 0 && shape == Shape::Up);
    if correct {
      self.selected_shape = Some(shape);
      Some(ShapeOutcome {
        correct: true,
        notice: None,
        outcome: Outcome {
          feedback: None,
          toast: None,
          scheduled: vec![self.schedule(cfg.timing.shape_advance_ms, DelayedAction::AdvanceToMultiplier)],
        },
      })
    } else {
      self.selected_shape = None;
      Some(ShapeOutcome {
        correct: false,
        notice: Some(cfg.messages.shape_wrong.clone()),
        outcome: Outcome::default(),
      })
    }
  }

  /// Multiplier check: the y-stretch from `±x²` to the target, i.e. `|a|`.
  /// The caller has already rejected non-positive or non-numeric input.
  pub fn submit_multiplier(&mut self, value: f64, cfg: &TrainerConfig) -> Option<MultiplierOutcome> {
    if self.phase != SessionPhase::MultiplierCheck {
      return None;
    }
    let eq = self.equation?;
    if validator::multiplier_matches(value, &eq) {
      Some(MultiplierOutcome {
        correct: true,
        notice: None,
        outcome: Outcome {
          feedback: None,
          toast: Some(cfg.messages.multiplier_correct.clone()),
          scheduled: vec![self.schedule(cfg.timing.multiplier_advance_ms, DelayedAction::AdvanceToMovement)],
        },
      })
    } else {
      Some(MultiplierOutcome {
        correct: false,
        notice: Some(cfg.messages.multiplier_wrong.clone()),
        outcome: Outcome::default(),
      })
    }
  }

  /// Accumulate a directional nudge. Returns the updated transform.
  pub fn apply_move(&mut self, direction: Direction, amount: f64) -> Option<GraphTransform> {
    if !self.phase.is_movement() {
      return None;
    }
    self.transform.apply(direction, amount);
    debug!(
      target: "session", id = %self.id, ?direction, amount,
      h = self.transform.h, k = self.transform.k, "Move applied"
    );
    Some(self.transform)
  }

  /// Check the accumulated translation against the target vertex.
  pub fn submit_movement(&mut self, cfg: &TrainerConfig) -> Option<MovementOutcome> {
    if !self.phase.is_movement() {
      return None;
    }
    let eq = self.equation?;
    let h_correct = validator::within(self.transform.h, eq.h, MOVEMENT_TOLERANCE);
    let k_correct = validator::within(self.transform.k, eq.k, MOVEMENT_TOLERANCE);
    let retry = self.phase == SessionPhase::RetryMovement;
    self.graph_attempts += 1;
    info!(
      target: "session", id = %self.id, h_correct, k_correct, retry,
      attempts = self.graph_attempts, "Movement checked"
    );

    if h_correct && k_correct {
      let text = if retry {
        cfg.messages.movement_retry_success.clone()
      } else {
        cfg.messages.movement_first_success.clone()
      };
      let feedback = self.put_feedback(FeedbackKind::Success, text);
      return Some(MovementOutcome {
        correct: true,
        h_correct,
        k_correct,
        retry,
        outcome: Outcome {
          feedback: Some(feedback),
          toast: None,
          scheduled: vec![self.schedule(cfg.timing.success_advance_ms, DelayedAction::AdvanceToSuccess)],
        },
      });
    }

    let axis = if h_correct {
      cfg.messages.movement_h_only.as_str()
    } else if k_correct {
      cfg.messages.movement_k_only.as_str()
    } else {
      cfg.messages.movement_both_wrong.as_str()
    };

    let (feedback, scheduled) = if self.graph_attempts == 1 {
      (
        self.put_feedback(FeedbackKind::Warning, format!("{}{}", axis, cfg.messages.movement_try_again)),
        Vec::new(),
      )
    } else if !retry {
      // Second failure outside the retry phase: announce the reset, then
      // start over from the unshifted graph. One retry cycle only.
      (
        self.put_feedback(FeedbackKind::Info, format!("{}{}", axis, cfg.messages.movement_enter_retry)),
        vec![self.schedule(cfg.timing.retry_reset_ms, DelayedAction::BeginRetry)],
      )
    } else {
      (
        self.put_feedback(FeedbackKind::Warning, format!("{}{}", axis, cfg.messages.movement_try_again)),
        Vec::new(),
      )
    };

    Some(MovementOutcome {
      correct: false,
      h_correct,
      k_correct,
      retry,
      outcome: Outcome { feedback: Some(feedback), toast: None, scheduled },
    })
  }

  /// Apply a delayed action iff its token is still the current epoch.
  pub fn fire(&mut self, token: u64, action: DelayedAction, cfg: &TrainerConfig) -> Option<Outcome> {
    if token != self.epoch {
      debug!(
        target: "session", id = %self.id, ?action, token, epoch = self.epoch,
        "Dropping stale scheduled action"
      );
      return None;
    }
    match action {
      DelayedAction::AdvanceToGraph => Some(self.enter_graph_phase(cfg)),
      DelayedAction::AutofillAnswer => {
        let eq = self.equation?;
        self.input = format::canonical_blocks(&eq, self.level);
        Some(Outcome {
          feedback: None,
          toast: None,
          scheduled: vec![self.schedule(cfg.timing.autofill_advance_ms, DelayedAction::AdvanceToGraph)],
        })
      }
      DelayedAction::AdvanceToMultiplier => {
        self.set_phase(SessionPhase::MultiplierCheck);
        Some(Outcome::default())
      }
      DelayedAction::AdvanceToMovement => {
        self.transform.reset();
        self.set_phase(SessionPhase::Movement);
        let feedback = self.movement_goal(cfg)?;
        Some(Outcome { feedback: Some(feedback), toast: None, scheduled: Vec::new() })
      }
      DelayedAction::BeginRetry => {
        self.transform.reset();
        self.set_phase(SessionPhase::RetryMovement);
        let eq = self.equation?;
        let base = format::base_graph(&eq, self.level);
        let text = fill_template(&cfg.messages.retry_intro, &[("base", base.as_str())]);
        let feedback = self.put_feedback(FeedbackKind::Info, text);
        Some(Outcome { feedback: Some(feedback), toast: None, scheduled: Vec::new() })
      }
      DelayedAction::AdvanceToSuccess => {
        self.set_phase(SessionPhase::Success);
        let text = match self.level {
          Level::One => cfg.messages.success_level1.clone(),
          Level::Two => cfg.messages.success_level2.clone(),
        };
        let feedback = self.put_feedback(FeedbackKind::Success, text);
        Some(Outcome { feedback: Some(feedback), toast: None, scheduled: Vec::new() })
      }
    }
  }

  // ----- internals -----

  fn enter_graph_phase(&mut self, cfg: &TrainerConfig) -> Outcome {
    self.graph_attempts = 0;
    self.selected_shape = None;
    self.transform.reset();
    self.locked = false;
    match self.level {
      Level::One => {
        self.set_phase(SessionPhase::Movement);
        let feedback = self.movement_goal(cfg);
        Outcome { feedback, toast: None, scheduled: Vec::new() }
      }
      Level::Two => {
        self.set_phase(SessionPhase::ShapeSelection);
        self.feedback = None;
        Outcome::default()
      }
    }
  }

  fn movement_goal(&mut self, cfg: &TrainerConfig) -> Option<Feedback> {
    let eq = self.equation?;
    let base = format::base_graph(&eq, self.level);
    let target = format::standard_form(&eq);
    let text = fill_template(
      &cfg.messages.movement_goal,
      &[("base", base.as_str()), ("target", target.as_str())],
    );
    Some(self.put_feedback(FeedbackKind::Info, text))
  }

  fn set_phase(&mut self, phase: SessionPhase) {
    self.phase = phase;
    self.epoch += 1;
    info!(target: "session", id = %self.id, ?phase, epoch = self.epoch, "Phase entered");
  }

  fn schedule(&self, delay_ms: u64, action: DelayedAction) -> Scheduled {
    Scheduled { token: self.epoch, delay: Duration::from_millis(delay_ms), action }
  }

  fn put_feedback(&mut self, kind: FeedbackKind, text: String) -> Feedback {
    let f = Feedback::new(kind, text);
    self.feedback = Some(f.clone());
    f
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::BlockKind;

  fn cfg() -> TrainerConfig {
    TrainerConfig::default()
  }

  fn raw_blocks(s: &str) -> Vec<InputBlock> {
    vec![InputBlock::new(s, BlockKind::Number)]
  }

  /// Fire only the first scheduled action of an outcome, as the timer layer
  /// would (ignoring the delay).
  fn drain_one(session: &mut Session, outcome: Outcome, cfg: &TrainerConfig) {
    let sch = outcome.scheduled[0];
    session.fire(sch.token, sch.action, cfg).expect("scheduled action fires");
  }

  #[test]
  fn level1_happy_path() {
    let cfg = cfg();
    let mut s = Session::new("t");
    let eq = Equation::new(1, -4, -1); // h = 2, k = -5
    s.start_with(Level::One, eq, &cfg);
    assert_eq!(s.phase(), SessionPhase::SolvingEquation);

    let out = s.submit_answer(raw_blocks("(x-2)²-5"), &cfg).expect("in phase");
    assert!(out.accepted && out.correct && !out.no_match);
    assert_eq!(out.outcome.scheduled.len(), 1);
    let sch = out.outcome.scheduled[0];
    assert_eq!(sch.action, DelayedAction::AdvanceToGraph);
    assert_eq!(sch.delay, Duration::from_millis(2000));

    // level 1 skips shape/multiplier entirely
    s.fire(sch.token, sch.action, &cfg).expect("fires");
    assert_eq!(s.phase(), SessionPhase::Movement);
    assert_eq!(s.render_params(), (1.0, 0.0, 0.0));

    s.apply_move(Direction::Right, 2.0).unwrap();
    s.apply_move(Direction::Down, 5.0).unwrap();
    let mv = s.submit_movement(&cfg).expect("in phase");
    assert!(mv.correct && !mv.retry);
    assert_eq!(mv.outcome.scheduled[0].action, DelayedAction::AdvanceToSuccess);

    let out = s.fire(mv.outcome.scheduled[0].token, DelayedAction::AdvanceToSuccess, &cfg).expect("fires");
    assert_eq!(s.phase(), SessionPhase::Success);
    assert_eq!(out.feedback.expect("copy").text, cfg.messages.success_level1);
  }

  #[test]
  fn wrong_answer_escalation_reveals_once() {
    let cfg = cfg();
    let mut s = Session::new("t");
    let eq = Equation::new(1, -4, -1);
    s.start_with(Level::One, eq, &cfg);

    // 1st wrong: generic retry
    let out = s.submit_answer(raw_blocks("(x+2)²-5"), &cfg).unwrap();
    assert!(!out.correct && out.revealed.is_none());
    assert_eq!(out.outcome.feedback.as_ref().unwrap().kind, FeedbackKind::Error);

    // 2nd–4th wrong: partial feedback with a field breakdown
    for _ in 0..3 {
      let out = s.submit_answer(raw_blocks("(x+2)²-5"), &cfg).unwrap();
      assert_eq!(out.outcome.feedback.as_ref().unwrap().kind, FeedbackKind::Warning);
      let b = out.breakdown.expect("breakdown");
      assert!(!b.h_ok && b.k_ok, "only h differs in this wrong answer");
      assert!(out.revealed.is_none());
    }

    // 5th wrong: reveal fires, with the true vertex form
    let out = s.submit_answer(raw_blocks("(x+2)²-5"), &cfg).unwrap();
    assert_eq!(s.wrong_attempts(), 5);
    assert_eq!(out.revealed.as_deref(), Some("$(x - 2)^2 - 5$"));
    let sch = out.outcome.scheduled[0];
    assert_eq!(sch.action, DelayedAction::AutofillAnswer);
    assert_eq!(sch.delay, Duration::from_millis(3000));

    // further submissions are ignored; no second reveal
    let out = s.submit_answer(raw_blocks("(x+2)²-5"), &cfg).unwrap();
    assert!(!out.accepted);
    assert_eq!(s.wrong_attempts(), 5);

    // autofill populates the canonical blocks, then advances to the graph
    let out = s.fire(sch.token, sch.action, &cfg).expect("fires");
    assert_eq!(format::blocks_to_string(s.input()), "(x-2)²-5");
    let adv = out.scheduled[0];
    assert_eq!(adv.action, DelayedAction::AdvanceToGraph);
    assert_eq!(adv.delay, Duration::from_millis(2000));
    s.fire(adv.token, adv.action, &cfg).expect("fires");
    assert_eq!(s.phase(), SessionPhase::Movement);
  }

  #[test]
  fn correct_answer_locks_the_phase() {
    let cfg = cfg();
    let mut s = Session::new("t");
    s.start_with(Level::One, Equation::new(1, 2, 3), &cfg); // h = -1, k = 2
    let out = s.submit_answer(raw_blocks("(x+1)²+2"), &cfg).unwrap();
    assert!(out.correct);
    let out = s.submit_answer(raw_blocks("(x+1)²+2"), &cfg).unwrap();
    assert!(!out.accepted);
    assert_eq!(s.wrong_attempts(), 0);
  }

  #[test]
  fn level2_shape_and_multiplier_flow() {
    let cfg = cfg();
    let mut s = Session::new("t");
    let eq = Equation::new(-2, 4, 3); // h = -1, k = 5
    s.start_with(Level::Two, eq, &cfg);

    let out = s.submit_answer(raw_blocks("-2(x+1)²+5"), &cfg).unwrap();
    assert!(out.correct);
    drain_one(&mut s, out.outcome, &cfg);
    assert_eq!(s.phase(), SessionPhase::ShapeSelection);

    // a < 0: the ∩ ("up") card is correct; "down" is a blocking notice
    let wrong = s.select_shape(Shape::Down, &cfg).unwrap();
    assert!(!wrong.correct && wrong.notice.is_some());
    assert_eq!(s.selected_shape(), None);
    assert!(wrong.outcome.scheduled.is_empty());

    let right = s.select_shape(Shape::Up, &cfg).unwrap();
    assert!(right.correct);
    let sch = right.outcome.scheduled[0];
    assert_eq!(sch.delay, Duration::from_millis(300));
    s.fire(sch.token, sch.action, &cfg).expect("fires");
    assert_eq!(s.phase(), SessionPhase::MultiplierCheck);

    let wrong = s.submit_multiplier(3.0, &cfg).unwrap();
    assert!(!wrong.correct && wrong.notice.is_some());

    let right = s.submit_multiplier(2.0, &cfg).unwrap();
    assert!(right.correct);
    assert_eq!(right.outcome.toast.as_deref(), Some(cfg.messages.multiplier_correct.as_str()));
    let sch = right.outcome.scheduled[0];
    assert_eq!(sch.delay, Duration::from_millis(1500));
    s.fire(sch.token, sch.action, &cfg).expect("fires");
    assert_eq!(s.phase(), SessionPhase::Movement);
    assert_eq!(s.render_params(), (-2.0, 0.0, 0.0));

    s.apply_move(Direction::Left, 1.0).unwrap();
    s.apply_move(Direction::Up, 5.0).unwrap();
    let mv = s.submit_movement(&cfg).unwrap();
    assert!(mv.correct && !mv.retry);
  }

  #[test]
  fn graph_retry_flow() {
    let cfg = cfg();
    let mut s = Session::new("t");
    let eq = Equation::new(1, -4, -1); // h = 2, k = -5
    s.start_with(Level::One, eq, &cfg);
    let out = s.submit_answer(raw_blocks("(x-2)²-5"), &cfg).unwrap();
    drain_one(&mut s, out.outcome, &cfg);
    assert_eq!(s.phase(), SessionPhase::Movement);

    // first failure: immediate retry feedback, nothing scheduled
    s.apply_move(Direction::Right, 1.0).unwrap();
    let mv = s.submit_movement(&cfg).unwrap();
    assert!(!mv.correct);
    assert!(mv.outcome.scheduled.is_empty());
    assert_eq!(s.graph_attempts(), 1);

    // second failure: retry phase is scheduled, transform resets on fire
    let mv = s.submit_movement(&cfg).unwrap();
    assert!(!mv.correct && !mv.retry);
    let sch = mv.outcome.scheduled[0];
    assert_eq!(sch.action, DelayedAction::BeginRetry);
    assert_eq!(sch.delay, Duration::from_millis(2000));
    s.fire(sch.token, sch.action, &cfg).expect("fires");
    assert_eq!(s.phase(), SessionPhase::RetryMovement);
    assert_eq!(s.transform(), GraphTransform::default());

    // failing inside retry never schedules a nested retry
    s.apply_move(Direction::Left, 3.0).unwrap();
    let mv = s.submit_movement(&cfg).unwrap();
    assert!(!mv.correct && mv.retry);
    assert!(mv.outcome.scheduled.is_empty());

    // success from retry reports the retry phrasing
    s.apply_move(Direction::Right, 5.0).unwrap();
    s.apply_move(Direction::Down, 5.0).unwrap();
    let mv = s.submit_movement(&cfg).unwrap();
    assert!(mv.correct && mv.retry);
    assert_eq!(
      mv.outcome.feedback.unwrap().text,
      cfg.messages.movement_retry_success
    );
  }

  #[test]
  fn movement_tolerance_boundary() {
    let cfg = cfg();
    let mut s = Session::new("t");
    let eq = Equation::new(1, -4, 0); // h = 2, k = -4
    s.start_with(Level::One, eq, &cfg);
    let out = s.submit_answer(raw_blocks("(x-2)²-4"), &cfg).unwrap();
    drain_one(&mut s, out.outcome, &cfg);

    s.apply_move(Direction::Right, 2.0999).unwrap();
    s.apply_move(Direction::Down, 4.0999).unwrap();
    let mv = s.submit_movement(&cfg).unwrap();
    assert!(mv.h_correct && mv.k_correct, "0.0999 off is within tolerance");

    s.apply_move(Direction::Left, 0.0999).unwrap();
    s.apply_move(Direction::Right, 0.1001).unwrap();
    let mv = s.submit_movement(&cfg).unwrap();
    assert!(!mv.h_correct, "0.1001 off is outside tolerance");
  }

  #[test]
  fn partial_axis_feedback_names_the_right_axis() {
    let cfg = cfg();
    let mut s = Session::new("t");
    let eq = Equation::new(1, -4, -1); // h = 2, k = -5
    s.start_with(Level::One, eq, &cfg);
    let out = s.submit_answer(raw_blocks("(x-2)²-5"), &cfg).unwrap();
    drain_one(&mut s, out.outcome, &cfg);

    s.apply_move(Direction::Right, 2.0).unwrap(); // h right, k wrong
    let mv = s.submit_movement(&cfg).unwrap();
    assert!(mv.h_correct && !mv.k_correct);
    let text = mv.outcome.feedback.unwrap().text;
    assert!(text.starts_with(&cfg.messages.movement_h_only));
  }

  #[test]
  fn stale_epoch_fire_is_a_noop() {
    let cfg = cfg();
    let mut s = Session::new("t");
    s.start_with(Level::One, Equation::new(1, 2, 3), &cfg);
    let out = s.submit_answer(raw_blocks("(x+1)²+2"), &cfg).unwrap();
    let sch = out.outcome.scheduled[0];

    s.reset_to_main();
    assert_eq!(s.phase(), SessionPhase::Main);
    assert!(s.fire(sch.token, sch.action, &cfg).is_none());
    assert_eq!(s.phase(), SessionPhase::Main, "stale timer must not advance a reset session");
  }

  #[test]
  fn out_of_phase_operations_are_ignored() {
    let cfg = cfg();
    let mut s = Session::new("t");
    assert!(s.select_shape(Shape::Up, &cfg).is_none());
    assert!(s.submit_movement(&cfg).is_none());
    assert!(s.apply_move(Direction::Up, 1.0).is_none());
    assert!(s.submit_answer(raw_blocks("(x-1)²"), &cfg).is_none());

    s.start_with(Level::One, Equation::new(1, 2, 3), &cfg);
    assert!(s.select_shape(Shape::Up, &cfg).is_none(), "no shape step at level 1");
    assert!(s.submit_movement(&cfg).is_none(), "not in the movement phase yet");
  }

  #[test]
  fn reset_clears_everything() {
    let cfg = cfg();
    let mut s = Session::new("t");
    s.start_with(Level::Two, Equation::new(2, 4, 1), &cfg);
    s.submit_answer(raw_blocks("junk"), &cfg).unwrap();
    s.reset_to_main();
    assert_eq!(s.phase(), SessionPhase::Main);
    assert!(s.equation().is_none());
    assert_eq!(s.wrong_attempts(), 0);
    assert_eq!(s.graph_attempts(), 0);
    assert!(s.input().is_empty());
    assert!(s.feedback().is_none());
    assert_eq!(s.transform(), GraphTransform::default());
  }

  #[test]
  fn restart_keeps_the_equation() {
    let cfg = cfg();
    let mut s = Session::new("t");
    let eq = Equation::new(1, -4, -1);
    s.start_with(Level::One, eq, &cfg);
    s.submit_answer(raw_blocks("junk"), &cfg).unwrap();
    s.restart_equation().expect("has an equation");
    assert_eq!(s.phase(), SessionPhase::SolvingEquation);
    assert_eq!(s.wrong_attempts(), 0);
    assert_eq!(s.equation().map(|e| (e.a, e.b, e.c)), Some((1, -4, -1)));

    let mut fresh = Session::new("t2");
    assert!(fresh.restart_equation().is_none());
  }

  #[test]
  fn no_match_counts_as_a_wrong_attempt() {
    let cfg = cfg();
    let mut s = Session::new("t");
    s.start_with(Level::One, Equation::new(1, 2, 3), &cfg);
    let out = s.submit_answer(raw_blocks("x²+2x+3"), &cfg).unwrap();
    assert!(out.no_match && !out.correct);
    assert_eq!(s.wrong_attempts(), 1);
    let b = out.breakdown.unwrap();
    assert!(!b.a_ok && !b.h_ok && !b.k_ok);
  }
}
