//! Loading trainer configuration (feedback copy + timing) from TOML.
//!
//! See `TrainerConfig`, `Messages`, and `Timing` for the expected schema.
//! Every field has a built-in default, so a partial (or missing) file is fine.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TrainerConfig {
  #[serde(default)]
  pub messages: Messages,
  #[serde(default)]
  pub timing: Timing,
}

/// Learner-facing copy. Templates use `{key}` placeholders filled with
/// `util::fill_template`. Override in TOML to localize or tune the tone.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Messages {
  // Algebra phase
  pub answer_correct: String,
  pub answer_wrong_first: String,
  pub answer_wrong_partial: String,
  pub answer_reveal: String,
  pub answer_locked: String,
  // Shape / multiplier steps
  pub shape_wrong: String,
  pub multiplier_correct: String,
  pub multiplier_wrong: String,
  pub multiplier_invalid: String,
  // Movement phase
  pub move_invalid: String,
  pub movement_goal: String,
  pub movement_first_success: String,
  pub movement_retry_success: String,
  pub movement_h_only: String,
  pub movement_k_only: String,
  pub movement_both_wrong: String,
  pub movement_try_again: String,
  pub movement_enter_retry: String,
  pub retry_intro: String,
  // Success screen
  pub success_level1: String,
  pub success_level2: String,
}

impl Default for Messages {
  fn default() -> Self {
    Self {
      answer_correct: "Correct! 🎉".into(),
      answer_wrong_first: "Not quite. Try again! 🤔".into(),
      answer_wrong_partial: "There is still something to fix. Check the highlighted parts! ❌".into(),
      answer_reveal: "Here is the answer: {answer} 😅 It will be filled in so you can move on to the graph step!".into(),
      answer_locked: "This answer is already accepted — the graph step is coming up.".into(),
      shape_wrong: "Wrong shape! Think about which way the parabola opens.".into(),
      multiplier_correct: "🎉 Correct! Now translate the graph!".into(),
      multiplier_wrong: "Try again!".into(),
      multiplier_invalid: "Please enter a positive number!".into(),
      move_invalid: "Please enter a valid number!".into(),
      movement_goal: "Translate the graph of {base} so that it becomes {target}!".into(),
      movement_first_success: "🎉 Perfect! You nailed it in one go!".into(),
      movement_retry_success: "🎉 Excellent! You got it on the retry!".into(),
      movement_h_only: "👍 The x-axis shift is right, but the y-axis shift is off.".into(),
      movement_k_only: "👍 The y-axis shift is right, but the x-axis shift is off.".into(),
      movement_both_wrong: "❌ Check both the x-axis and y-axis shifts.".into(),
      movement_try_again: " Try again!".into(),
      movement_enter_retry: " Let's take it once more from the start!".into(),
      retry_intro: "🔄 Fresh start! Move the graph of {base} to the target position again!".into(),
      success_level1: "You have completely mastered Level 1!".into(),
      success_level2: "You have completely mastered Level 2!".into(),
    }
  }
}

/// Delays (in milliseconds) for the one-shot auto-advances between phases.
/// These are presentational pacing, not suspensions; every scheduled action
/// carries a phase-entry token and is dropped if the phase changed meanwhile.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
  /// Correct algebra answer → graph phase.
  pub answer_advance_ms: u64,
  /// Reveal feedback → answer autofill.
  pub reveal_autofill_ms: u64,
  /// Answer autofill → graph phase.
  pub autofill_advance_ms: u64,
  /// Correct shape pick → multiplier step.
  pub shape_advance_ms: u64,
  /// Correct multiplier → movement step.
  pub multiplier_advance_ms: u64,
  /// Second failed movement check → retry phase reset.
  pub retry_reset_ms: u64,
  /// Movement success → success screen.
  pub success_advance_ms: u64,
}

impl Default for Timing {
  fn default() -> Self {
    Self {
      answer_advance_ms: 2000,
      reveal_autofill_ms: 3000,
      autofill_advance_ms: 2000,
      shape_advance_ms: 300,
      multiplier_advance_ms: 1500,
      retry_reset_ms: 2000,
      success_advance_ms: 2000,
    }
  }
}

/// Attempt to load `TrainerConfig` from TRAINER_CONFIG_PATH.
/// On any parsing/IO error, returns None and the defaults are used.
pub fn load_trainer_config_from_env() -> Option<TrainerConfig> {
  let path = std::env::var("TRAINER_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<TrainerConfig>(&s) {
      Ok(cfg) => {
        info!(target: "vertex_trainer", %path, "Loaded trainer config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "vertex_trainer", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "vertex_trainer", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_falls_back_to_defaults() {
    let cfg: TrainerConfig = toml::from_str(
      r#"
        [timing]
        answer_advance_ms = 50

        [messages]
        answer_correct = "yes!"
      "#,
    )
    .expect("parse");
    assert_eq!(cfg.timing.answer_advance_ms, 50);
    assert_eq!(cfg.timing.reveal_autofill_ms, 3000);
    assert_eq!(cfg.messages.answer_correct, "yes!");
    assert_eq!(cfg.messages.multiplier_wrong, Messages::default().multiplier_wrong);
  }
}
