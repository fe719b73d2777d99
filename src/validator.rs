//! Tolerance-based answer validation.
//!
//! All comparisons are absolute-tolerance: the coefficient ranges are small
//! and the learner types literal decimals, so relative error adds nothing.

use serde::Serialize;

use crate::domain::{Equation, Level, VertexCandidate};

/// Per-field tolerance for the algebra-phase answer.
pub const ANSWER_TOLERANCE: f64 = 0.01;
/// Tolerance for the multiplier sub-challenge (`|value| vs |a|`).
pub const MULTIPLIER_TOLERANCE: f64 = 0.001;
/// Per-axis tolerance for the graph translation check.
pub const MOVEMENT_TOLERANCE: f64 = 0.1;

pub fn within(x: f64, y: f64, tolerance: f64) -> bool {
  (x - y).abs() < tolerance
}

/// Which fields of the candidate match the target. Used both for the overall
/// verdict and for partial feedback (which fields are wrong, never how to
/// fix them).
#[derive(Clone, Copy, Debug, Serialize)]
pub struct FieldBreakdown {
  pub a_ok: bool,
  pub h_ok: bool,
  pub k_ok: bool,
}

impl FieldBreakdown {
  pub fn all_wrong() -> Self {
    Self { a_ok: false, h_ok: false, k_ok: false }
  }

  pub fn is_correct(&self) -> bool {
    self.a_ok && self.h_ok && self.k_ok
  }
}

/// Compare a parsed candidate against the target. `a` is only compared at
/// level 2; at level 1 it is definitionally 1 and forced to pass.
pub fn check(candidate: &VertexCandidate, target: &Equation, level: Level) -> FieldBreakdown {
  let a_ok = match level {
    Level::One => true,
    Level::Two => within(candidate.a, target.a as f64, ANSWER_TOLERANCE),
  };
  FieldBreakdown {
    a_ok,
    h_ok: within(candidate.h, target.h, ANSWER_TOLERANCE),
    k_ok: within(candidate.k, target.k, ANSWER_TOLERANCE),
  }
}

/// The multiplier question asks for the y-stretch from `±x²`, i.e. `|a|`.
pub fn multiplier_matches(value: f64, target: &Equation) -> bool {
  within(value, (target.a as f64).abs(), MULTIPLIER_TOLERANCE)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scenario_level1() {
    let eq = Equation::new(1, -4, -1);
    let c = VertexCandidate { a: 1.0, h: 2.0, k: -5.0 };
    assert!(check(&c, &eq, Level::One).is_correct());
  }

  #[test]
  fn tolerance_boundary_accepts_0_0099() {
    let eq = Equation::new(-2, 4, 3);
    let c = VertexCandidate { a: -2.0 + 0.0099, h: eq.h + 0.0099, k: eq.k - 0.0099 };
    assert!(check(&c, &eq, Level::Two).is_correct());
  }

  #[test]
  fn tolerance_boundary_rejects_0_0101() {
    let eq = Equation::new(-2, 4, 3);
    for (da, dh, dk) in [(0.0101, 0.0, 0.0), (0.0, 0.0101, 0.0), (0.0, 0.0, 0.0101)] {
      let c = VertexCandidate { a: -2.0 + da, h: eq.h + dh, k: eq.k + dk };
      let b = check(&c, &eq, Level::Two);
      assert!(!b.is_correct(), "delta ({da}, {dh}, {dk}) should fail");
    }
  }

  #[test]
  fn level1_ignores_a() {
    let eq = Equation::new(1, 2, 0);
    let c = VertexCandidate { a: 99.0, h: eq.h, k: eq.k };
    let b = check(&c, &eq, Level::One);
    assert!(b.a_ok && b.is_correct());
  }

  #[test]
  fn multiplier_uses_absolute_value_of_a() {
    let eq = Equation::new(-2, 4, 3);
    assert!(multiplier_matches(2.0, &eq));
    assert!(!multiplier_matches(-2.0, &eq));
    assert!(!multiplier_matches(2.002, &eq));
    assert!(multiplier_matches(2.0009, &eq));
  }
}
