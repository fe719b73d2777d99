//! Random equation generation honoring the per-level coefficient sets.
//!
//! Every combination in the enumerated sets is a valid challenge, so this is
//! a plain uniform pick with no rejection sampling. The exact vertex follows
//! from the completed-square identity in `Equation::new`.

use rand::Rng;
use tracing::debug;

use crate::domain::{Equation, Level};

/// Level 1: `a = 1`, `b` even and nonzero so `h = -b/2` stays an integer.
const LEVEL1_B: [i32; 10] = [-10, -8, -6, -4, -2, 2, 4, 6, 8, 10];

/// Level 2: `a ≠ 1` and `b = 2a·m` so `h = -m` stays a small integer.
const LEVEL2_A: [i32; 7] = [-4, -3, -2, 2, 3, 4, 5];
const LEVEL2_M: [i32; 6] = [-3, -2, -1, 1, 2, 3];

/// Inclusive range for the constant term at both levels.
const C_MIN: i32 = -15;
const C_MAX: i32 = 15;

pub fn generate(level: Level) -> Equation {
  let mut rng = rand::thread_rng();
  let (a, b) = match level {
    Level::One => {
      let b = LEVEL1_B[rng.gen_range(0..LEVEL1_B.len())];
      (1, b)
    }
    Level::Two => {
      let a = LEVEL2_A[rng.gen_range(0..LEVEL2_A.len())];
      let m = LEVEL2_M[rng.gen_range(0..LEVEL2_M.len())];
      (a, 2 * a * m)
    }
  };
  let c = rng.gen_range(C_MIN..=C_MAX);

  let eq = Equation::new(a, b, c);
  debug!(target: "session", level = level.as_u8(), a, b, c, h = eq.h, k = eq.k, "Generated equation");
  eq
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn level1_constraints_hold() {
    for _ in 0..200 {
      let eq = generate(Level::One);
      assert_eq!(eq.a, 1);
      assert!(eq.b != 0 && eq.b % 2 == 0 && (-10..=10).contains(&eq.b));
      assert!((C_MIN..=C_MAX).contains(&eq.c));
      assert_eq!(eq.h, -(eq.b as f64) / 2.0);
      assert_eq!(eq.h.fract(), 0.0, "h must be an integer at level 1");
      assert_eq!(eq.k, eq.c as f64 - (eq.b * eq.b) as f64 / 4.0);
    }
  }

  #[test]
  fn level2_constraints_hold() {
    for _ in 0..200 {
      let eq = generate(Level::Two);
      assert!(LEVEL2_A.contains(&eq.a));
      assert!((C_MIN..=C_MAX).contains(&eq.c));
      // h = -m for some m in the multiplier set: integer, nonzero, |h| <= 3
      assert_eq!(eq.h.fract(), 0.0);
      let h = eq.h as i32;
      assert!(h != 0 && h.abs() <= 3);
      assert_eq!(eq.k, eq.c as f64 - eq.a as f64 * eq.h * eq.h);
    }
  }
}
