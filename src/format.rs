//! Display formatting for equations and answers.
//!
//! Strings are LaTeX-style (`$y = 2x^2 - 4x + 3$`) so the frontend can hand
//! them straight to its math renderer. Non-integer constants (the
//! quarter-integer `k` values of level 1) are rendered as `p/q` fractions,
//! which the answer parser also accepts back.

use crate::domain::{BlockKind, Equation, InputBlock, Level};

/// Standard form `$y = ax^2 + bx + c$` with the usual sign/one-coefficient
/// elision.
pub fn standard_form(eq: &Equation) -> String {
  let mut out = String::from("$y = ");
  match eq.a {
    1 => out.push_str("x^2"),
    -1 => out.push_str("-x^2"),
    a => out.push_str(&format!("{}x^2", a)),
  }
  push_signed_term(&mut out, eq.b as f64, Some("x"));
  push_signed_term(&mut out, eq.c as f64, None);
  out.push('$');
  out
}

/// The unshifted graph the movement phase starts from: `$y = x^2$` at level
/// 1, `$y = ax^2$` at level 2.
pub fn base_graph(eq: &Equation, level: Level) -> String {
  let a = match level {
    Level::One => 1,
    Level::Two => eq.a,
  };
  match a {
    1 => "$y = x^2$".to_string(),
    -1 => "$y = -x^2$".to_string(),
    a => format!("$y = {}x^2$", a),
  }
}

/// Vertex form `$a(x - h)^2 + k$` (no `y =` prefix), as shown when the
/// answer is revealed after five wrong attempts.
pub fn vertex_form(eq: &Equation, level: Level) -> String {
  let mut out = String::from("$");
  if level == Level::Two {
    match eq.a {
      1 => {}
      -1 => out.push('-'),
      a => out.push_str(&a.to_string()),
    }
  }
  if eq.h == 0.0 {
    out.push_str("x^2");
  } else if eq.h > 0.0 {
    out.push_str(&format!("(x - {})^2", number(eq.h)));
  } else {
    out.push_str(&format!("(x + {})^2", number(-eq.h)));
  }
  push_signed_term(&mut out, eq.k, None);
  out.push('$');
  out
}

/// `$y = a(x - h)^2 + k$`, the movement-phase target display.
pub fn target_vertex(eq: &Equation) -> String {
  let inner = vertex_form(eq, Level::Two);
  format!("$y = {}", &inner[1..])
}

/// The canonical answer as learner input blocks, used to auto-populate the
/// answer after the reveal.
pub fn canonical_blocks(eq: &Equation, level: Level) -> Vec<InputBlock> {
  let mut blocks = Vec::new();
  if level == Level::Two && eq.a != 1 {
    if eq.a == -1 {
      blocks.push(InputBlock::new("-", BlockKind::Operator));
    } else if eq.a < 0 {
      blocks.push(InputBlock::new("-", BlockKind::Operator));
      blocks.push(InputBlock::new((-eq.a).to_string(), BlockKind::Number));
    } else {
      blocks.push(InputBlock::new(eq.a.to_string(), BlockKind::Number));
    }
  }

  blocks.push(InputBlock::new("(", BlockKind::Parenthesis));
  blocks.push(InputBlock::new("x", BlockKind::Variable));
  if eq.h > 0.0 {
    blocks.push(InputBlock::new("-", BlockKind::Operator));
    blocks.push(InputBlock::new(number(eq.h), BlockKind::Number));
  } else if eq.h < 0.0 {
    blocks.push(InputBlock::new("+", BlockKind::Operator));
    blocks.push(InputBlock::new(number(-eq.h), BlockKind::Number));
  }
  blocks.push(InputBlock::new(")", BlockKind::Parenthesis));
  blocks.push(InputBlock::new("²", BlockKind::Power));

  if eq.k > 0.0 {
    blocks.push(InputBlock::new("+", BlockKind::Operator));
    blocks.push(InputBlock::new(number(eq.k), BlockKind::Number));
  } else if eq.k < 0.0 {
    blocks.push(InputBlock::new("-", BlockKind::Operator));
    blocks.push(InputBlock::new(number(-eq.k), BlockKind::Number));
  }
  blocks
}

/// Concatenate blocks into the parser's input string (whitespace-free).
pub fn blocks_to_string(blocks: &[InputBlock]) -> String {
  blocks
    .iter()
    .flat_map(|b| b.value.chars())
    .filter(|c| !c.is_whitespace())
    .collect()
}

/// Render a constant: integers plainly, halves/quarters as reduced
/// fractions, anything else as a trimmed decimal.
pub fn number(v: f64) -> String {
  if v.fract() == 0.0 {
    return format!("{}", v as i64);
  }
  let quarters = v * 4.0;
  if (quarters - quarters.round()).abs() < 1e-9 {
    let mut num = quarters.round() as i64;
    let mut den = 4i64;
    if num % 2 == 0 {
      num /= 2;
      den /= 2;
    }
    return format!("{}/{}", num, den);
  }
  format!("{}", v)
}

fn push_signed_term(out: &mut String, v: f64, suffix: Option<&str>) {
  if v > 0.0 {
    out.push_str(&format!(" + {}", number(v)));
  } else if v < 0.0 {
    out.push_str(&format!(" - {}", number(-v)));
  } else {
    return;
  }
  if let Some(sfx) = suffix {
    out.push_str(sfx);
  }
}
