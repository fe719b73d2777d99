//! Canonical vertex-form answer parsing.
//!
//! The learner composes an answer from symbolic blocks; the concatenated,
//! whitespace-free string is recognized against a fixed catalogue:
//!
//!   level 1:  (x<sign>P)²  [<sign>Q]
//!   level 2:  [-|N|-N] (x<sign>P)²  [<sign>Q]
//!
//! `P`/`Q` are positive decimals or `p/q` fractions; the optional leading
//! coefficient is an integer literal. Nothing outside the catalogue is
//! simplified or rescued: a bare `x²`, an expanded form, or trailing garbage
//! all come back as no match, which the session folds into the ordinary
//! wrong-answer flow.
//!
//! Implemented as a tokenizer plus recursive descent into a small AST, then
//! a `(a, h, k)` derivation: `(x+P)² → h = -P`, `(x-P)² → h = +P`, trailing
//! `±Q → k = ±Q`, absent → `k = 0`.

use crate::domain::{Level, VertexCandidate};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
  Plus,
  Minus,
  LParen,
  RParen,
  X,
  Squared,
  /// `integral` is true for plain digit runs; only those are allowed as a
  /// leading coefficient.
  Number { value: f64, integral: bool },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Sign {
  Plus,
  Minus,
}

impl Sign {
  fn apply(self, v: f64) -> f64 {
    match self {
      Sign::Plus => v,
      Sign::Minus => -v,
    }
  }
}

/// Typed form of a recognized answer, before numeric derivation.
#[derive(Clone, Copy, Debug)]
struct VertexAst {
  leading: f64,
  inner_sign: Sign,
  p: f64,
  trailing: Option<(Sign, f64)>,
}

impl VertexAst {
  fn candidate(&self) -> VertexCandidate {
    let h = match self.inner_sign {
      Sign::Plus => -self.p,
      Sign::Minus => self.p,
    };
    let k = self.trailing.map(|(s, q)| s.apply(q)).unwrap_or(0.0);
    VertexCandidate { a: self.leading, h, k }
  }
}

/// Parse a normalized learner answer. `None` means "no template matched" —
/// an expected outcome for malformed or incomplete input, not an error.
pub fn parse(input: &str, level: Level) -> Option<VertexCandidate> {
  let tokens = lex(input)?;
  let mut cur = Cursor { tokens: &tokens, pos: 0 };

  let leading = match level {
    Level::One => 1.0,
    Level::Two => parse_leading(&mut cur)?,
  };

  cur.eat(&Token::LParen)?;
  cur.eat(&Token::X)?;
  let inner_sign = cur.sign()?;
  let p = cur.number()?;
  cur.eat(&Token::RParen)?;
  cur.eat(&Token::Squared)?;

  let trailing = if cur.at_end() {
    None
  } else {
    let sign = cur.sign()?;
    let q = cur.number()?;
    if !cur.at_end() {
      return None;
    }
    Some((sign, q))
  };

  let ast = VertexAst { leading, inner_sign, p, trailing };
  Some(ast.candidate())
}

/// Leading coefficient at level 2: absent → 1, `-` → -1, integer → value,
/// `-` integer → negated value. Fractional/decimal coefficients are not in
/// the catalogue.
fn parse_leading(cur: &mut Cursor) -> Option<f64> {
  match (cur.peek(), cur.peek_at(1)) {
    (Some(Token::Minus), Some(Token::Number { value, integral: true })) => {
      cur.pos += 2;
      Some(-value)
    }
    (Some(Token::Minus), Some(Token::LParen)) => {
      cur.pos += 1;
      Some(-1.0)
    }
    (Some(Token::Number { value, integral: true }), Some(Token::LParen)) => {
      cur.pos += 1;
      Some(value)
    }
    (Some(Token::LParen), _) => Some(1.0),
    _ => None,
  }
}

struct Cursor<'a> {
  tokens: &'a [Token],
  pos: usize,
}

impl Cursor<'_> {
  fn peek(&self) -> Option<Token> {
    self.tokens.get(self.pos).copied()
  }

  fn peek_at(&self, off: usize) -> Option<Token> {
    self.tokens.get(self.pos + off).copied()
  }

  fn at_end(&self) -> bool {
    self.pos >= self.tokens.len()
  }

  fn eat(&mut self, want: &Token) -> Option<()> {
    if self.peek()? == *want {
      self.pos += 1;
      Some(())
    } else {
      None
    }
  }

  fn sign(&mut self) -> Option<Sign> {
    let s = match self.peek()? {
      Token::Plus => Sign::Plus,
      Token::Minus => Sign::Minus,
      _ => return None,
    };
    self.pos += 1;
    Some(s)
  }

  fn number(&mut self) -> Option<f64> {
    match self.peek()? {
      Token::Number { value, .. } => {
        self.pos += 1;
        Some(value)
      }
      _ => None,
    }
  }
}

fn lex(input: &str) -> Option<Vec<Token>> {
  let chars: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
  let mut tokens = Vec::new();
  let mut i = 0;
  while i < chars.len() {
    match chars[i] {
      '+' => {
        tokens.push(Token::Plus);
        i += 1;
      }
      '-' => {
        tokens.push(Token::Minus);
        i += 1;
      }
      '(' => {
        tokens.push(Token::LParen);
        i += 1;
      }
      ')' => {
        tokens.push(Token::RParen);
        i += 1;
      }
      'x' => {
        tokens.push(Token::X);
        i += 1;
      }
      '²' => {
        tokens.push(Token::Squared);
        i += 1;
      }
      c if c.is_ascii_digit() || c == '.' => {
        let (tok, next) = lex_number(&chars, i)?;
        tokens.push(tok);
        i = next;
      }
      _ => return None,
    }
  }
  Some(tokens)
}

/// A positive literal: digit run with optional decimal point, optionally
/// followed by `/` and another such run (evaluated in floating point).
fn lex_number(chars: &[char], start: usize) -> Option<(Token, usize)> {
  let mut i = start;
  let num = scan_decimal(chars, &mut i)?;
  if i < chars.len() && chars[i] == '/' {
    i += 1;
    let den = scan_decimal(chars, &mut i)?;
    Some((Token::Number { value: num / den, integral: false }, i))
  } else {
    let integral = chars[start..i].iter().all(|c| c.is_ascii_digit());
    Some((Token::Number { value: num, integral }, i))
  }
}

fn scan_decimal(chars: &[char], i: &mut usize) -> Option<f64> {
  let start = *i;
  while *i < chars.len() && (chars[*i].is_ascii_digit() || chars[*i] == '.') {
    *i += 1;
  }
  let s: String = chars[start..*i].iter().collect();
  s.parse::<f64>().ok()
}

/// Parse a standalone signed amount (decimal or `p/q` fraction), as entered
/// in the multiplier and move-amount fields. `None` for non-numeric input.
pub fn parse_amount(s: &str) -> Option<f64> {
  let s = s.trim();
  let (sign, rest) = match s.strip_prefix('-') {
    Some(rest) => (-1.0, rest),
    None => (1.0, s.strip_prefix('+').unwrap_or(s)),
  };
  if rest.is_empty() {
    return None;
  }
  let value = if let Some((num, den)) = rest.split_once('/') {
    num.trim().parse::<f64>().ok()? / den.trim().parse::<f64>().ok()?
  } else {
    rest.parse::<f64>().ok()?
  };
  if value.is_finite() {
    Some(sign * value)
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn p1(s: &str) -> Option<VertexCandidate> {
    parse(s, Level::One)
  }

  fn p2(s: &str) -> Option<VertexCandidate> {
    parse(s, Level::Two)
  }

  #[test]
  fn level1_templates() {
    assert_eq!(p1("(x-2)²-5"), Some(VertexCandidate { a: 1.0, h: 2.0, k: -5.0 }));
    assert_eq!(p1("(x+3)²+4"), Some(VertexCandidate { a: 1.0, h: -3.0, k: 4.0 }));
    assert_eq!(p1("(x+5)²"), Some(VertexCandidate { a: 1.0, h: -5.0, k: 0.0 }));
    assert_eq!(p1("(x-1)²"), Some(VertexCandidate { a: 1.0, h: 1.0, k: 0.0 }));
  }

  #[test]
  fn fractions_and_decimals() {
    let c = p1("(x-2)²-21/4").expect("match");
    assert_eq!(c.k, -5.25);
    let c = p1("(x+1/2)²+0.75").expect("match");
    assert_eq!(c.h, -0.5);
    assert_eq!(c.k, 0.75);
  }

  #[test]
  fn level2_leading_coefficients() {
    assert_eq!(p2("2(x-1)²+3"), Some(VertexCandidate { a: 2.0, h: 1.0, k: 3.0 }));
    assert_eq!(p2("-2(x+1)²+5"), Some(VertexCandidate { a: -2.0, h: -1.0, k: 5.0 }));
    assert_eq!(p2("-(x-3)²-4"), Some(VertexCandidate { a: -1.0, h: 3.0, k: -4.0 }));
    assert_eq!(p2("(x+2)²-7"), Some(VertexCandidate { a: 1.0, h: -2.0, k: -7.0 }));
    assert_eq!(p2("5(x-3)²"), Some(VertexCandidate { a: 5.0, h: 3.0, k: 0.0 }));
  }

  #[test]
  fn level1_rejects_leading_coefficient() {
    assert_eq!(p1("2(x-1)²+3"), None);
    assert_eq!(p1("-(x-1)²"), None);
  }

  #[test]
  fn catalogue_is_closed() {
    // Bare squared form without a sign marker is not in the catalogue.
    assert_eq!(p1("x²"), None);
    assert_eq!(p1("(x)²"), None);
    // Expanded (non-canonical) input is never recognized.
    assert_eq!(p1("x²-4x-1"), None);
    // Structural junk
    assert_eq!(p1("(x-2)²-"), None);
    assert_eq!(p1("(x-2)-5"), None);
    assert_eq!(p1("(x-2)²-5+"), None);
    assert_eq!(p1("(x-2)²-5-1"), None);
    assert_eq!(p1(""), None);
    assert_eq!(p2("2.5(x-1)²"), None, "leading coefficient must be an integer literal");
    assert_eq!(p2("1/2(x-1)²"), None);
  }

  #[test]
  fn non_numeric_literal_is_no_match() {
    assert_eq!(p1("(x-a)²"), None);
    assert_eq!(p1("(x-1.2.3)²"), None);
  }

  #[test]
  fn amount_parsing() {
    assert_eq!(parse_amount("2"), Some(2.0));
    assert_eq!(parse_amount("-3/2"), Some(-1.5));
    assert_eq!(parse_amount(" 7/4 "), Some(1.75));
    assert_eq!(parse_amount("+0.5"), Some(0.5));
    assert_eq!(parse_amount("abc"), None);
    assert_eq!(parse_amount(""), None);
    assert_eq!(parse_amount("1/0"), None);
  }
}
