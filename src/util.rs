//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
#[allow(dead_code)]
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_fills_all_keys() {
    let out = fill_template("move {base} to {target}", &[("base", "$y = x^2$"), ("target", "$y = x^2 - 4$")]);
    assert_eq!(out, "move $y = x^2$ to $y = x^2 - 4$");
  }
}
