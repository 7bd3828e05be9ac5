//! Small utility helpers used across modules.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Transport encoding for the selected classification (standard base64, padded).
/// Obfuscation only; the service decodes it before comparing.
pub fn encode_selection(selection: &str) -> String {
  STANDARD.encode(selection.as_bytes())
}

/// Inverse of `encode_selection`. None if the input is not base64 or not UTF-8.
pub fn decode_selection(encoded: &str) -> Option<String> {
  let bytes = STANDARD.decode(encoded.trim()).ok()?;
  String::from_utf8(bytes).ok()
}

/// Log-safe truncation for large strings (code samples mostly).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) { cut -= 1; }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

/// Milliseconds since the Unix epoch, used as a cache-busting token.
pub fn cache_buster() -> String {
  std::time::SystemTime::now()
    .duration_since(std::time::UNIX_EPOCH)
    .map(|d| d.as_millis())
    .unwrap_or_default()
    .to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn selection_encoding_matches_btoa() {
    assert_eq!(encode_selection("CWE-89"), "Q1dFLTg5");
    assert_eq!(encode_selection("CWE-121"), "Q1dFLTEyMQ==");
    assert_eq!(decode_selection("Q1dFLTEyMQ==").as_deref(), Some("CWE-121"));
    assert_eq!(decode_selection("not base64!"), None);
  }

  #[test]
  fn template_fills_every_occurrence() {
    let out = fill_template("{n}s then {n}s", &[("n", "30")]);
    assert_eq!(out, "30s then 30s");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let s = "éééé";
    let t = trunc_for_log(s, 3);
    assert!(t.starts_with('é'));
    assert!(t.ends_with("(8 bytes total)"));
    assert_eq!(trunc_for_log("short", 10), "short");
  }
}
