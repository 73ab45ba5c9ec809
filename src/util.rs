//! Small utility helpers used across modules.

/// Integer percentage with a zero-denominator guard.
/// A course with no lessons yields 0, never a division error.
pub fn percent(part: usize, total: usize) -> u8 {
  if total == 0 {
    return 0;
  }
  let pct = (part as f64 / total as f64 * 100.0).round();
  pct.clamp(0.0, 100.0) as u8
}

/// Round to two decimal places, as the profile's average score is stored.
pub fn round2(v: f64) -> f64 {
  (v * 100.0).round() / 100.0
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
#[allow(dead_code)]
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}
