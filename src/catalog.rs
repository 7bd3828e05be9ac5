//! Built-in selector data: difficulties and the vulnerability classes the service draws from.

/// Difficulties the service scores, easiest first.
pub const DIFFICULTIES: [&str; 4] = ["easy", "medium", "hard", "insane"];

/// (id, name) pairs offered in the classification selector.
pub const CWE_CLASSES: [(&str, &str); 34] = [
  ("CWE-20", "Improper Input Validation"),
  ("CWE-120", "Classic Buffer Overflow"),
  ("CWE-121", "Stack Overflow"),
  ("CWE-122", "Heap Overflow"),
  ("CWE-125", "Out-of-bounds Read"),
  ("CWE-129", "Improper Validation of Array Index"),
  ("CWE-190", "Integer Overflow"),
  ("CWE-191", "Integer Underflow"),
  ("CWE-193", "Off-by-one Error"),
  ("CWE-200", "Information Exposure"),
  ("CWE-203", "Observable Discrepancy"),
  ("CWE-269", "Improper Privilege Management"),
  ("CWE-284", "Improper Access Control"),
  ("CWE-287", "Improper Authentication"),
  ("CWE-330", "Insufficiently Random Values"),
  ("CWE-362", "Race Condition"),
  ("CWE-367", "TOCTOU Race Condition"),
  ("CWE-369", "Divide By Zero"),
  ("CWE-401", "Memory Leak"),
  ("CWE-404", "Improper Resource Shutdown"),
  ("CWE-415", "Double Free"),
  ("CWE-416", "Use After Free"),
  ("CWE-476", "NULL Pointer Dereference"),
  ("CWE-667", "Improper Locking"),
  ("CWE-681", "Incorrect Numeric Conversion"),
  ("CWE-682", "Incorrect Calculation"),
  ("CWE-704", "Incorrect Type Conversion"),
  ("CWE-754", "Improper Check for Exceptional Conditions"),
  ("CWE-770", "Allocation without Limits"),
  ("CWE-787", "Out-of-bounds Write"),
  ("CWE-824", "Uninitialized Pointer"),
  ("CWE-835", "Infinite Loop"),
  ("CWE-843", "Type Confusion"),
  ("CWE-908", "Use of Uninitialized Resource"),
];

pub fn is_known_difficulty(d: &str) -> bool {
  DIFFICULTIES.contains(&d)
}

pub fn cwe_name(id: &str) -> Option<&'static str> {
  CWE_CLASSES.iter().find(|(cwe, _)| cwe.eq_ignore_ascii_case(id)).map(|(_, name)| *name)
}

/// Resolve what a user typed into a catalog id.
/// Accepts "CWE-89"-style ids, bare numbers ("416"), or a 1-based catalog index ("#3").
/// Ids outside the catalog are passed through in canonical form; the service decides.
pub fn resolve_selection(input: &str) -> Option<String> {
  let s = input.trim();
  if s.is_empty() {
    return None;
  }
  if let Some(idx) = s.strip_prefix('#') {
    let i: usize = idx.parse().ok()?;
    return CWE_CLASSES.get(i.checked_sub(1)?).map(|(id, _)| id.to_string());
  }
  let upper = s.to_ascii_uppercase();
  let digits = upper.strip_prefix("CWE-").unwrap_or(&upper);
  if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
    return Some(format!("CWE-{digits}"));
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolves_ids_numbers_and_indices() {
    assert_eq!(resolve_selection("cwe-416").as_deref(), Some("CWE-416"));
    assert_eq!(resolve_selection(" 89 ").as_deref(), Some("CWE-89"));
    assert_eq!(resolve_selection("#1").as_deref(), Some("CWE-20"));
    assert_eq!(resolve_selection("#0"), None);
    assert_eq!(resolve_selection("#99"), None);
    assert_eq!(resolve_selection("sql injection"), None);
    assert_eq!(resolve_selection(""), None);
  }

  #[test]
  fn catalog_lookups() {
    assert_eq!(cwe_name("cwe-476"), Some("NULL Pointer Dereference"));
    assert_eq!(cwe_name("CWE-89"), None);
    assert!(is_known_difficulty("insane"));
    assert!(!is_known_difficulty("trivial"));
  }
}
