//! Domain models used by the client: the challenge under assessment and the scored result.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Challenge identifier as issued by the service.
///
/// The deployed service hands out integer ids, but nothing in the contract forbids strings.
/// The original JSON type is kept so the id can be echoed back unchanged on submission.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChallengeId {
  Number(i64),
  Text(String),
}

impl fmt::Display for ChallengeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ChallengeId::Number(n) => write!(f, "{n}"),
      ChallengeId::Text(s) => f.write_str(s),
    }
  }
}

impl From<&str> for ChallengeId {
  fn from(s: &str) -> Self { ChallengeId::Text(s.to_string()) }
}

impl From<i64> for ChallengeId {
  fn from(n: i64) -> Self { ChallengeId::Number(n) }
}

/// One vulnerable code sample plus its correct classification. Immutable once fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct Challenge {
  pub id: ChallengeId,
  pub difficulty: String,   // free-form on the wire ("easy", "medium", ...)
  pub vulnerable_code: String,
  pub correct_cwe: String,
  pub correct_cwe_name: Option<String>,
  pub title: Option<String>,
  pub cve_id: Option<String>,
}

impl Challenge {
  /// Heading shown above the code pane.
  pub fn display_title(&self) -> String {
    match &self.title {
      Some(t) if !t.trim().is_empty() => t.clone(),
      _ => format!("Challenge #{}", self.id),
    }
  }
}

/// Outcome of a single submission. Terminal for the session that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionResult {
  pub correct: bool,
  pub score_earned: i64,
  pub correct_cwe: Option<String>,
  pub correct_cwe_name: Option<String>,
  pub solution: Option<String>,
  pub total_score: Option<i64>,
  pub completed_count: Option<i64>,
}

impl SubmissionResult {
  /// Name of the right answer, falling back to the bare id and then to "N/A".
  pub fn correct_answer_label(&self) -> String {
    self.correct_cwe_name
      .as_deref()
      .filter(|s| !s.is_empty())
      .or(self.correct_cwe.as_deref().filter(|s| !s.is_empty()))
      .unwrap_or("N/A")
      .to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn challenge_id_displays_without_quotes() {
    assert_eq!(ChallengeId::Number(42).to_string(), "42");
    assert_eq!(ChallengeId::from("c1").to_string(), "c1");
  }

  #[test]
  fn challenge_id_keeps_json_type() {
    let n: ChallengeId = serde_json::from_str("7").unwrap();
    let s: ChallengeId = serde_json::from_str("\"c1\"").unwrap();
    assert_eq!(n, ChallengeId::Number(7));
    assert_eq!(s, ChallengeId::Text("c1".into()));
    assert_eq!(serde_json::to_string(&n).unwrap(), "7");
  }

  #[test]
  fn correct_answer_label_falls_back() {
    let mut r = SubmissionResult {
      correct: false,
      score_earned: 0,
      correct_cwe: Some("CWE-89".into()),
      correct_cwe_name: None,
      solution: None,
      total_score: None,
      completed_count: None,
    };
    assert_eq!(r.correct_answer_label(), "CWE-89");
    r.correct_cwe_name = Some("SQL Injection".into());
    assert_eq!(r.correct_answer_label(), "SQL Injection");
    r.correct_cwe_name = None;
    r.correct_cwe = None;
    assert_eq!(r.correct_answer_label(), "N/A");
  }

  #[test]
  fn display_title_defaults_to_id() {
    let c = Challenge {
      id: ChallengeId::Number(3),
      difficulty: "easy".into(),
      vulnerable_code: String::new(),
      correct_cwe: "CWE-476".into(),
      correct_cwe_name: None,
      title: None,
      cve_id: None,
    };
    assert_eq!(c.display_title(), "Challenge #3");
  }
}
