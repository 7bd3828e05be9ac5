//! Wire structs for the remote challenge/scoring service (serde ready).
//! Responses are deserialized leniently and then validated, so a missing field becomes a
//! `ServiceError::Schema` instead of a silent default.

use serde::{Deserialize, Serialize};

use crate::domain::{Challenge, ChallengeId, SubmissionResult};
use crate::error::ServiceError;

/// `GET /get_challenge/{difficulty}` success body.
#[derive(Debug, Default, Deserialize)]
pub struct ChallengeWire {
    #[serde(default)]
    pub id: Option<ChallengeId>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub vulnerable_code: Option<String>,
    #[serde(default)]
    pub correct_cwe: Option<String>,
    #[serde(default)]
    pub correct_cwe_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cve_id: Option<String>,
}

impl ChallengeWire {
    /// Accept only payloads carrying `id`, `vulnerable_code` and `correct_cwe`.
    /// A missing `difficulty` falls back to the one that was requested.
    pub fn validate(self, requested_difficulty: &str) -> Result<Challenge, ServiceError> {
        let id = self.id.ok_or_else(|| missing("challenge", "id"))?;
        let vulnerable_code = self
            .vulnerable_code
            .ok_or_else(|| missing("challenge", "vulnerable_code"))?;
        let correct_cwe = self
            .correct_cwe
            .ok_or_else(|| missing("challenge", "correct_cwe"))?;

        Ok(Challenge {
            id,
            difficulty: self
                .difficulty
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| requested_difficulty.to_string()),
            vulnerable_code,
            correct_cwe,
            correct_cwe_name: self.correct_cwe_name,
            title: self.title,
            cve_id: self.cve_id,
        })
    }
}

/// `GET /get_diff/{challenge_id}` success body.
#[derive(Debug, Default, Deserialize)]
pub struct DiffWire {
    #[serde(default)]
    pub fixed_code: Option<String>,
}

impl DiffWire {
    pub fn validate(self) -> Result<String, ServiceError> {
        self.fixed_code.ok_or_else(|| missing("diff", "fixed_code"))
    }
}

/// `POST /submit_answer` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitIn {
    pub challenge_id: ChallengeId,
    /// Encoded selection, see `util::encode_selection`.
    pub selected_cwe: String,
    pub used_diff: bool,
}

/// `POST /submit_answer` success body.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitWire {
    #[serde(default)]
    pub correct: Option<bool>,
    #[serde(default)]
    pub score_earned: Option<i64>,
    #[serde(default)]
    pub correct_cwe: Option<String>,
    #[serde(default)]
    pub correct_cwe_name: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub total_score: Option<i64>,
    #[serde(default)]
    pub completed_count: Option<i64>,
}

impl SubmitWire {
    /// Accept only payloads carrying `correct` and `score_earned`.
    pub fn validate(self) -> Result<SubmissionResult, ServiceError> {
        let correct = self.correct.ok_or_else(|| missing("result", "correct"))?;
        let score_earned = self
            .score_earned
            .ok_or_else(|| missing("result", "score_earned"))?;
        Ok(SubmissionResult {
            correct,
            score_earned,
            correct_cwe: self.correct_cwe,
            correct_cwe_name: self.correct_cwe_name,
            solution: self.solution,
            total_score: self.total_score,
            completed_count: self.completed_count,
        })
    }
}

/// Error body shape used by every endpoint: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Try to extract the server's error text from a non-2xx body.
/// Returns None for non-JSON bodies or JSON without an `error` string.
pub fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|s| !s.trim().is_empty())
}

fn missing(what: &str, field: &str) -> ServiceError {
    ServiceError::Schema(format!("Invalid {what} data from server: missing '{field}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire<T: for<'a> Deserialize<'a>>(v: serde_json::Value) -> T {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn challenge_with_required_fields_is_accepted() {
        let c: ChallengeWire = wire(json!({
            "id": "c1",
            "vulnerable_code": "strcpy(buf, input);",
            "correct_cwe": "CWE-89",
            "correct_cwe_name": "SQL Injection"
        }));
        let c = c.validate("easy").unwrap();
        assert_eq!(c.id, ChallengeId::from("c1"));
        assert_eq!(c.difficulty, "easy");
        assert_eq!(c.correct_cwe_name.as_deref(), Some("SQL Injection"));
    }

    #[test]
    fn challenge_without_id_is_a_schema_error() {
        let c: ChallengeWire = wire(json!({ "vulnerable_code": "x", "correct_cwe": "CWE-20" }));
        let err = c.validate("easy").unwrap_err();
        assert!(matches!(err, ServiceError::Schema(ref m) if m.contains("'id'")));
    }

    #[test]
    fn challenge_with_null_code_is_a_schema_error() {
        let c: ChallengeWire = wire(json!({ "id": 4, "vulnerable_code": null, "correct_cwe": "CWE-20" }));
        assert!(matches!(c.validate("hard"), Err(ServiceError::Schema(_))));
    }

    #[test]
    fn server_difficulty_wins_over_requested() {
        let c: ChallengeWire = wire(json!({
            "id": 9, "difficulty": "medium", "vulnerable_code": "x", "correct_cwe": "CWE-416"
        }));
        assert_eq!(c.validate("easy").unwrap().difficulty, "medium");
    }

    #[test]
    fn result_requires_correct_and_score() {
        let no_score: SubmitWire = wire(json!({ "correct": true }));
        assert!(matches!(no_score.validate(), Err(ServiceError::Schema(ref m)) if m.contains("score_earned")));

        let no_correct: SubmitWire = wire(json!({ "score_earned": 10 }));
        assert!(matches!(no_correct.validate(), Err(ServiceError::Schema(ref m)) if m.contains("correct")));

        let ok: SubmitWire = wire(json!({
            "correct": false, "score_earned": 0, "total_score": 45, "completed_count": 3
        }));
        let r = ok.validate().unwrap();
        assert!(!r.correct);
        assert_eq!(r.total_score, Some(45));
        assert_eq!(r.solution, None);
    }

    #[test]
    fn diff_requires_fixed_code() {
        let empty: DiffWire = wire(json!({}));
        assert!(empty.validate().is_err());
        let ok: DiffWire = wire(json!({ "fixed_code": "strncpy(buf, input, n);" }));
        assert_eq!(ok.validate().unwrap(), "strncpy(buf, input, n);");
    }

    #[test]
    fn submit_body_echoes_numeric_id() {
        let body = SubmitIn {
            challenge_id: ChallengeId::Number(12),
            selected_cwe: "Q1dFLTg5".into(),
            used_diff: true,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "challenge_id": 12, "selected_cwe": "Q1dFLTg5", "used_diff": true })
        );
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            extract_error_message(r#"{"error":"Challenge not found"}"#).as_deref(),
            Some("Challenge not found")
        );
        assert_eq!(extract_error_message("<html>502 Bad Gateway</html>"), None);
        assert_eq!(extract_error_message(r#"{"detail":"x"}"#), None);
    }
}
