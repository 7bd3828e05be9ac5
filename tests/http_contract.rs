//! `HttpRemote` against a mock service: paths, headers, bodies and error mapping.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use auditor_client::util::{decode_selection, encode_selection};
use auditor_client::{ChallengeId, ClientConfig, HttpError, HttpRemote, RemoteService, ServiceError};

/// Matches when the query string contains `key` (any value); wiremock has no built-in for this.
fn query_param_exists(key: &'static str) -> impl Fn(&Request) -> bool {
    move |req: &Request| req.url.query_pairs().any(|(k, _)| k == key)
}

fn remote_for(server: &MockServer) -> HttpRemote {
    let cfg = ClientConfig { base_url: server.uri(), ..ClientConfig::default() };
    HttpRemote::new(&cfg).unwrap()
}

#[tokio::test]
async fn fetch_challenge_bypasses_caches_and_keeps_numeric_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_challenge/medium"))
        .and(query_param_exists("t"))
        .and(header("cache-control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "difficulty": "medium",
            "title": "Heap reuse in session cache",
            "cve_id": "CVE-2021-3156",
            "vulnerable_code": "free(p);\nuse(p);",
            "correct_cwe": "CWE-416",
            "correct_cwe_name": "Use After Free"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let challenge = remote_for(&server).fetch_challenge("medium").await.unwrap();
    assert_eq!(challenge.id, ChallengeId::Number(12));
    assert_eq!(challenge.difficulty, "medium");
    assert_eq!(challenge.correct_cwe, "CWE-416");
    assert_eq!(challenge.cve_id.as_deref(), Some("CVE-2021-3156"));
    assert_eq!(challenge.display_title(), "Heap reuse in session cache");
}

#[tokio::test]
async fn missing_difficulty_falls_back_to_the_requested_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_challenge/hard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c1",
            "vulnerable_code": "x",
            "correct_cwe": "CWE-20"
        })))
        .mount(&server)
        .await;

    let challenge = remote_for(&server).fetch_challenge("hard").await.unwrap();
    assert_eq!(challenge.id, ChallengeId::from("c1"));
    assert_eq!(challenge.difficulty, "hard");
    assert_eq!(challenge.display_title(), "Challenge #c1");
}

#[tokio::test]
async fn not_found_carries_the_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_challenge/insane"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "No more challenges found for difficulty 'insane'"
        })))
        .mount(&server)
        .await;

    let err = remote_for(&server).fetch_challenge("insane").await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Http(HttpError::NotFound {
            message: Some("No more challenges found for difficulty 'insane'".into())
        })
    );
}

#[tokio::test]
async fn server_errors_keep_status_and_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_challenge/easy"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = remote_for(&server).fetch_challenge("easy").await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Http(HttpError::Other {
            status: 503,
            reason: Some("Service Unavailable".into()),
            message: None,
        })
    );
}

#[tokio::test]
async fn incomplete_challenge_payload_is_a_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_challenge/easy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "difficulty": "easy",
            "correct_cwe": "CWE-89"
        })))
        .mount(&server)
        .await;

    let err = remote_for(&server).fetch_challenge("easy").await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Schema("Invalid challenge data from server: missing 'vulnerable_code'".into())
    );
}

#[tokio::test]
async fn non_json_success_body_is_a_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_diff/4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = remote_for(&server).fetch_fixed_code(&ChallengeId::Number(4)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Schema(_)), "got {err:?}");
}

#[tokio::test]
async fn fetch_fixed_code_reads_the_diff_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_diff/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fixed_code": "free(p);\np = NULL;"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fixed = remote_for(&server).fetch_fixed_code(&ChallengeId::Number(12)).await.unwrap();
    assert_eq!(fixed, "free(p);\np = NULL;");
}

#[tokio::test]
async fn submit_posts_encoded_selection_with_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit_answer"))
        .and(header("cookie", "session=abc123"))
        .and(body_json(json!({
            "challenge_id": 12,
            "selected_cwe": "Q1dFLTQxNg==",
            "used_diff": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "correct": true,
            "score_earned": 15,
            "correct_cwe": "CWE-416",
            "correct_cwe_name": "Use After Free",
            "solution": "The pointer is used after free().",
            "total_score": 40,
            "completed_count": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = ClientConfig {
        base_url: server.uri(),
        session_cookie: Some("session=abc123".into()),
        ..ClientConfig::default()
    };
    let remote = HttpRemote::new(&cfg).unwrap();
    let encoded = encode_selection("CWE-416");
    assert_eq!(decode_selection(&encoded).as_deref(), Some("CWE-416"));

    let result = remote.submit_answer(&ChallengeId::Number(12), &encoded, true).await.unwrap();
    assert!(result.correct);
    assert_eq!(result.score_earned, 15);
    assert_eq!(result.total_score, Some(40));
    assert_eq!(result.correct_answer_label(), "Use After Free");
}

#[tokio::test]
async fn rate_limited_submit_reports_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit_answer"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "7")
                .set_body_json(json!({ "error": "ratelimit exceeded" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = remote_for(&server)
        .submit_answer(&ChallengeId::Number(1), "Q1dFLTg5", false)
        .await
        .unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err, ServiceError::Http(HttpError::RateLimited { retry_after_secs: Some(7) }));
}

#[tokio::test]
async fn rate_limit_without_usable_header_has_no_wait_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit_answer"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "Wed, 21 Oct 2015 07:28:00 GMT"))
        .mount(&server)
        .await;

    let err = remote_for(&server)
        .submit_answer(&ChallengeId::Number(1), "Q1dFLTg5", false)
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::Http(HttpError::RateLimited { retry_after_secs: None }));
}

#[tokio::test]
async fn incomplete_result_is_a_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit_answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "correct": false })))
        .mount(&server)
        .await;

    let err = remote_for(&server)
        .submit_answer(&ChallengeId::Number(1), "Q1dFLTg5", false)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::Schema("Invalid result data from server: missing 'score_earned'".into())
    );
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let cfg = ClientConfig { base_url: "http://127.0.0.1:9".into(), ..ClientConfig::default() };
    let err = HttpRemote::new(&cfg).unwrap().fetch_challenge("easy").await.unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)), "got {err:?}");
}
