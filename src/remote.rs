//! Client for the remote challenge/scoring service.
//!
//! Three calls, no internal retry: retry and backoff policy belongs to the session logic.
//! Calls are instrumented and log status, latency and payload sizes (not code contents).
//!
//! NOTE: the session cookie is never logged.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, COOKIE, RETRY_AFTER};
use reqwest::{StatusCode, Url};
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::domain::{Challenge, ChallengeId, SubmissionResult};
use crate::error::{HttpError, ServiceError};
use crate::protocol::{extract_error_message, ChallengeWire, DiffWire, SubmitIn, SubmitWire};
use crate::util::{cache_buster, trunc_for_log};

/// The three network operations the session controller depends on.
#[async_trait]
pub trait RemoteService: Send + Sync {
  /// Fetch a fresh challenge. Must bypass any HTTP cache.
  async fn fetch_challenge(&self, difficulty: &str) -> Result<Challenge, ServiceError>;

  /// Fixed version of a challenge's code. Pure lookup; callers may cache it.
  async fn fetch_fixed_code(&self, challenge_id: &ChallengeId) -> Result<String, ServiceError>;

  /// Single-shot submission. `encoded_selection` is already transport-encoded.
  async fn submit_answer(
    &self,
    challenge_id: &ChallengeId,
    encoded_selection: &str,
    used_diff: bool,
  ) -> Result<SubmissionResult, ServiceError>;
}

#[derive(Clone)]
pub struct HttpRemote {
  client: reqwest::Client,
  base_url: Url,
  session_cookie: Option<String>,
}

impl HttpRemote {
  pub fn new(cfg: &ClientConfig) -> Result<Self, ServiceError> {
    let base_url = Url::parse(&cfg.base_url)
      .map_err(|e| ServiceError::Transport(format!("invalid base url '{}': {e}", cfg.base_url)))?;
    if base_url.cannot_be_a_base() {
      return Err(ServiceError::Transport(format!("base url '{}' cannot carry a path", cfg.base_url)));
    }
    let client = reqwest::Client::builder()
      .timeout(cfg.request_timeout())
      .user_agent(concat!("auditor-client/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client, base_url, session_cookie: cfg.session_cookie.clone() })
  }

  pub fn base_url(&self) -> &Url { &self.base_url }

  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    // cannot_be_a_base was rejected in `new`, so path_segments_mut succeeds.
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  fn with_session(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.session_cookie {
      Some(cookie) => req.header(COOKIE, cookie),
      None => req,
    }
  }
}

#[async_trait]
impl RemoteService for HttpRemote {
  #[instrument(level = "info", skip(self), fields(%difficulty))]
  async fn fetch_challenge(&self, difficulty: &str) -> Result<Challenge, ServiceError> {
    let url = self.endpoint(&["get_challenge", difficulty]);
    let start = Instant::now();
    let req = self.client.get(url)
      .query(&[("t", cache_buster())])
      .header(CACHE_CONTROL, "no-cache");
    let res = self.with_session(req).send().await?;
    let res = check_status(res).await.inspect_err(|e| log_failure("get_challenge", start.elapsed(), e))?;

    let wire: ChallengeWire = res.json().await?;
    let challenge = wire.validate(difficulty)?;
    info!(
      target: "auditor_client",
      id = %challenge.id,
      difficulty = %challenge.difficulty,
      code_len = challenge.vulnerable_code.len(),
      elapsed = ?start.elapsed(),
      "Challenge received"
    );
    Ok(challenge)
  }

  #[instrument(level = "info", skip(self), fields(%challenge_id))]
  async fn fetch_fixed_code(&self, challenge_id: &ChallengeId) -> Result<String, ServiceError> {
    let url = self.endpoint(&["get_diff", &challenge_id.to_string()]);
    let start = Instant::now();
    let res = self.with_session(self.client.get(url)).send().await?;
    let res = check_status(res).await.inspect_err(|e| log_failure("get_diff", start.elapsed(), e))?;

    let wire: DiffWire = res.json().await?;
    let fixed = wire.validate()?;
    info!(target: "auditor_client", fixed_len = fixed.len(), elapsed = ?start.elapsed(), "Fixed code received");
    Ok(fixed)
  }

  #[instrument(level = "info", skip(self, encoded_selection), fields(%challenge_id, %used_diff))]
  async fn submit_answer(
    &self,
    challenge_id: &ChallengeId,
    encoded_selection: &str,
    used_diff: bool,
  ) -> Result<SubmissionResult, ServiceError> {
    let url = self.endpoint(&["submit_answer"]);
    let body = SubmitIn {
      challenge_id: challenge_id.clone(),
      selected_cwe: encoded_selection.to_string(),
      used_diff,
    };
    let start = Instant::now();
    let req = self.client.post(url)
      .header(CONTENT_TYPE, "application/json")
      .json(&body);
    let res = self.with_session(req).send().await?;
    let res = check_status(res).await.inspect_err(|e| log_failure("submit_answer", start.elapsed(), e))?;

    let wire: SubmitWire = res.json().await?;
    let result = wire.validate()?;
    info!(
      target: "auditor_client",
      correct = result.correct,
      score_earned = result.score_earned,
      elapsed = ?start.elapsed(),
      "Submission scored"
    );
    Ok(result)
  }
}

/// Map non-2xx responses onto `HttpError`, keeping the server's `{error}` text when present.
async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
  let status = res.status();
  if status.is_success() {
    return Ok(res);
  }

  if status == StatusCode::TOO_MANY_REQUESTS {
    let retry_after_secs = res
      .headers()
      .get(RETRY_AFTER)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.trim().parse::<u64>().ok());
    return Err(HttpError::RateLimited { retry_after_secs }.into());
  }

  let reason = status.canonical_reason().map(str::to_string);
  let body = res.text().await.unwrap_or_default();
  debug!(
    target: "auditor_client",
    status = status.as_u16(),
    body_len = body.len(),
    body = %trunc_for_log(&body, 200),
    "Error body received"
  );
  let message = extract_error_message(&body);

  let err = if status == StatusCode::NOT_FOUND {
    HttpError::NotFound { message }
  } else {
    HttpError::Other { status: status.as_u16(), reason, message }
  };
  Err(err.into())
}

fn log_failure(call: &str, elapsed: Duration, e: &ServiceError) {
  warn!(target: "auditor_client", call, ?elapsed, error = %e, "Remote call failed");
}
