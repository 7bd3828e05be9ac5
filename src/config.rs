//! Loading client configuration (service location, timings, wording) from TOML and env.
//!
//! See `ClientConfig` and `Messages` for the expected schema. Every field has a default,
//! so an empty file (or no file at all) is a valid configuration.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::util::fill_template;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  pub base_url: String,
  /// Raw `Cookie` header value for an authenticated service session.
  pub session_cookie: Option<String>,
  pub start_difficulty: String,
  pub request_timeout_secs: u64,
  /// Points deducted when the fixed code is revealed. Display only; the service scores.
  pub diff_penalty_points: u32,
  /// Submit cooldown after a 429 that carries no `Retry-After` header.
  pub default_retry_after_secs: u64,
  /// Extra wait added on top of `Retry-After`.
  pub retry_after_buffer_secs: u64,
  /// Delay before asking the highlighter to paint a pane.
  pub highlight_delay_ms: u64,
  pub messages: Messages,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url: "http://127.0.0.1:5000".into(),
      session_cookie: None,
      start_difficulty: "easy".into(),
      request_timeout_secs: 20,
      diff_penalty_points: 5,
      default_retry_after_secs: 30,
      retry_after_buffer_secs: 0,
      highlight_delay_ms: 0,
      messages: Messages::default(),
    }
  }
}

impl ClientConfig {
  /// File config (if AUDITOR_CONFIG_PATH points at one) with env overrides applied.
  pub fn from_env() -> Self {
    let mut cfg = load_client_config_from_env().unwrap_or_default();
    if let Ok(url) = std::env::var("AUDITOR_BASE_URL") {
      cfg.base_url = url;
    }
    if let Ok(cookie) = std::env::var("AUDITOR_SESSION_COOKIE") {
      cfg.session_cookie = Some(cookie).filter(|c| !c.trim().is_empty());
    }
    if let Ok(d) = std::env::var("AUDITOR_DIFFICULTY") {
      cfg.start_difficulty = d;
    }
    cfg
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  /// How long submission stays disabled after a 429.
  pub fn submit_cooldown(&self, retry_after_secs: Option<u64>) -> Duration {
    match retry_after_secs {
      Some(secs) => Duration::from_secs(secs.saturating_add(self.retry_after_buffer_secs)),
      None => Duration::from_secs(self.default_retry_after_secs),
    }
  }

  pub fn highlight_delay(&self) -> Duration {
    Duration::from_millis(self.highlight_delay_ms)
  }

  pub fn diff_show_label(&self) -> String {
    fill_template(
      &self.messages.diff_show_label,
      &[("penalty", &self.diff_penalty_points.to_string())],
    )
  }
}

/// User-visible wording. Templates use `{key}` placeholders.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Messages {
  pub submit_label: String,
  pub submitting_label: String,
  pub diff_show_label: String,
  pub diff_hide_label: String,
  pub diff_loading_label: String,
  pub new_challenge_label: String,
  pub code_title: String,
  pub diff_title: String,
  pub loading_id_placeholder: String,
  pub no_challenge: String,
  pub no_challenge_for_diff: String,
  pub no_selection: String,
  pub load_failed_status: String,
  pub load_failed: String,
  pub not_found: String,
  pub diff_failed: String,
  pub submit_failed: String,
  pub rate_limited: String,
  pub rate_limited_retry: String,
  pub result_correct: String,
  pub result_incorrect: String,
  pub score_line: String,
  pub no_solution: String,
}

impl Default for Messages {
  fn default() -> Self {
    Self {
      submit_label: "Submit Assessment".into(),
      submitting_label: "Submitting...".into(),
      diff_show_label: "Show Diff View (-{penalty} pts)".into(),
      diff_hide_label: "Show Original Code".into(),
      diff_loading_label: "Loading...".into(),
      new_challenge_label: "New Challenge".into(),
      code_title: "Source Code".into(),
      diff_title: "Diff View (Vulnerable vs Fixed)".into(),
      loading_id_placeholder: "Loading...".into(),
      no_challenge: "No challenge loaded.".into(),
      no_challenge_for_diff: "Cannot show diff, no challenge loaded.".into(),
      no_selection: "Please select a vulnerability type.".into(),
      load_failed_status: "Failed to load challenge. Server returned: {status}".into(),
      load_failed: "Failed to load or parse challenge data: {error}".into(),
      not_found: "No challenges found for difficulty '{difficulty}'.".into(),
      diff_failed: "Error toggling diff view: {error}".into(),
      submit_failed: "Error submitting answer: {error}".into(),
      rate_limited: "You are submitting answers too quickly. Please wait a moment and try again.".into(),
      rate_limited_retry: "You are submitting answers too quickly. Please try again in {seconds} seconds.".into(),
      result_correct: "Correct!".into(),
      result_incorrect: "Incorrect!".into(),
      score_line: "Score Earned: {score} points.".into(),
      no_solution: "No solution explanation provided.".into(),
    }
  }
}

/// Attempt to load `ClientConfig` from AUDITOR_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_client_config_from_env() -> Option<ClientConfig> {
  let path = std::env::var("AUDITOR_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_client_config(&s) {
      Ok(cfg) => {
        info!(target: "auditor_client", %path, "Loaded client config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "auditor_client", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "auditor_client", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_client_config(s: &str) -> Result<ClientConfig, toml::de::Error> {
  toml::from_str::<ClientConfig>(s)
}
