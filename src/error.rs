//! Error taxonomy for the remote service and the session controller.

use thiserror::Error;

/// Non-2xx responses from the remote service.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HttpError {
  #[error("not found: {}", message.as_deref().unwrap_or("no message"))]
  NotFound { message: Option<String> },
  #[error("rate limited (retry after {retry_after_secs:?}s)")]
  RateLimited { retry_after_secs: Option<u64> },
  #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no message"))]
  Other {
    status: u16,
    reason: Option<String>,
    message: Option<String>,
  },
}

impl HttpError {
  /// Server supplied text (from a JSON `{error}` body), if any.
  pub fn server_message(&self) -> Option<&str> {
    match self {
      HttpError::NotFound { message } | HttpError::Other { message, .. } => message.as_deref(),
      HttpError::RateLimited { .. } => None,
    }
  }
}

/// Errors surfaced by `RemoteService` calls.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ServiceError {
  /// Request never reached the server or no response came back.
  #[error("network error: {0}")]
  Transport(String),
  #[error(transparent)]
  Http(#[from] HttpError),
  /// 2xx with a body that is not the expected structure.
  #[error("{0}")]
  Schema(String),
}

impl From<reqwest::Error> for ServiceError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      ServiceError::Schema(e.to_string())
    } else {
      ServiceError::Transport(e.to_string())
    }
  }
}

impl ServiceError {
  pub fn is_rate_limited(&self) -> bool {
    matches!(self, ServiceError::Http(HttpError::RateLimited { .. }))
  }
}

/// Local precondition failures. Never sent over the network.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UserInputError {
  #[error("no challenge loaded")]
  NoChallenge,
  #[error("no vulnerability type selected")]
  NoSelection,
}

/// Highlighting failures are cosmetic and only logged.
#[derive(Clone, Debug, Error)]
#[error("highlighting failed: {0}")]
pub struct HighlightError(pub String);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn server_message_is_exposed_for_not_found_and_other() {
    let nf = HttpError::NotFound { message: Some("No more challenges".into()) };
    assert_eq!(nf.server_message(), Some("No more challenges"));
    let rl = HttpError::RateLimited { retry_after_secs: Some(3) };
    assert_eq!(rl.server_message(), None);
  }

  #[test]
  fn rate_limit_is_recognised_through_service_error() {
    let e: ServiceError = HttpError::RateLimited { retry_after_secs: None }.into();
    assert!(e.is_rate_limited());
    assert!(!ServiceError::Transport("refused".into()).is_rate_limited());
  }
}
