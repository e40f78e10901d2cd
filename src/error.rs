//! Closed error taxonomy for the data layer.
//!
//! Every failure path in the transport and mock providers terminates in an
//! [`ApiError`] with one of five kinds. Classification never panics and every
//! envelope carries a non-empty human-readable message, so consumers can
//! always show something sensible without inspecting the kind.

use serde::Deserialize;
use thiserror::Error;

/// Failure category. Closed set; anything unclassifiable maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Connectivity failure before a response was received.
  Network,
  /// The server answered with this non-2xx status.
  Http(u16),
  /// The call exceeded the transport's per-request ceiling.
  Timeout,
  /// The response body did not match the expected shape.
  Parse,
  /// None of the above.
  Unknown,
}

impl ErrorKind {
  /// Message of last resort when a failure carries no text of its own.
  fn default_message(self) -> &'static str {
    match self {
      ErrorKind::Network => "network request failed",
      ErrorKind::Http(_) => "server returned an error response",
      ErrorKind::Timeout => "request timed out",
      ErrorKind::Parse => "response did not match the expected shape",
      ErrorKind::Unknown => "request failed",
    }
  }
}

/// Normalized failure record handed to consumers.
///
/// Cloneable so the cache can broadcast the same failure to every subscriber;
/// the underlying cause is carried as rendered text for the same reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {message}")]
pub struct ApiError {
  pub kind: ErrorKind,
  /// Human-readable description; never empty.
  pub message: String,
  /// Rendered underlying error, when one exists.
  pub cause: Option<String>,
}

impl ApiError {
  /// Build an error, substituting the kind's default message when the given
  /// one is blank.
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    let message = message.into();
    let message = if message.trim().is_empty() {
      kind.default_message().to_string()
    } else {
      message
    };

    Self {
      kind,
      message,
      cause: None,
    }
  }

  /// Attach the rendered underlying error.
  pub fn with_cause(mut self, cause: impl std::fmt::Display) -> Self {
    self.cause = Some(cause.to_string());
    self
  }
}

/// Shape of the error body the platform API returns alongside 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
  message: Option<String>,
}

/// Classify a failure raised before a response arrived.
///
/// Timeouts and connectivity problems get their own kinds; everything else
/// reqwest can produce at this stage maps to `Unknown`.
pub fn classify_request_error(err: reqwest::Error, fallback: &str) -> ApiError {
  let kind = if err.is_timeout() {
    ErrorKind::Timeout
  } else if err.is_connect() || err.is_request() {
    ErrorKind::Network
  } else {
    ErrorKind::Unknown
  };

  ApiError::new(kind, fallback).with_cause(err)
}

/// Classify a non-2xx response.
///
/// The message is taken from the body's `message` field when one is present,
/// otherwise the caller's per-resource fallback string is used.
pub fn classify_status(status: u16, body: &[u8], fallback: &str) -> ApiError {
  let message = serde_json::from_slice::<ApiErrorBody>(body)
    .ok()
    .and_then(|b| b.message)
    .filter(|m| !m.trim().is_empty())
    .unwrap_or_else(|| fallback.to_string());

  ApiError::new(ErrorKind::Http(status), message)
}
