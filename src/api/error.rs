//! Failure taxonomy for remote service calls.

use serde::Deserialize;
use thiserror::Error;

/// Error classes surfaced by [`ApiClient`](super::ApiClient) calls.
///
/// Variants are `Clone` because the query cache hands the last error out
/// with every snapshot of a failed entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
  /// No usable response at all: refused connection, DNS, timeout.
  #[error("network error: {0}")]
  Network(String),

  /// HTTP 401. The session token is missing, expired, or revoked.
  #[error("unauthorized: {message}")]
  Unauthorized { message: String },

  /// Any other 4xx: the request was understood and rejected.
  #[error("{message}")]
  Validation { status: u16, message: String },

  /// 5xx from the service.
  #[error("server error ({status}): {message}")]
  Server { status: u16, message: String },

  /// A success status with a body that did not match the expected shape.
  #[error("malformed response: {0}")]
  Decode(String),
}

impl ApiError {
  pub fn is_unauthorized(&self) -> bool {
    matches!(self, ApiError::Unauthorized { .. })
  }

  /// The message alone, without the class prefix Display adds. Forms show
  /// this inline where "Failed to login: unauthorized: ..." would read
  /// doubled up.
  pub fn message(&self) -> &str {
    match self {
      ApiError::Network(message) | ApiError::Decode(message) => message,
      ApiError::Unauthorized { message } => message,
      ApiError::Validation { message, .. } | ApiError::Server { message, .. } => message,
    }
  }

  /// Classify a non-success HTTP status together with the service's
  /// message text.
  pub fn from_status(status: u16, message: String) -> ApiError {
    match status {
      401 => ApiError::Unauthorized { message },
      400..=499 => ApiError::Validation { status, message },
      _ => ApiError::Server { status, message },
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      ApiError::Decode(err.to_string())
    } else {
      ApiError::Network(err.to_string())
    }
  }
}

/// Error body the service sends alongside non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
  pub message: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_status_maps_classes() {
    assert!(matches!(
      ApiError::from_status(401, "jwt expired".to_string()),
      ApiError::Unauthorized { .. }
    ));
    assert!(matches!(
      ApiError::from_status(400, "amount required".to_string()),
      ApiError::Validation { status: 400, .. }
    ));
    assert!(matches!(
      ApiError::from_status(404, "no such record".to_string()),
      ApiError::Validation { status: 404, .. }
    ));
    assert!(matches!(
      ApiError::from_status(500, "boom".to_string()),
      ApiError::Server { status: 500, .. }
    ));
    assert!(matches!(
      ApiError::from_status(503, "down".to_string()),
      ApiError::Server { status: 503, .. }
    ));
  }

  #[test]
  fn test_is_unauthorized() {
    let err = ApiError::from_status(401, "nope".to_string());
    assert!(err.is_unauthorized());
    assert!(!ApiError::Network("refused".to_string()).is_unauthorized());
  }

  #[test]
  fn test_validation_displays_bare_message() {
    // Toast text appends this Display output after "Failed to ...: "
    let err = ApiError::from_status(400, "amount must be positive".to_string());
    assert_eq!(err.to_string(), "amount must be positive");
  }

  #[test]
  fn test_message_drops_class_prefix() {
    let err = ApiError::from_status(401, "invalid credentials".to_string());
    assert_eq!(err.to_string(), "unauthorized: invalid credentials");
    assert_eq!(err.message(), "invalid credentials");

    let err = ApiError::Network("connection refused".to_string());
    assert_eq!(err.message(), "connection refused");
  }
}
