//! Error type for `rishta-client`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} {path} → {status}")]
  Status {
    method:  reqwest::Method,
    path:    String,
    status:  reqwest::StatusCode,
    /// The `message` (or `error`) field of the response body, if any.
    message: Option<String>,
  },

  #[error("websocket error: {0}")]
  WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

  #[error("invalid url: {0}")]
  Url(#[from] url::ParseError),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("not signed in")]
  NotAuthenticated,
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
  fn from(e: tokio_tungstenite::tungstenite::Error) -> Self { Self::WebSocket(Box::new(e)) }
}

impl From<Error> for rishta_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Status { status, message, .. } => Self::Remote {
        status: Some(status.as_u16()),
        message,
      },
      Error::Http(e) => Self::Remote {
        status:  e.status().map(|s| s.as_u16()),
        message: None,
      },
      Error::NotAuthenticated => Self::Remote { status: Some(401), message: None },
      Error::Json(e) => Self::Serialization(e),
      Error::WebSocket(e) => Self::Connection(e.to_string()),
      Error::Url(e) => Self::Connection(e.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use rishta_core::error::FALLBACK_MESSAGE;

  use super::*;

  #[test]
  fn status_keeps_server_message() {
    let e = Error::Status {
      method:  reqwest::Method::POST,
      path:    "/auth/verify-otp".into(),
      status:  reqwest::StatusCode::BAD_REQUEST,
      message: Some("Invalid OTP".into()),
    };
    let core: rishta_core::Error = e.into();
    assert!(matches!(core, rishta_core::Error::Remote { status: Some(400), .. }));
    assert_eq!(core.user_message(), "Invalid OTP");
  }

  #[test]
  fn status_without_message_falls_back() {
    let e = Error::Status {
      method:  reqwest::Method::GET,
      path:    "/chats".into(),
      status:  reqwest::StatusCode::INTERNAL_SERVER_ERROR,
      message: None,
    };
    assert_eq!(rishta_core::Error::from(e).user_message(), FALLBACK_MESSAGE);
  }
}
