//! Error taxonomy for the Rishta client.
//!
//! Every failure the client can observe falls into one of four buckets:
//! field validation, a failed remote call, local secure storage, or the
//! realtime connection. None of them is fatal; callers turn them into an
//! inline field message, an alert, a log line, or a retry.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Alert text shown when the remote service did not supply a message.
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),

  #[error("remote call failed: {}", .message.as_deref().unwrap_or(FALLBACK_MESSAGE))]
  Remote {
    /// HTTP status, if the call got as far as a response.
    status:  Option<u16>,
    /// Message supplied by the remote service, if any.
    message: Option<String>,
  },

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("connection error: {0}")]
  Connection(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// The text to put in front of the user.
  ///
  /// Validation errors yield the first field message; remote failures yield
  /// the server's message or [`FALLBACK_MESSAGE`]. Everything else is an
  /// internal failure and gets the fallback.
  pub fn user_message(&self) -> String {
    match self {
      Self::Validation(errors) => errors
        .iter()
        .next()
        .map(|(_, msg)| msg.to_owned())
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_owned()),
      Self::Remote { message: Some(m), .. } if !m.is_empty() => m.clone(),
      _ => FALLBACK_MESSAGE.to_owned(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn remote_error_prefers_server_message() {
    let err = Error::Remote {
      status:  Some(400),
      message: Some("Invalid OTP".into()),
    };
    assert_eq!(err.user_message(), "Invalid OTP");
  }

  #[test]
  fn remote_error_without_message_falls_back() {
    let err = Error::Remote { status: Some(500), message: None };
    assert_eq!(err.user_message(), FALLBACK_MESSAGE);
    assert!(err.to_string().contains(FALLBACK_MESSAGE));
  }

  #[test]
  fn validation_error_surfaces_first_field_message() {
    let mut errors = ValidationErrors::default();
    errors.add("otp", "OTP is required");
    let err = Error::from(errors);
    assert_eq!(err.user_message(), "OTP is required");
  }

  #[test]
  fn connection_error_is_not_shown_verbatim() {
    let err = Error::Connection("socket closed".into());
    assert_eq!(err.user_message(), FALLBACK_MESSAGE);
  }
}
