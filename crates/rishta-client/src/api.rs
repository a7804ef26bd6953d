//! Async HTTP client wrapping the Rishta JSON API.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, multipart};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::debug;
use url::Url;

use rishta_core::{
  chat::{Chat, Message},
  id::{ChatId, UserId},
  matching::{LikeOutcome, Match},
  profile::{ProfileUpdate, User, UserPreferences},
  search::preference_query,
};

use crate::{Error, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the Rishta API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Base URL including the `/api` prefix.
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self { base_url: DEFAULT_API_URL.to_owned(), timeout: DEFAULT_TIMEOUT }
  }
}

// ─── Response bodies ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OtpReceipt {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub message: String,
}

/// Token and profile issued by OTP verification or a refresh.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
  pub token: String,
  pub user:  User,
}

#[derive(Deserialize)]
struct UploadResponse {
  url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
  message: Option<String>,
  error:   Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async HTTP client for the Rishta JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based. Requests
/// carry `Authorization: Bearer <token>` once a token has been set.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
  token:  Option<String>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config, token: None })
  }

  pub fn set_token(&mut self, token: Option<String>) { self.token = token.filter(|t| !t.is_empty()); }

  pub fn token(&self) -> Option<&str> { self.token.as_deref() }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let req = self.client.request(method, self.url(path));
    match &self.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Send a request and turn any non-success status into [`Error::Status`].
  async fn fetch(
    &self,
    method: Method,
    path: &str,
    build: impl FnOnce(RequestBuilder) -> RequestBuilder,
  ) -> Result<Response> {
    debug!(%method, path, "api request");
    let resp = build(self.request(method.clone(), path)).send().await?;

    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }

    let message = resp
      .text()
      .await
      .ok()
      .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
      .and_then(|body| body.message.or(body.error))
      .filter(|m| !m.is_empty());
    debug!(%method, path, %status, ?message, "api request failed");
    Err(Error::Status { method, path: path.to_owned(), status, message })
  }

  async fn fetch_json<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    build: impl FnOnce(RequestBuilder) -> RequestBuilder,
  ) -> Result<T> {
    let body = self.fetch(method, path, build).await?.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
  }

  async fn fetch_empty(
    &self,
    method: Method,
    path: &str,
    build: impl FnOnce(RequestBuilder) -> RequestBuilder,
  ) -> Result<()> {
    self.fetch(method, path, build).await?;
    Ok(())
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /auth/send-otp`
  pub async fn send_otp(&self, phone_number: &str) -> Result<OtpReceipt> {
    self
      .fetch_json(Method::POST, "/auth/send-otp", |r| {
        r.json(&json!({ "phoneNumber": phone_number }))
      })
      .await
  }

  /// `POST /auth/verify-otp`
  pub async fn verify_otp(&self, phone_number: &str, otp: &str) -> Result<AuthResponse> {
    self
      .fetch_json(Method::POST, "/auth/verify-otp", |r| {
        r.json(&json!({ "phoneNumber": phone_number, "otp": otp }))
      })
      .await
  }

  /// `POST /auth/refresh`. Requires a current token.
  pub async fn refresh_token(&self) -> Result<AuthResponse> {
    if self.token.is_none() {
      return Err(Error::NotAuthenticated);
    }
    self.fetch_json(Method::POST, "/auth/refresh", |r| r).await
  }

  /// `PUT /auth/profile`
  pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
    self.fetch_json(Method::PUT, "/auth/profile", |r| r.json(update)).await
  }

  /// `POST /upload/photo` as `multipart/form-data`; returns the hosted URL.
  pub async fn upload_photo(&self, bytes: Vec<u8>, file_name: &str) -> Result<String> {
    let part = multipart::Part::bytes(bytes)
      .file_name(file_name.to_owned())
      .mime_str("image/jpeg")?;
    let form = multipart::Form::new().part("photo", part);

    let resp: UploadResponse = self
      .fetch_json(Method::POST, "/upload/photo", |r| r.multipart(form))
      .await?;
    Ok(resp.url)
  }

  // ── Matches ───────────────────────────────────────────────────────────────

  /// `GET /matches[?ageMin=..&religions=..]`
  pub async fn get_matches(&self, filters: Option<&UserPreferences>) -> Result<Vec<User>> {
    self
      .fetch_json(Method::GET, "/matches", |r| match filters {
        Some(prefs) => r.query(&preference_query(prefs)),
        None => r,
      })
      .await
  }

  /// `POST /matches/{id}/like`
  pub async fn like_profile(&self, id: &UserId) -> Result<LikeOutcome> {
    let path = format!("/matches/{}/like", segment(id.as_str()));
    self.fetch_json(Method::POST, &path, |r| r).await
  }

  /// `POST /matches/{id}/pass`
  pub async fn pass_profile(&self, id: &UserId) -> Result<()> {
    let path = format!("/matches/{}/pass", segment(id.as_str()));
    self.fetch_empty(Method::POST, &path, |r| r).await
  }

  /// `GET /matches/mutual`
  pub async fn get_mutual_matches(&self) -> Result<Vec<Match>> {
    self.fetch_json(Method::GET, "/matches/mutual", |r| r).await
  }

  /// `GET /matches/{id}/profile`
  pub async fn get_profile(&self, id: &UserId) -> Result<User> {
    let path = format!("/matches/{}/profile", segment(id.as_str()));
    self.fetch_json(Method::GET, &path, |r| r).await
  }

  /// `POST /matches/{id}/report`
  pub async fn report_profile(&self, id: &UserId, reason: &str) -> Result<()> {
    let path = format!("/matches/{}/report", segment(id.as_str()));
    self
      .fetch_empty(Method::POST, &path, |r| r.json(&json!({ "reason": reason })))
      .await
  }

  /// `POST /matches/{id}/block`
  pub async fn block_profile(&self, id: &UserId) -> Result<()> {
    let path = format!("/matches/{}/block", segment(id.as_str()));
    self.fetch_empty(Method::POST, &path, |r| r).await
  }

  // ── Chats ─────────────────────────────────────────────────────────────────

  /// `GET /chats`
  pub async fn get_chats(&self) -> Result<Vec<Chat>> {
    self.fetch_json(Method::GET, "/chats", |r| r).await
  }

  /// `GET /chats/{id}/messages`
  pub async fn get_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>> {
    let path = format!("/chats/{}/messages", segment(chat_id.as_str()));
    self.fetch_json(Method::GET, &path, |r| r).await
  }

  /// `POST /chats/{id}/messages`
  pub async fn send_message(&self, chat_id: &ChatId, content: &str) -> Result<Message> {
    let path = format!("/chats/{}/messages", segment(chat_id.as_str()));
    self
      .fetch_json(Method::POST, &path, |r| r.json(&json!({ "content": content })))
      .await
  }

  /// `PUT /chats/{id}/read`
  pub async fn mark_as_read(&self, chat_id: &ChatId) -> Result<()> {
    let path = format!("/chats/{}/read", segment(chat_id.as_str()));
    self.fetch_empty(Method::PUT, &path, |r| r).await
  }

  /// `POST /chats`
  pub async fn create_chat(&self, participant: &UserId) -> Result<Chat> {
    self
      .fetch_json(Method::POST, "/chats", |r| {
        r.json(&json!({ "participantId": participant }))
      })
      .await
  }
}

/// Percent-encode an opaque id for use as a single path segment.
fn segment(id: &str) -> String {
  let mut scratch = Url::parse("http://localhost/").expect("static url");
  scratch
    .path_segments_mut()
    .expect("http urls have a path")
    .push(id);
  scratch.path().trim_start_matches('/').to_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_joins_without_double_slash() {
    let api = ApiClient::new(ApiConfig {
      base_url: "http://example.test/api/".into(),
      ..ApiConfig::default()
    })
    .unwrap();
    assert_eq!(api.url("/chats"), "http://example.test/api/chats");
  }

  #[test]
  fn ids_are_escaped_as_one_segment() {
    assert_eq!(segment("abc-123"), "abc-123");
    assert_eq!(segment("a/b"), "a%2Fb");
    assert_eq!(segment("a b"), "a%20b");
    assert_eq!(segment("a+b"), "a+b");
    assert_eq!(segment("50%?#"), "50%25%3F%23");
  }

  #[test]
  fn empty_token_is_treated_as_none() {
    let mut api = ApiClient::new(ApiConfig::default()).unwrap();
    api.set_token(Some(String::new()));
    assert_eq!(api.token(), None);
    api.set_token(Some("tok".into()));
    assert_eq!(api.token(), Some("tok"));
  }
}
