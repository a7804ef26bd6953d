//! Session state and its persistence.
//!
//! The session token and the profile always travel together: both are set
//! by [`AuthState::login`], both are cleared by [`AuthState::logout`], and a
//! restart only restores a session when both were found in storage.
//!
//! Storage failures never reach the caller. They are logged and the
//! in-memory state is kept, which can leave memory ahead of storage until
//! the next successful write.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{profile::User, store::SecureStore};

/// Secure-storage key holding the opaque session token.
pub const TOKEN_KEY: &str = "auth_token";
/// Secure-storage key holding the JSON-serialised profile.
pub const USER_KEY: &str = "user_data";

/// Seconds a user must wait before requesting another OTP.
pub const OTP_RESEND_SECS: u32 = 30;

// ─── Session ─────────────────────────────────────────────────────────────────

/// An authenticated session. Also the body of a successful OTP verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  pub token: String,
  pub user:  User,
}

// ─── AuthState ───────────────────────────────────────────────────────────────

/// Holds the current session and mirrors it into a [`SecureStore`].
pub struct AuthState<S> {
  store:      S,
  session:    Option<Session>,
  is_loading: bool,
}

impl<S: SecureStore> AuthState<S> {
  /// A fresh, unauthenticated state. `is_loading` stays `true` until the
  /// first rehydration, login or logout.
  pub fn new(store: S) -> Self {
    Self { store, session: None, is_loading: true }
  }

  pub fn session(&self) -> Option<&Session> { self.session.as_ref() }

  pub fn token(&self) -> Option<&str> {
    self.session.as_ref().map(|s| s.token.as_str())
  }

  pub fn user(&self) -> Option<&User> { self.session.as_ref().map(|s| &s.user) }

  pub fn is_authenticated(&self) -> bool { self.session.is_some() }

  pub fn is_loading(&self) -> bool { self.is_loading }

  pub fn store(&self) -> &S { &self.store }

  /// Start a session and persist it.
  pub async fn login(&mut self, token: impl Into<String>, user: User) {
    let session = Session { token: token.into(), user };
    debug!(user_id = %session.user.id, "login");
    if let Err(e) = self.persist(&session).await {
      error!(error = %e, "error storing auth data");
    }
    self.session = Some(session);
    self.is_loading = false;
  }

  /// End the session and erase it from storage.
  pub async fn logout(&mut self) {
    debug!("logout");
    self.session = None;
    self.is_loading = false;
    for key in [TOKEN_KEY, USER_KEY] {
      if let Err(e) = self.store.delete_item(key).await {
        error!(error = %e, key, "error clearing auth data");
      }
    }
  }

  /// Restore a session saved by a previous [`login`](Self::login).
  ///
  /// The session is only restored when both the token and a parseable
  /// profile are present; anything else leaves the state unauthenticated.
  pub async fn load_stored_auth(&mut self) {
    self.is_loading = false;

    let token = match self.store.get_item(TOKEN_KEY).await {
      Ok(token) => token,
      Err(e) => {
        error!(error = %e, "error loading stored auth");
        return;
      }
    };
    let user_data = match self.store.get_item(USER_KEY).await {
      Ok(data) => data,
      Err(e) => {
        error!(error = %e, "error loading stored auth");
        return;
      }
    };

    let (Some(token), Some(user_data)) = (token, user_data) else {
      debug!("no stored session");
      return;
    };
    if token.is_empty() {
      debug!("stored token is empty");
      return;
    }

    match serde_json::from_str::<User>(&user_data) {
      Ok(user) => {
        debug!(user_id = %user.id, "restored stored session");
        self.session = Some(Session { token, user });
      }
      Err(e) => warn!(error = %e, "stored profile is not valid JSON"),
    }
  }

  /// Replace the profile of the current session, e.g. after an update
  /// round-trip. Does nothing when unauthenticated.
  pub async fn set_user(&mut self, user: User) {
    let Some(session) = self.session.as_mut() else {
      warn!("ignoring profile update without a session");
      return;
    };
    session.user = user;

    let write = match serde_json::to_string(&session.user) {
      Ok(json) => self.store.set_item(USER_KEY, &json).await.map_err(|e| e.to_string()),
      Err(e) => Err(e.to_string()),
    };
    if let Err(e) = write {
      error!(error = %e, "error storing profile");
    }
  }

  async fn persist(&self, session: &Session) -> Result<(), PersistError<S::Error>> {
    let user_json = serde_json::to_string(&session.user)?;
    self
      .store
      .set_item(TOKEN_KEY, &session.token)
      .await
      .map_err(PersistError::Store)?;
    self
      .store
      .set_item(USER_KEY, &user_json)
      .await
      .map_err(PersistError::Store)?;
    Ok(())
  }
}

#[derive(Debug, thiserror::Error)]
enum PersistError<E> {
  #[error("{0}")]
  Store(E),
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

// ─── OTP resend countdown ────────────────────────────────────────────────────

/// Cooldown between OTP requests, advanced once per second by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendCountdown {
  remaining: u32,
}

impl Default for ResendCountdown {
  fn default() -> Self { Self { remaining: OTP_RESEND_SECS } }
}

impl ResendCountdown {
  pub fn new() -> Self { Self::default() }

  /// Advance by one second and return the seconds left.
  pub fn tick(&mut self) -> u32 {
    self.remaining = self.remaining.saturating_sub(1);
    self.remaining
  }

  pub fn remaining(&self) -> u32 { self.remaining }

  pub fn can_resend(&self) -> bool { self.remaining == 0 }

  /// Start a new cooldown after a resend.
  pub fn restart(&mut self) { self.remaining = OTP_RESEND_SECS; }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{id::UserId, store::MemoryStore};

  fn asha() -> User {
    User {
      id: UserId::new("u-asha"),
      phone_number: "9876543210".into(),
      first_name: "Asha".into(),
      last_name: "Verma".into(),
      ..User::default()
    }
  }

  /// A store whose writes always fail but whose reads work.
  #[derive(Default)]
  struct ReadOnlyStore(MemoryStore);

  #[derive(Debug, thiserror::Error)]
  #[error("read-only store")]
  struct ReadOnly;

  impl SecureStore for ReadOnlyStore {
    type Error = ReadOnly;

    async fn get_item(&self, key: &str) -> Result<Option<String>, ReadOnly> {
      self.0.get_item(key).await.map_err(|_| ReadOnly)
    }

    async fn set_item(&self, _key: &str, _value: &str) -> Result<(), ReadOnly> {
      Err(ReadOnly)
    }

    async fn delete_item(&self, _key: &str) -> Result<(), ReadOnly> {
      Err(ReadOnly)
    }
  }

  #[tokio::test]
  async fn starts_loading_and_unauthenticated() {
    let auth = AuthState::new(MemoryStore::new());
    assert!(auth.is_loading());
    assert!(!auth.is_authenticated());
    assert!(auth.token().is_none());
  }

  #[tokio::test]
  async fn login_then_restart_restores_session() {
    let mut auth = AuthState::new(MemoryStore::new());
    auth.login("tok-1", asha()).await;
    assert!(auth.is_authenticated());
    assert!(!auth.is_loading());

    // Simulate a restart over the same storage.
    let mut restarted = AuthState::new(auth.store);
    restarted.load_stored_auth().await;
    assert_eq!(restarted.token(), Some("tok-1"));
    assert_eq!(restarted.user(), Some(&asha()));
  }

  #[tokio::test]
  async fn logout_clears_memory_and_storage() {
    let mut auth = AuthState::new(MemoryStore::new());
    auth.login("tok-1", asha()).await;
    auth.logout().await;
    assert!(!auth.is_authenticated());
    assert!(auth.user().is_none());

    let mut restarted = AuthState::new(auth.store);
    restarted.load_stored_auth().await;
    assert!(!restarted.is_authenticated());
    assert!(!restarted.is_loading());
  }

  #[tokio::test]
  async fn token_without_profile_is_not_a_session() {
    let store = MemoryStore::new();
    store.set_item(TOKEN_KEY, "tok-1").await.unwrap();

    let mut auth = AuthState::new(store);
    auth.load_stored_auth().await;
    assert!(!auth.is_authenticated());
  }

  #[tokio::test]
  async fn unparseable_profile_is_not_a_session() {
    let store = MemoryStore::new();
    store.set_item(TOKEN_KEY, "tok-1").await.unwrap();
    store.set_item(USER_KEY, "{not json").await.unwrap();

    let mut auth = AuthState::new(store);
    auth.load_stored_auth().await;
    assert!(!auth.is_authenticated());
    assert!(!auth.is_loading());
  }

  #[tokio::test]
  async fn failed_write_keeps_memory_ahead_of_storage() {
    let mut auth = AuthState::new(ReadOnlyStore::default());
    auth.login("tok-1", asha()).await;
    assert!(auth.is_authenticated());

    let mut restarted = AuthState::new(auth.store);
    restarted.load_stored_auth().await;
    assert!(!restarted.is_authenticated());
  }

  #[tokio::test]
  async fn set_user_requires_a_session() {
    let mut auth = AuthState::new(MemoryStore::new());
    auth.set_user(asha()).await;
    assert!(auth.user().is_none());
    assert_eq!(auth.store().get_item(USER_KEY).await.unwrap(), None);
  }

  #[tokio::test]
  async fn set_user_persists_the_new_profile() {
    let mut auth = AuthState::new(MemoryStore::new());
    auth.login("tok-1", User::default()).await;
    auth.set_user(asha()).await;

    let mut restarted = AuthState::new(auth.store);
    restarted.load_stored_auth().await;
    assert_eq!(restarted.user().map(|u| u.first_name.as_str()), Some("Asha"));
  }

  #[test]
  fn resend_countdown_reaches_zero_and_restarts() {
    let mut countdown = ResendCountdown::new();
    assert!(!countdown.can_resend());
    for _ in 0..OTP_RESEND_SECS + 5 {
      countdown.tick();
    }
    assert!(countdown.can_resend());
    countdown.restart();
    assert_eq!(countdown.remaining(), OTP_RESEND_SECS);
  }
}
