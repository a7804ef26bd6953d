//! The `SecureStore` trait and an in-memory implementation.
//!
//! The trait is implemented by storage backends (e.g. `rishta-store-sqlite`).
//! [`crate::auth::AuthState`] depends on this abstraction, not on any
//! concrete backend.

use std::{
  collections::HashMap,
  future::Future,
  sync::{PoisonError, RwLock},
};

use thiserror::Error;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A small string key/value store for secrets that must survive restarts.
///
/// All methods return `Send` futures so the store can be shared with tasks
/// on a multi-threaded runtime.
pub trait SecureStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read `key`. Returns `None` if it was never written or was deleted.
  fn get_item<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Write `value` under `key`, replacing any previous value.
  fn set_item<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove `key`. Deleting a missing key is not an error.
  fn delete_item<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── In-memory backend ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("memory store lock poisoned")]
pub struct MemoryStoreError;

impl<T> From<PoisonError<T>> for MemoryStoreError {
  fn from(_: PoisonError<T>) -> Self { Self }
}

/// A process-local [`SecureStore`]. Nothing survives a restart of the
/// process, which makes it suitable for tests and guest sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
  items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl SecureStore for MemoryStore {
  type Error = MemoryStoreError;

  async fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
    Ok(self.items.read()?.get(key).cloned())
  }

  async fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
    self.items.write()?.insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  async fn delete_item(&self, key: &str) -> Result<(), Self::Error> {
    self.items.write()?.remove(key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn set_get_delete() {
    let store = MemoryStore::new();
    assert_eq!(store.get_item("k").await.unwrap(), None);

    store.set_item("k", "v1").await.unwrap();
    store.set_item("k", "v2").await.unwrap();
    assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("v2"));

    store.delete_item("k").await.unwrap();
    store.delete_item("k").await.unwrap();
    assert_eq!(store.get_item("k").await.unwrap(), None);
  }
}
