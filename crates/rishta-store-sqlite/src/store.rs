//! [`SqliteSecureStore`], the SQLite implementation of [`SecureStore`].

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use rishta_core::store::SecureStore;

use crate::{
  Error, Result,
  schema::{SCHEMA, SCHEMA_VERSION},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A secure key/value store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteSecureStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteSecureStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  /// Missing parent directories are created; on Unix the file is made
  /// readable by its owner only.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await?;
    }

    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    restrict_permissions(path).await?;
    debug!(path = %path.display(), "opened secure store");
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let found: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?))
      .await?;
    if found > SCHEMA_VERSION {
      return Err(Error::SchemaVersion { found, supported: SCHEMA_VERSION });
    }

    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of stored items.
  pub async fn len(&self) -> Result<usize> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM secure_items", [], |r| r.get(0))?)
      })
      .await?;
    Ok(usize::try_from(count).unwrap_or_default())
  }

  pub async fn is_empty(&self) -> Result<bool> { Ok(self.len().await? == 0) }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
  use std::os::unix::fs::PermissionsExt as _;
  tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
  Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> { Ok(()) }

// ─── SecureStore impl ────────────────────────────────────────────────────────

impl SecureStore for SqliteSecureStore {
  type Error = Error;

  async fn get_item(&self, key: &str) -> Result<Option<String>> {
    let key = key.to_owned();
    let value = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM secure_items WHERE key = ?1",
              rusqlite::params![key],
              |r| r.get::<_, String>(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(value)
  }

  async fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let key        = key.to_owned();
    let value      = value.to_owned();
    let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO secure_items (key, value, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET
             value      = excluded.value,
             updated_at = excluded.updated_at",
          rusqlite::params![key, value, updated_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_item(&self, key: &str) -> Result<()> {
    let key = key.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM secure_items WHERE key = ?1",
          rusqlite::params![key],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
