//! Layered settings: built-in defaults, then an optional TOML file, then
//! `RISHTA_*` environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use rishta_client::{
  ApiConfig, RealtimeConfig, ReconnectPolicy,
  api::DEFAULT_API_URL,
  realtime::{DEFAULT_MAX_ATTEMPTS, DEFAULT_SOCKET_URL},
};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub api_url:                 String,
  pub socket_url:              String,
  /// Secure store file; a leading `~/` is expanded.
  pub store_path:              PathBuf,
  pub request_timeout_secs:    u64,
  pub reconnect_base_delay_ms: u64,
  pub max_reconnect_attempts:  u32,
  /// Width in points used to simulate swipes.
  pub screen_width:            f32,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      api_url:                 DEFAULT_API_URL.to_owned(),
      socket_url:              DEFAULT_SOCKET_URL.to_owned(),
      store_path:              PathBuf::from("~/.local/share/rishta/secure.db"),
      request_timeout_secs:    30,
      reconnect_base_delay_ms: 1000,
      max_reconnect_attempts:  DEFAULT_MAX_ATTEMPTS,
      screen_width:            390.0,
    }
  }
}

impl Settings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("RISHTA"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn api(&self) -> ApiConfig {
    ApiConfig {
      base_url: self.api_url.clone(),
      timeout:  Duration::from_secs(self.request_timeout_secs),
    }
  }

  pub fn realtime(&self) -> RealtimeConfig {
    RealtimeConfig {
      url:    self.socket_url.clone(),
      policy: ReconnectPolicy {
        base_delay:   Duration::from_millis(self.reconnect_base_delay_ms),
        max_attempts: self.max_reconnect_attempts,
      },
    }
  }

  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
