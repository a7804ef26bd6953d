//! Linear reconnection backoff.

use std::time::Duration;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// How the realtime client retries after losing its connection.
///
/// The n-th consecutive attempt waits `n × base_delay`. A successful
/// connection resets the count; once `max_attempts` is used up the client
/// stays disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
  pub base_delay:   Duration,
  pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
  fn default() -> Self {
    Self { base_delay: DEFAULT_BASE_DELAY, max_attempts: DEFAULT_MAX_ATTEMPTS }
  }
}

impl ReconnectPolicy {
  /// Delay before the 1-based `attempt`, or `None` past the ceiling.
  pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
    (1..=self.max_attempts)
      .contains(&attempt)
      .then(|| self.base_delay * attempt)
  }
}
