//! Mapping from a horizontal drag to a like/pass decision.
//!
//! A release past 30% of the screen width in either direction commits the
//! decision; anything shorter springs the card back.

use std::time::Duration;

use crate::matching::Decision;

/// Fraction of the screen width a drag must exceed to commit.
pub const COMMIT_FRACTION: f32 = 0.3;
/// Fraction of the screen width over which the card fades out.
pub const FADE_FRACTION: f32 = 0.7;
/// Duration of the card's exit animation after a commit.
pub const EXIT_DURATION: Duration = Duration::from_millis(250);
/// Duration of the opacity restore when the card springs back.
pub const RESET_DURATION: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
  Commit(Decision),
  Reset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeGesture {
  pub screen_width: f32,
}

impl SwipeGesture {
  pub fn new(screen_width: f32) -> Self { Self { screen_width } }

  pub fn threshold(&self) -> f32 { self.screen_width * COMMIT_FRACTION }

  /// Decide what a release at horizontal offset `dx` means.
  pub fn release(&self, dx: f32) -> SwipeOutcome {
    let threshold = self.threshold();
    if dx > threshold {
      SwipeOutcome::Commit(Decision::Like)
    } else if dx < -threshold {
      SwipeOutcome::Commit(Decision::Pass)
    } else {
      SwipeOutcome::Reset
    }
  }

  /// Card opacity while dragging at offset `dx`.
  pub fn opacity(&self, dx: f32) -> f32 {
    let span = self.screen_width * FADE_FRACTION;
    if span <= 0.0 {
      return 1.0;
    }
    (1.0 - dx.abs() / span).clamp(0.0, 1.0)
  }

  /// Where the card ends up once the exit animation completes.
  pub fn exit_offset(&self, decision: Decision) -> f32 {
    match decision {
      Decision::Like => self.screen_width,
      Decision::Pass => -self.screen_width,
    }
  }
}
