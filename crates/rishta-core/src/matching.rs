//! Match records and the discovery queue.
//!
//! Deciding on a candidate and moving past it are two separate steps: the
//! swipe-out animation runs between them. [`MatchState::like_profile`] and
//! [`MatchState::pass_profile`] only record the decision; the queue moves on
//! when the caller invokes [`MatchState::load_next_match`] (or
//! [`MatchState::advance_from`], which also guards against a queue
//! replacement that landed in the meantime).

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  id::{MatchId, UserId},
  profile::User,
};

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
  Pending,
  Liked,
  Passed,
  Mutual,
}

/// A candidate together with the service's view of how well they match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
  pub id:               MatchId,
  pub user:             User,
  pub match_percentage: f32,
  pub matched_at:       DateTime<Utc>,
  pub status:           MatchStatus,
}

/// Response to a like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeOutcome {
  pub mutual:  bool,
  /// Present when `mutual` is true.
  #[serde(rename = "match", default)]
  pub matched: Option<Match>,
}

/// What the user did with the current candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Like,
  Pass,
}

// ─── Queue version ───────────────────────────────────────────────────────────

/// Identifies one generation of the candidate queue. Bumped on every
/// replacement so that an advance computed against an older queue can be
/// recognised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueVersion(u64);

// ─── MatchState ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MatchState {
  queue:   VecDeque<User>,
  version: QueueVersion,
  liked:   Vec<UserId>,
  passed:  Vec<UserId>,
  mutual:  Vec<Match>,
  matches: Vec<Match>,
}

impl MatchState {
  pub fn new() -> Self { Self::default() }

  // ── Queue ─────────────────────────────────────────────────────────────

  /// Replace the queue wholesale. The new head becomes current.
  pub fn set_queue(&mut self, candidates: Vec<User>) -> QueueVersion {
    self.queue = candidates.into();
    self.version = QueueVersion(self.version.0 + 1);
    debug!(len = self.queue.len(), version = self.version.0, "queue replaced");
    self.version
  }

  /// The candidate on screen: always the head of the queue.
  pub fn current(&self) -> Option<&User> { self.queue.front() }

  pub fn queue(&self) -> impl ExactSizeIterator<Item = &User> { self.queue.iter() }

  pub fn remaining(&self) -> usize { self.queue.len() }

  pub fn version(&self) -> QueueVersion { self.version }

  /// Drop the current candidate and promote the next one. Returns the
  /// dropped candidate; a no-op on an empty queue.
  pub fn load_next_match(&mut self) -> Option<User> {
    let dropped = self.queue.pop_front();
    if let Some(user) = &dropped {
      debug!(user_id = %user.id, remaining = self.queue.len(), "advanced queue");
    }
    dropped
  }

  /// Advance only if the queue is still the generation identified by
  /// `version`. Returns whether the queue moved.
  pub fn advance_from(&mut self, version: QueueVersion) -> bool {
    if version != self.version {
      debug!(
        stale = version.0,
        current = self.version.0,
        "ignoring advance against a replaced queue"
      );
      return false;
    }
    self.load_next_match().is_some()
  }

  // ── Decisions ─────────────────────────────────────────────────────────

  /// Record a like. Does not advance the queue.
  pub fn like_profile(&mut self, id: UserId) { self.liked.push(id); }

  /// Record a pass. Does not advance the queue.
  pub fn pass_profile(&mut self, id: UserId) { self.passed.push(id); }

  pub fn record(&mut self, decision: Decision, id: UserId) {
    match decision {
      Decision::Like => self.like_profile(id),
      Decision::Pass => self.pass_profile(id),
    }
  }

  pub fn liked(&self) -> &[UserId] { &self.liked }

  pub fn passed(&self) -> &[UserId] { &self.passed }

  // ── Matches ───────────────────────────────────────────────────────────

  /// Append a reciprocal like reported by the service or pushed over the
  /// realtime channel.
  pub fn add_mutual_match(&mut self, m: Match) {
    debug!(match_id = %m.id, "mutual match");
    self.mutual.push(m);
  }

  pub fn mutual_matches(&self) -> &[Match] { &self.mutual }

  /// Replace the list shown on the matches screen.
  pub fn set_matches(&mut self, matches: Vec<Match>) { self.matches = matches; }

  pub fn matches(&self) -> &[Match] { &self.matches }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn candidate(id: &str) -> User {
    User { id: UserId::new(id), first_name: id.to_uppercase(), ..User::default() }
  }

  fn ids(state: &MatchState) -> Vec<&str> {
    state.queue().map(|u| u.id.as_str()).collect()
  }

  fn current_id(state: &MatchState) -> Option<&str> {
    state.current().map(|u| u.id.as_str())
  }

  #[test]
  fn set_queue_makes_head_current() {
    let mut state = MatchState::new();
    state.set_queue(vec![candidate("a"), candidate("b")]);
    assert_eq!(current_id(&state), Some("a"));

    state.set_queue(Vec::new());
    assert_eq!(current_id(&state), None);
  }

  #[test]
  fn decisions_do_not_advance() {
    let mut state = MatchState::new();
    state.set_queue(vec![candidate("a"), candidate("b")]);
    state.like_profile(UserId::new("a"));
    state.pass_profile(UserId::new("a"));
    state.like_profile(UserId::new("a"));
    assert_eq!(current_id(&state), Some("a"));
    assert_eq!(state.liked().len(), 2);
    assert_eq!(state.passed().len(), 1);
  }

  #[test]
  fn advancing_empty_queue_is_noop() {
    let mut state = MatchState::new();
    assert!(state.load_next_match().is_none());
    assert_eq!(current_id(&state), None);
    assert_eq!(state.remaining(), 0);
  }

  #[test]
  fn like_then_advance_walkthrough() {
    let mut state = MatchState::new();
    state.set_queue(vec![candidate("a"), candidate("b"), candidate("c")]);

    state.load_next_match();
    assert_eq!(ids(&state), ["b", "c"]);
    assert_eq!(current_id(&state), Some("b"));

    state.like_profile(UserId::new("b"));
    assert_eq!(state.liked(), [UserId::new("b")]);
    assert_eq!(current_id(&state), Some("b"));

    state.load_next_match();
    assert_eq!(ids(&state), ["c"]);
    assert_eq!(current_id(&state), Some("c"));

    state.load_next_match();
    assert_eq!(current_id(&state), None);
  }

  #[test]
  fn stale_advance_after_replacement_is_ignored() {
    let mut state = MatchState::new();
    let old = state.set_queue(vec![candidate("a"), candidate("b")]);
    state.record(Decision::Pass, UserId::new("a"));

    // A fresh fetch lands before the swipe-out animation finishes.
    let new = state.set_queue(vec![candidate("x"), candidate("y")]);
    assert!(new > old);

    assert!(!state.advance_from(old));
    assert_eq!(current_id(&state), Some("x"));

    assert!(state.advance_from(new));
    assert_eq!(current_id(&state), Some("y"));
  }

  #[test]
  fn like_outcome_deserialises_match_field() {
    let json = serde_json::json!({
      "mutual": true,
      "match": {
        "id": "m1",
        "user": { "id": "b" },
        "matchPercentage": 87.5,
        "matchedAt": "2025-01-01T10:00:00Z",
        "status": "mutual"
      }
    });
    let outcome: LikeOutcome = serde_json::from_value(json).unwrap();
    assert!(outcome.mutual);
    let m = outcome.matched.unwrap();
    assert_eq!(m.status, MatchStatus::Mutual);
    assert_eq!(m.user.id.as_str(), "b");

    let plain: LikeOutcome =
      serde_json::from_value(serde_json::json!({ "mutual": false })).unwrap();
    assert!(plain.matched.is_none());
  }

  #[test]
  fn mutual_matches_append() {
    let mut state = MatchState::new();
    let m = Match {
      id:               MatchId::new("m1"),
      user:             candidate("b"),
      match_percentage: 90.0,
      matched_at:       Utc::now(),
      status:           MatchStatus::Mutual,
    };
    state.add_mutual_match(m.clone());
    state.add_mutual_match(m);
    assert_eq!(state.mutual_matches().len(), 2);
  }
}
