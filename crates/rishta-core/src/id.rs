//! Opaque identifiers issued by the remote service.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
      Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(String);

    impl $name {
      pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

      pub fn as_str(&self) -> &str { &self.0 }

      pub fn is_empty(&self) -> bool { self.0.is_empty() }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $name {
      fn from(id: &str) -> Self { Self(id.to_owned()) }
    }

    impl From<String> for $name {
      fn from(id: String) -> Self { Self(id) }
    }
  };
}

string_id!(
  /// Identifies a user profile.
  UserId
);
string_id!(
  /// Identifies a conversation.
  ChatId
);
string_id!(
  /// Identifies a single chat message.
  MessageId
);
string_id!(
  /// Identifies a match record.
  MatchId
);
