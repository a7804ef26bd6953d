//! Conversations, messages and the chat state container.
//!
//! Messages are kept in arrival order per conversation. Nothing here sorts
//! by timestamp or drops a redelivered message, so the list reflects
//! exactly what was appended.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ChatId, MessageId, UserId};

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
  #[default]
  Text,
  Image,
  Audio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
  pub id:        MessageId,
  pub chat_id:   ChatId,
  pub sender_id: UserId,
  pub content:   String,
  #[serde(rename = "type", default)]
  pub kind:      MessageKind,
  pub timestamp: DateTime<Utc>,
  #[serde(default)]
  pub read:      bool,
}

/// A conversation summary as listed on the chat screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
  pub id:           ChatId,
  pub participants: Vec<UserId>,
  #[serde(default)]
  pub last_message: Option<Message>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Chat {
  /// The participant that is not `me`, for one-to-one conversations.
  pub fn other_participant(&self, me: &UserId) -> Option<&UserId> {
    self.participants.iter().find(|p| *p != me)
  }
}

// ─── ChatState ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ChatState {
  chats:    Vec<Chat>,
  current:  Option<ChatId>,
  messages: HashMap<ChatId, Vec<Message>>,
  typing:   HashMap<ChatId, bool>,
}

impl ChatState {
  pub fn new() -> Self { Self::default() }

  /// Replace the conversation list wholesale.
  pub fn set_conversations(&mut self, chats: Vec<Chat>) { self.chats = chats; }

  pub fn conversations(&self) -> &[Chat] { &self.chats }

  pub fn set_current_chat(&mut self, chat: Option<ChatId>) { self.current = chat; }

  pub fn current_chat(&self) -> Option<&ChatId> { self.current.as_ref() }

  /// Append to a conversation's history, creating it if this is the first
  /// message seen for `chat_id`.
  pub fn append_message(&mut self, chat_id: ChatId, message: Message) {
    self.messages.entry(chat_id).or_default().push(message);
  }

  /// Overwrite a conversation's full history.
  pub fn replace_messages(&mut self, chat_id: ChatId, messages: Vec<Message>) {
    self.messages.insert(chat_id, messages);
  }

  /// Messages for `chat_id` in insertion order; empty if none were seen.
  pub fn messages(&self, chat_id: &ChatId) -> &[Message] {
    self.messages.get(chat_id).map(Vec::as_slice).unwrap_or_default()
  }

  /// Last write wins; the flag has no timeout.
  pub fn set_typing(&mut self, chat_id: ChatId, is_typing: bool) {
    self.typing.insert(chat_id, is_typing);
  }

  pub fn is_typing(&self, chat_id: &ChatId) -> bool {
    self.typing.get(chat_id).copied().unwrap_or(false)
  }

  /// Flag every message in the conversation as read, mirroring the remote
  /// mark-as-read call.
  pub fn mark_read(&mut self, chat_id: &ChatId) {
    if let Some(messages) = self.messages.get_mut(chat_id) {
      for message in messages {
        message.read = true;
      }
    }
  }

  /// Unread messages in `chat_id` that were sent by someone other than `me`.
  pub fn unread_count(&self, chat_id: &ChatId, me: &UserId) -> usize {
    self
      .messages(chat_id)
      .iter()
      .filter(|m| !m.read && &m.sender_id != me)
      .count()
  }
}
