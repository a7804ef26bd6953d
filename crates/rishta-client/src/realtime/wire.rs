//! Frame codec for the realtime channel.
//!
//! Every text frame is a JSON envelope `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rishta_core::{chat::Message, id::{ChatId, UserId}, matching::Match};

/// Another participant started or stopped typing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
  pub chat_id:   ChatId,
  #[serde(default)]
  pub user_id:   UserId,
  pub is_typing: bool,
}

/// Events pushed by the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
  NewMessage(Message),
  Typing(TypingEvent),
  MatchNotification(Match),
  /// An event this client does not handle.
  Unknown { event: String },
}

/// Events emitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Outbound {
  JoinChat(ChatId),
  LeaveChat(ChatId),
  #[serde(rename_all = "camelCase")]
  SendMessage { chat_id: ChatId, message: String },
  #[serde(rename_all = "camelCase")]
  Typing { chat_id: ChatId, is_typing: bool },
}

impl Outbound {
  pub fn name(&self) -> &'static str {
    match self {
      Self::JoinChat(_) => "join_chat",
      Self::LeaveChat(_) => "leave_chat",
      Self::SendMessage { .. } => "send_message",
      Self::Typing { .. } => "typing",
    }
  }
}

#[derive(Deserialize)]
struct Envelope {
  event: String,
  #[serde(default)]
  data:  Value,
}

/// Decode one inbound text frame.
pub fn decode(frame: &str) -> serde_json::Result<Inbound> {
  let Envelope { event, data } = serde_json::from_str(frame)?;
  Ok(match event.as_str() {
    "new_message" => Inbound::NewMessage(serde_json::from_value(data)?),
    "typing" => Inbound::Typing(serde_json::from_value(data)?),
    "match_notification" => Inbound::MatchNotification(serde_json::from_value(data)?),
    _ => Inbound::Unknown { event },
  })
}

/// Encode one outbound event as a text frame.
pub fn encode(event: &Outbound) -> serde_json::Result<String> { serde_json::to_string(event) }
