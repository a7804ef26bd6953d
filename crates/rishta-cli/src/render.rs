//! Plain-text rendering of profiles, matches and conversations.

use chrono::{DateTime, NaiveDate, Utc};
use rishta_client::realtime::Inbound;
use rishta_core::{
  chat::{Chat, Message},
  id::UserId,
  matching::Match,
  profile::{User, UserPreferences},
};

/// "Just now" within the hour, "5h ago" within the day, a date otherwise.
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let hours = (now - at).num_hours();
  if hours < 1 {
    "Just now".to_owned()
  } else if hours < 24 {
    format!("{hours}h ago")
  } else {
    at.format("%d/%m/%Y").to_string()
  }
}

/// A multi-line profile card.
pub fn profile_card(user: &User, today: NaiveDate) -> String {
  let mut heading = user.display_name();
  if let Some(age) = user.age_on(today) {
    heading.push_str(&format!(", {age}"));
  }
  if user.verified {
    heading.push_str(" ✓");
  }

  let mut lines = vec![heading];
  let marital = user.marital_status.map(|m| m.label().to_owned()).unwrap_or_default();
  let details = joined(&[&user.height, &user.religion, &user.caste, &marital]);
  if !details.is_empty() {
    lines.push(details);
  }
  let work = joined(&[&user.profession, &user.education]);
  if !work.is_empty() {
    lines.push(work);
  }
  let place = [user.city.as_str(), user.state.as_str()]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(", ");
  if !place.is_empty() {
    lines.push(place);
  }
  if let Some(bio) = user.bio.as_deref().filter(|b| !b.is_empty()) {
    lines.push(String::new());
    lines.push(bio.to_owned());
  }
  if !user.interests.is_empty() {
    lines.push(format!("Interests: {}", user.interests.join(", ")));
  }
  if let Some(looking_for) = preferences_summary(&user.preferences) {
    lines.push(format!("Looking for: {looking_for}"));
  }
  lines.join("\n")
}

/// One line describing who the user wants to meet; `None` when no
/// preferences have been set.
pub fn preferences_summary(prefs: &UserPreferences) -> Option<String> {
  if *prefs == UserPreferences::default() {
    return None;
  }
  let mut parts = Vec::new();
  let ages = &prefs.age_range;
  if ages.max > 0 {
    parts.push(format!("{} to {} years", ages.min, ages.max));
  }
  let heights = &prefs.height_range;
  if !heights.min.is_empty() && !heights.max.is_empty() {
    parts.push(format!("{} to {}", heights.min, heights.max));
  }
  for list in [
    &prefs.religions,
    &prefs.castes,
    &prefs.educations,
    &prefs.professions,
    &prefs.marital_statuses,
    &prefs.locations.cities,
    &prefs.locations.states,
  ] {
    if !list.is_empty() {
      parts.push(list.join("/"));
    }
  }
  (!parts.is_empty()).then(|| parts.join(", "))
}

fn joined(parts: &[&String]) -> String {
  parts
    .iter()
    .filter(|s| !s.is_empty())
    .map(|s| s.as_str())
    .collect::<Vec<_>>()
    .join(" · ")
}

pub fn match_line(m: &Match) -> String {
  format!(
    "{}  {:.0}% match  (matched {})",
    m.user.display_name(),
    m.match_percentage,
    m.matched_at.format("%-d %b %Y"),
  )
}

pub fn chat_line(chat: &Chat, me: &UserId, unread: usize, now: DateTime<Utc>) -> String {
  let with = chat
    .other_participant(me)
    .map(UserId::as_str)
    .unwrap_or("unknown");
  let preview = chat
    .last_message
    .as_ref()
    .map(|m| m.content.as_str())
    .unwrap_or("Start a conversation");
  let badge = if unread > 0 { format!(" ({unread} new)") } else { String::new() };
  format!(
    "{}  {with}{badge}  {}  · {}",
    chat.id,
    preview,
    relative_time(chat.updated_at, now),
  )
}

pub fn message_line(message: &Message, me: &UserId) -> String {
  let who = if &message.sender_id == me { "you" } else { message.sender_id.as_str() };
  format!("[{}] {who}: {}", message.timestamp.format("%H:%M"), message.content)
}

pub fn event_line(event: &Inbound) -> String {
  match event {
    Inbound::NewMessage(m) => format!("{}  {}: {}", m.chat_id, m.sender_id, m.content),
    Inbound::Typing(t) if t.is_typing => format!("{}  {} is typing…", t.chat_id, t.user_id),
    Inbound::Typing(t) => format!("{}  {} stopped typing", t.chat_id, t.user_id),
    Inbound::MatchNotification(m) => format!("It's a match! {}", match_line(m)),
    Inbound::Unknown { event } => format!("(unhandled event {event})"),
  }
}
