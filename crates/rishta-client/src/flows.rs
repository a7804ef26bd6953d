//! Multi-step operations that call the remote service and then update the
//! local state, in the order the app's screens perform them.
//!
//! Flows return the closed [`rishta_core::Error`] taxonomy so callers can
//! show [`user_message`](rishta_core::Error::user_message) without knowing
//! about transport details.

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use rishta_core::{
  Result,
  auth::AuthState,
  chat::{ChatState, Message},
  id::ChatId,
  matching::{Decision, Match, MatchState, QueueVersion},
  onboarding::ProfileForm,
  profile::{User, UserPreferences},
  search::SearchFilters,
  store::SecureStore,
  validation::{validate_otp, validate_phone_number},
};

use crate::{ApiClient, RealtimeClient, api::OtpReceipt};

/// A profile photo picked for upload.
#[derive(Debug, Clone)]
pub struct Photo {
  pub bytes:     Vec<u8>,
  pub file_name: String,
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Validate the phone number, then ask the service to send a code.
pub async fn request_otp(api: &ApiClient, phone_number: &str) -> Result<OtpReceipt> {
  validate_phone_number(phone_number)?;
  let receipt = api.send_otp(phone_number).await?;
  info!(success = receipt.success, "otp requested");
  Ok(receipt)
}

/// Validate the code, verify it remotely and start a session.
pub async fn verify_and_login<S: SecureStore>(
  api: &mut ApiClient,
  auth: &mut AuthState<S>,
  phone_number: &str,
  otp: &str,
) -> Result<User> {
  validate_otp(otp)?;
  let resp = api.verify_otp(phone_number, otp).await?;
  api.set_token(Some(resp.token.clone()));
  auth.login(resp.token, resp.user.clone()).await;
  Ok(resp.user)
}

/// Rehydrate a stored session and hand its token to `api`. Returns whether
/// a session was restored.
pub async fn restore_session<S: SecureStore>(
  api: &mut ApiClient,
  auth: &mut AuthState<S>,
) -> bool {
  auth.load_stored_auth().await;
  api.set_token(auth.token().map(str::to_owned));
  auth.is_authenticated()
}

/// Exchange the current token for a fresh one and re-persist the session.
pub async fn refresh_session<S: SecureStore>(
  api: &mut ApiClient,
  auth: &mut AuthState<S>,
) -> Result<()> {
  let resp = api.refresh_token().await?;
  api.set_token(Some(resp.token.clone()));
  auth.login(resp.token, resp.user).await;
  Ok(())
}

/// Close the realtime channel, forget the session and drop the token.
pub async fn sign_out<S: SecureStore>(
  api: &mut ApiClient,
  auth: &mut AuthState<S>,
  realtime: &mut RealtimeClient,
) {
  realtime.disconnect().await;
  auth.logout().await;
  api.set_token(None);
}

/// Submit the onboarding form: upload the photo if one was picked, then
/// save the profile and adopt the returned user.
pub async fn complete_onboarding<S: SecureStore>(
  api: &ApiClient,
  auth: &mut AuthState<S>,
  form: &ProfileForm,
  photo: Option<Photo>,
  today: NaiveDate,
) -> Result<User> {
  form.validate(today)?;

  let mut update = form.to_update();
  let photo_url = match photo {
    Some(photo) => Some(api.upload_photo(photo.bytes, &photo.file_name).await?),
    None => None,
  };
  update.photos = Some(photo_url.iter().cloned().collect());
  update.profile_picture = photo_url;

  let user = api.update_profile(&update).await?;
  auth.set_user(user.clone()).await;
  info!(user_id = %user.id, "profile completed");
  Ok(user)
}

// ─── Discovery ───────────────────────────────────────────────────────────────

/// Fetch a fresh candidate queue and install it.
pub async fn refresh_queue(
  api: &ApiClient,
  matches: &Mutex<MatchState>,
  filters: Option<&UserPreferences>,
) -> Result<QueueVersion> {
  let candidates = api.get_matches(filters).await?;
  Ok(matches.lock().await.set_queue(candidates))
}

/// Run a filtered search. The results are a list to browse; the discovery
/// queue is not touched.
pub async fn search_profiles(api: &ApiClient, filters: &SearchFilters) -> Result<Vec<User>> {
  let prefs = filters.to_preferences()?;
  let results = api.get_matches(Some(&prefs)).await?;
  debug!(count = results.len(), "search returned");
  Ok(results)
}

/// What happened when the user decided on a candidate.
#[derive(Debug, Clone)]
pub struct DecisionReceipt {
  pub user:     User,
  pub decision: Decision,
  /// Queue generation the decision was made against; pass it to
  /// [`MatchState::advance_from`] once the card has left the screen.
  pub version:  QueueVersion,
  /// Set when the like was reciprocated.
  pub mutual:   Option<Match>,
  /// Whether the service acknowledged the decision.
  pub synced:   bool,
}

/// Record a like or pass on the current candidate and report it remotely.
///
/// The queue is not advanced. A remote failure is logged and reflected in
/// [`DecisionReceipt::synced`]; the local decision stands either way.
/// Returns `None` when there is no current candidate.
pub async fn decide(
  api: &ApiClient,
  matches: &Mutex<MatchState>,
  decision: Decision,
) -> Option<DecisionReceipt> {
  let (user, version) = {
    let mut state = matches.lock().await;
    let user = state.current()?.clone();
    state.record(decision, user.id.clone());
    (user, state.version())
  };

  let remote = match decision {
    Decision::Like => api
      .like_profile(&user.id)
      .await
      .map(|o| if o.mutual { o.matched } else { None }),
    Decision::Pass => api.pass_profile(&user.id).await.map(|()| None),
  };

  let (mutual, synced) = match remote {
    Ok(mutual) => (mutual, true),
    Err(e) => {
      error!(user_id = %user.id, ?decision, error = %e, "error reporting decision");
      (None, false)
    }
  };
  if let Some(m) = &mutual {
    matches.lock().await.add_mutual_match(m.clone());
  }

  Some(DecisionReceipt { user, decision, version, mutual, synced })
}

/// Load the list for the matches screen.
pub async fn load_mutual_matches(api: &ApiClient, matches: &Mutex<MatchState>) -> Result<usize> {
  let list = api.get_mutual_matches().await?;
  let n = list.len();
  matches.lock().await.set_matches(list);
  Ok(n)
}

// ─── Chat ────────────────────────────────────────────────────────────────────

/// Load the conversation list.
pub async fn load_conversations(api: &ApiClient, chat: &Mutex<ChatState>) -> Result<usize> {
  let chats = api.get_chats().await?;
  let n = chats.len();
  chat.lock().await.set_conversations(chats);
  Ok(n)
}

/// Load a conversation's history, make it current and join its room.
pub async fn open_chat(
  api: &ApiClient,
  chat: &Mutex<ChatState>,
  realtime: &RealtimeClient,
  chat_id: &ChatId,
) -> Result<usize> {
  let messages = api.get_messages(chat_id).await?;
  let n = messages.len();
  {
    let mut state = chat.lock().await;
    state.replace_messages(chat_id.clone(), messages);
    state.set_current_chat(Some(chat_id.clone()));
  }
  if !realtime.join_chat(chat_id) {
    debug!(%chat_id, "opened chat without a realtime connection");
  }
  Ok(n)
}

/// Leave the current conversation's room.
pub async fn close_chat(chat: &Mutex<ChatState>, realtime: &RealtimeClient) {
  let current = chat.lock().await.current_chat().cloned();
  if let Some(chat_id) = current {
    realtime.leave_chat(&chat_id);
    chat.lock().await.set_current_chat(None);
  }
}

/// Post a message and append the stored copy locally.
pub async fn send_chat_message(
  api: &ApiClient,
  chat: &Mutex<ChatState>,
  chat_id: &ChatId,
  content: &str,
) -> Result<Message> {
  let message = api.send_message(chat_id, content).await?;
  chat.lock().await.append_message(chat_id.clone(), message.clone());
  Ok(message)
}

/// Tell the service the conversation has been read and mirror it locally.
pub async fn mark_chat_read(
  api: &ApiClient,
  chat: &Mutex<ChatState>,
  chat_id: &ChatId,
) -> Result<()> {
  api.mark_as_read(chat_id).await?;
  chat.lock().await.mark_read(chat_id);
  Ok(())
}
