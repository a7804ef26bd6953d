//! Command handlers over a signed-in (or signing-in) session.

use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{Context as _, Result, bail};
use chrono::{Local, NaiveDate, Utc};
use rishta_client::{
  ApiClient, ConnectionState, RealtimeClient, Shared,
  flows::{self, Photo},
};
use rishta_core::{
  auth::{AuthState, OTP_RESEND_SECS},
  chat::ChatState,
  id::{ChatId, UserId},
  matching::{Decision, MatchState, QueueVersion},
  onboarding::{Onboarding, ProfileForm},
  profile::User,
  search::SearchFilters,
  swipe::{EXIT_DURATION, SwipeGesture, SwipeOutcome},
};
use rishta_store_sqlite::SqliteSecureStore;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{render, settings::Settings};

/// What discovery shows once a decided card has left the screen.
#[derive(Debug, PartialEq)]
enum NextCard<'a> {
  Next(&'a User),
  Exhausted,
  /// The queue was replaced while the card was leaving.
  Replaced,
}

fn next_card(state: &mut MatchState, version: QueueVersion) -> NextCard<'_> {
  if state.version() != version {
    return NextCard::Replaced;
  }
  state.advance_from(version);
  match state.current() {
    Some(user) => NextCard::Next(user),
    None => NextCard::Exhausted,
  }
}

/// What to do with the candidate on screen.
#[derive(Debug, Clone, Copy)]
pub enum Action {
  Like,
  Pass,
  /// Release a drag at this horizontal offset.
  Swipe(f32),
}

pub struct App {
  settings: Settings,
  api:      ApiClient,
  auth:     AuthState<SqliteSecureStore>,
  chat:     Shared<ChatState>,
  matches:  Shared<MatchState>,
  realtime: RealtimeClient,
}

impl App {
  /// Open the secure store and restore any saved session.
  pub async fn open(settings: Settings) -> Result<Self> {
    let store_path = settings.store_path();
    let store = SqliteSecureStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open secure store at {store_path:?}"))?;

    let mut api = ApiClient::new(settings.api()).context("failed to build HTTP client")?;
    let mut auth = AuthState::new(store);
    let restored = flows::restore_session(&mut api, &mut auth).await;
    debug!(restored, "session check");

    let chat = Arc::new(Mutex::new(ChatState::new()));
    let matches = Arc::new(Mutex::new(MatchState::new()));
    let realtime =
      RealtimeClient::new(settings.realtime(), Arc::clone(&chat), Arc::clone(&matches));

    Ok(Self { settings, api, auth, chat, matches, realtime })
  }

  fn today() -> NaiveDate { Local::now().date_naive() }

  fn me(&self) -> Result<&User> {
    match self.auth.user() {
      Some(user) => Ok(user),
      None => bail!("Not signed in. Run `rishta login <phone>` first."),
    }
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  pub async fn login(&mut self, phone_number: &str) -> Result<()> {
    let receipt = flows::request_otp(&self.api, phone_number).await?;
    if !receipt.message.is_empty() {
      println!("{}", receipt.message);
    }
    println!(
      "Enter the code with `rishta verify {phone_number} <otp>`. \
       You can request a new one in {OTP_RESEND_SECS}s."
    );
    Ok(())
  }

  pub async fn verify(&mut self, phone_number: &str, otp: &str) -> Result<()> {
    let user = flows::verify_and_login(&mut self.api, &mut self.auth, phone_number, otp).await?;
    info!(user_id = %user.id, "signed in");
    if user.is_onboarded() {
      println!("Welcome back, {}!", user.first_name);
    } else {
      println!("Signed in. Complete your profile with `rishta onboard`.");
    }
    Ok(())
  }

  pub async fn refresh(&mut self) -> Result<()> {
    self.me()?;
    flows::refresh_session(&mut self.api, &mut self.auth).await?;
    println!("Session refreshed.");
    Ok(())
  }

  pub async fn logout(&mut self) -> Result<()> {
    flows::sign_out(&mut self.api, &mut self.auth, &mut self.realtime).await;
    println!("Signed out.");
    Ok(())
  }

  pub fn whoami(&self) -> Result<()> {
    let me = self.me()?;
    println!("{}", render::profile_card(me, Self::today()));
    if !me.is_onboarded() {
      println!("\nProfile incomplete. Run `rishta onboard`.");
    }
    Ok(())
  }

  // ── Onboarding ────────────────────────────────────────────────────────────

  pub async fn onboard(&mut self, form: ProfileForm, photo: Option<&Path>) -> Result<()> {
    self.me()?;
    let today = Self::today();

    let mut wizard = Onboarding::new();
    wizard.form = form;
    loop {
      let (step, total) = wizard.progress();
      println!("Step {step} of {total}: {}", wizard.step().title());
      if wizard.is_last_step() {
        break;
      }
      wizard.next(today).map_err(rishta_core::Error::from)?;
    }

    let photo = match photo {
      Some(path) => Some(Photo {
        bytes:     tokio::fs::read(path)
          .await
          .with_context(|| format!("failed to read photo {}", path.display()))?,
        file_name: path
          .file_name()
          .map(|n| n.to_string_lossy().into_owned())
          .unwrap_or_else(|| "photo.jpg".to_owned()),
      }),
      None => None,
    };

    let user =
      flows::complete_onboarding(&self.api, &mut self.auth, &wizard.form, photo, today).await?;
    println!("Profile saved.\n\n{}", render::profile_card(&user, today));
    Ok(())
  }

  // ── Discovery ─────────────────────────────────────────────────────────────

  pub async fn discover(
    &mut self,
    filters: Option<&SearchFilters>,
    action: Option<Action>,
  ) -> Result<()> {
    self.me()?;
    let today = Self::today();
    let prefs = filters
      .map(SearchFilters::to_preferences)
      .transpose()
      .map_err(rishta_core::Error::from)?;
    flows::refresh_queue(&self.api, &self.matches, prefs.as_ref()).await?;

    let Some(current) = self.matches.lock().await.current().cloned() else {
      println!("No more profiles. Check back later for new matches!");
      return Ok(());
    };
    println!("{}", render::profile_card(&current, today));

    let decision = match action {
      None => return Ok(()),
      Some(Action::Like) => Decision::Like,
      Some(Action::Pass) => Decision::Pass,
      Some(Action::Swipe(dx)) => {
        let gesture = SwipeGesture::new(self.settings.screen_width);
        match gesture.release(dx) {
          SwipeOutcome::Commit(decision) => decision,
          SwipeOutcome::Reset => {
            println!(
              "\nA {dx:.0}pt drag is inside the {:.0}pt threshold; the card springs back.",
              gesture.threshold()
            );
            return Ok(());
          }
        }
      }
    };

    let Some(receipt) = flows::decide(&self.api, &self.matches, decision).await else {
      return Ok(());
    };
    match receipt.decision {
      Decision::Like => println!("\nLiked {}.", receipt.user.first_name),
      Decision::Pass => println!("\nPassed on {}.", receipt.user.first_name),
    }
    if receipt.mutual.is_some() {
      println!("It's a Match! You and {} liked each other!", receipt.user.first_name);
    }
    if !receipt.synced {
      println!("Could not reach the server; your choice was kept on this device.");
    }

    // The card leaves the screen before the next one is promoted.
    tokio::time::sleep(EXIT_DURATION).await;
    let mut state = self.matches.lock().await;
    match next_card(&mut state, receipt.version) {
      NextCard::Next(next) => println!("\nNext up:\n{}", render::profile_card(next, today)),
      NextCard::Exhausted => println!("\nNo more profiles. Check back later for new matches!"),
      NextCard::Replaced => println!("\nThe list of profiles changed. Run `rishta discover` again."),
    }
    Ok(())
  }

  /// List every profile matching `filters`. Discovery is left as it was.
  pub async fn search(&self, filters: &SearchFilters) -> Result<()> {
    self.me()?;
    let today = Self::today();
    let results = flows::search_profiles(&self.api, filters).await?;
    if results.is_empty() {
      println!("No profiles match these filters.");
    }
    for (i, user) in results.iter().enumerate() {
      if i > 0 {
        println!();
      }
      println!("{}\n{}", user.id, render::profile_card(user, today));
    }
    Ok(())
  }

  pub async fn profile(&self, id: &UserId) -> Result<()> {
    self.me()?;
    let user = self.api.get_profile(id).await.map_err(rishta_core::Error::from)?;
    println!("{}", render::profile_card(&user, Self::today()));
    Ok(())
  }

  pub async fn report(&self, id: &UserId, reason: &str) -> Result<()> {
    self.me()?;
    self.api.report_profile(id, reason).await.map_err(rishta_core::Error::from)?;
    println!("Thanks. We will review this profile.");
    Ok(())
  }

  pub async fn block(&self, id: &UserId) -> Result<()> {
    self.me()?;
    self.api.block_profile(id).await.map_err(rishta_core::Error::from)?;
    println!("Blocked.");
    Ok(())
  }

  pub async fn matches(&self) -> Result<()> {
    self.me()?;
    flows::load_mutual_matches(&self.api, &self.matches).await?;
    let state = self.matches.lock().await;
    if state.matches().is_empty() {
      println!("No matches yet. Keep swiping!");
    }
    for m in state.matches() {
      println!("{}  {}", m.user.id, render::match_line(m));
    }
    Ok(())
  }

  // ── Chat ──────────────────────────────────────────────────────────────────

  pub async fn chats(&self) -> Result<()> {
    let me = self.me()?.id.clone();
    flows::load_conversations(&self.api, &self.chat).await?;
    let state = self.chat.lock().await;
    if state.conversations().is_empty() {
      println!("No conversations yet.");
    }
    let now = Utc::now();
    for chat in state.conversations() {
      let unread = state.unread_count(&chat.id, &me);
      println!("{}", render::chat_line(chat, &me, unread, now));
    }
    Ok(())
  }

  pub async fn start_chat(&self, with: &UserId) -> Result<()> {
    self.me()?;
    let chat = self.api.create_chat(with).await.map_err(rishta_core::Error::from)?;
    println!("Started conversation {}.", chat.id);
    Ok(())
  }

  pub async fn messages(&self, chat_id: &ChatId, mark_read: bool) -> Result<()> {
    let me = self.me()?.id.clone();
    flows::open_chat(&self.api, &self.chat, &self.realtime, chat_id).await?;
    {
      let state = self.chat.lock().await;
      for message in state.messages(chat_id) {
        println!("{}", render::message_line(message, &me));
      }
    }
    if mark_read {
      flows::mark_chat_read(&self.api, &self.chat, chat_id).await?;
    }
    Ok(())
  }

  pub async fn send(&self, chat_id: &ChatId, content: &str) -> Result<()> {
    let me = self.me()?.id.clone();
    let content = content.trim();
    if content.is_empty() {
      bail!("Message is empty.");
    }
    let message = flows::send_chat_message(&self.api, &self.chat, chat_id, content).await?;
    println!("{}", render::message_line(&message, &me));
    Ok(())
  }

  /// Stay connected to the realtime channel and print events until Ctrl-C.
  pub async fn listen(&mut self, chat_id: Option<&ChatId>) -> Result<()> {
    self.me()?;
    let token = self.auth.token().unwrap_or_default().to_owned();
    let mut events = self.realtime.subscribe();
    let mut state = self.realtime.watch_state();
    if !self.realtime.connect(&token).await.map_err(rishta_core::Error::from)? {
      bail!("Not signed in. Run `rishta login <phone>` first.");
    }
    let mut supervision = tokio::time::interval(Duration::from_secs(1));

    loop {
      tokio::select! {
        _ = tokio::signal::ctrl_c() => break,
        changed = state.changed() => {
          if changed.is_err() {
            break;
          }
          let now = *state.borrow_and_update();
          println!("-- {now:?}");
          if now == ConnectionState::Connected
            && let Some(chat_id) = chat_id
          {
            self.realtime.join_chat(chat_id);
          }
        }
        _ = supervision.tick() => {
          if !self.realtime.is_running() {
            bail!("Realtime connection lost.");
          }
        }
        event = events.recv() => match event {
          Ok(event) => println!("{}", render::event_line(&event)),
          Err(e) => debug!(error = %e, "event stream lagged"),
        },
      }
    }

    if let Some(chat_id) = chat_id {
      self.realtime.leave_chat(chat_id);
    }
    self.realtime.disconnect().await;
    Ok(())
  }
}
