//! The realtime event channel.
//!
//! A [`RealtimeClient`] owns one supervisor task per session. The task dials
//! the socket, feeds inbound events into the shared chat and match state,
//! writes outbound emissions, and redials after an unexpected drop according
//! to its [`ReconnectPolicy`].

mod policy;
pub mod wire;

use std::sync::Arc;

use futures_util::{SinkExt as _, StreamExt as _};
use tokio::{
  net::TcpStream,
  sync::{broadcast, mpsc, watch},
  task::JoinHandle,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message as Frame};
use tracing::{debug, info, warn};
use url::Url;

use rishta_core::{chat::ChatState, id::ChatId, matching::MatchState};

pub use policy::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, ReconnectPolicy};
pub use wire::{Inbound, Outbound, TypingEvent};

use crate::{Result, Shared};

pub const DEFAULT_SOCKET_URL: &str = "ws://localhost:3000/socket";

/// Capacity of the inbound event fan-out. Slow subscribers lose the oldest
/// events; the shared state is always updated.
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
  Disconnected,
  Connecting,
  Connected,
}

#[derive(Debug, Clone)]
pub struct RealtimeConfig {
  pub url:    String,
  pub policy: ReconnectPolicy,
}

impl Default for RealtimeConfig {
  fn default() -> Self {
    Self { url: DEFAULT_SOCKET_URL.to_owned(), policy: ReconnectPolicy::default() }
  }
}

struct Inner {
  config:  RealtimeConfig,
  chat:    Shared<ChatState>,
  matches: Shared<MatchState>,
  state:   watch::Sender<ConnectionState>,
  events:  broadcast::Sender<Inbound>,
}

struct Worker {
  outbound: mpsc::UnboundedSender<Outbound>,
  shutdown: watch::Sender<bool>,
  task:     JoinHandle<()>,
}

/// Client for the realtime channel. Inbound events are applied to the chat
/// and match state handed in at construction.
pub struct RealtimeClient {
  inner:  Arc<Inner>,
  worker: Option<Worker>,
}

impl RealtimeClient {
  pub fn new(
    config: RealtimeConfig,
    chat: Shared<ChatState>,
    matches: Shared<MatchState>,
  ) -> Self {
    let (state, _) = watch::channel(ConnectionState::Disconnected);
    let (events, _) = broadcast::channel(EVENT_BUFFER);
    Self {
      inner: Arc::new(Inner { config, chat, matches, state, events }),
      worker: None,
    }
  }

  pub fn state(&self) -> ConnectionState { *self.inner.state.borrow() }

  pub fn watch_state(&self) -> watch::Receiver<ConnectionState> { self.inner.state.subscribe() }

  /// Receive every decoded inbound event after it has been applied.
  pub fn subscribe(&self) -> broadcast::Receiver<Inbound> { self.inner.events.subscribe() }

  /// Whether a supervisor task is still alive (connected, dialling or
  /// waiting to redial).
  pub fn is_running(&self) -> bool {
    self.worker.as_ref().is_some_and(|w| !w.task.is_finished())
  }

  /// Open the channel with `token`. An empty token does nothing and returns
  /// `false`. Any previous session is closed first.
  pub async fn connect(&mut self, token: &str) -> Result<bool> {
    if token.is_empty() {
      debug!("no token; not connecting");
      return Ok(false);
    }

    let mut url = Url::parse(&self.inner.config.url)?;
    url.query_pairs_mut().append_pair("token", token);

    self.disconnect().await;

    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(supervise(
      Arc::clone(&self.inner),
      url,
      outbound_rx,
      shutdown_rx,
    ));
    self.worker = Some(Worker { outbound, shutdown, task });
    Ok(true)
  }

  /// Close the channel deliberately. No reconnection follows.
  pub async fn disconnect(&mut self) {
    let Some(worker) = self.worker.take() else { return };
    worker.shutdown.send_replace(true);
    if let Err(e) = worker.task.await {
      warn!(error = %e, "realtime task ended abnormally");
    }
    self.inner.state.send_replace(ConnectionState::Disconnected);
  }

  pub fn join_chat(&self, chat_id: &ChatId) -> bool {
    self.emit(Outbound::JoinChat(chat_id.clone()))
  }

  pub fn leave_chat(&self, chat_id: &ChatId) -> bool {
    self.emit(Outbound::LeaveChat(chat_id.clone()))
  }

  pub fn send_message(&self, chat_id: &ChatId, message: impl Into<String>) -> bool {
    self.emit(Outbound::SendMessage { chat_id: chat_id.clone(), message: message.into() })
  }

  pub fn send_typing(&self, chat_id: &ChatId, is_typing: bool) -> bool {
    self.emit(Outbound::Typing { chat_id: chat_id.clone(), is_typing })
  }

  /// Queue an emission if connected. Emissions are never retried or
  /// buffered across a disconnect.
  fn emit(&self, event: Outbound) -> bool {
    let worker = match &self.worker {
      Some(w) if self.state() == ConnectionState::Connected => w,
      _ => {
        debug!(event = event.name(), "not connected; dropping emission");
        return false;
      }
    };
    worker.outbound.send(event).is_ok()
  }
}

// ─── Supervisor ──────────────────────────────────────────────────────────────

enum Ended {
  /// The client asked to close.
  Closed,
  /// The connection went away on its own.
  Dropped,
}

async fn supervise(
  inner: Arc<Inner>,
  url: Url,
  mut outbound: mpsc::UnboundedReceiver<Outbound>,
  mut shutdown: watch::Receiver<bool>,
) {
  let mut attempt = 0;
  loop {
    inner.state.send_replace(ConnectionState::Connecting);
    let dial = tokio::select! {
      _ = shutdown.changed() => break,
      dial = tokio_tungstenite::connect_async(url.as_str()) => dial,
    };

    match dial {
      Ok((ws, _)) => {
        attempt = 0;
        // Anything queued while the previous connection was dying is stale.
        while outbound.try_recv().is_ok() {}
        inner.state.send_replace(ConnectionState::Connected);
        info!("realtime connected");

        match pump(&inner, ws, &mut outbound, &mut shutdown).await {
          Ended::Closed => break,
          Ended::Dropped => {
            inner.state.send_replace(ConnectionState::Disconnected);
            warn!("realtime connection dropped");
          }
        }
      }
      Err(e) => {
        inner.state.send_replace(ConnectionState::Disconnected);
        warn!(error = %e, "realtime connect failed");
      }
    }

    attempt += 1;
    let Some(delay) = inner.config.policy.delay_for(attempt) else {
      warn!(attempts = attempt - 1, "giving up on realtime reconnection");
      break;
    };
    debug!(attempt, ?delay, "scheduling realtime reconnect");
    tokio::select! {
      _ = shutdown.changed() => break,
      _ = tokio::time::sleep(delay) => {}
    }
  }

  inner.state.send_replace(ConnectionState::Disconnected);
  info!("realtime disconnected");
}

async fn pump(
  inner: &Inner,
  ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
  outbound: &mut mpsc::UnboundedReceiver<Outbound>,
  shutdown: &mut watch::Receiver<bool>,
) -> Ended {
  let (mut sink, mut stream) = ws.split();

  loop {
    tokio::select! {
      _ = shutdown.changed() => {
        let _ = sink.send(Frame::Close(None)).await;
        return Ended::Closed;
      }

      event = outbound.recv() => {
        let Some(event) = event else {
          let _ = sink.send(Frame::Close(None)).await;
          return Ended::Closed;
        };
        let frame = match wire::encode(&event) {
          Ok(frame) => frame,
          Err(e) => {
            warn!(event = event.name(), error = %e, "could not encode emission");
            continue;
          }
        };
        if let Err(e) = sink.send(Frame::Text(frame)).await {
          warn!(event = event.name(), error = %e, "realtime write failed");
          return Ended::Dropped;
        }
        debug!(event = event.name(), "emitted");
      }

      frame = stream.next() => match frame {
        Some(Ok(Frame::Text(text))) => inner.dispatch(&text).await,
        Some(Ok(Frame::Close(_))) | None => return Ended::Dropped,
        Some(Ok(_)) => {}
        Some(Err(e)) => {
          warn!(error = %e, "realtime read failed");
          return Ended::Dropped;
        }
      },
    }
  }
}

impl Inner {
  /// Apply one inbound frame to the shared state, then fan it out.
  async fn dispatch(&self, frame: &str) {
    let event = match wire::decode(frame) {
      Ok(event) => event,
      Err(e) => {
        warn!(error = %e, "undecodable realtime frame");
        return;
      }
    };

    match &event {
      Inbound::NewMessage(message) => {
        self.chat.lock().await.append_message(message.chat_id.clone(), message.clone());
      }
      Inbound::Typing(typing) => {
        self.chat.lock().await.set_typing(typing.chat_id.clone(), typing.is_typing);
      }
      Inbound::MatchNotification(m) => {
        self.matches.lock().await.add_mutual_match(m.clone());
      }
      Inbound::Unknown { event } => debug!(%event, "ignoring realtime event"),
    }

    // No subscribers is fine.
    let _ = self.events.send(event);
  }
}
