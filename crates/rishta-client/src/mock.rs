//! In-process stand-in for the remote service, used by the tests.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/auth/send-otp` | 429 for `9999999999` |
//! | `POST` | `/api/auth/verify-otp` | accepts `123456`, token `tok-<phone>` |
//! | `POST` | `/api/auth/refresh` | |
//! | `PUT`  | `/api/auth/profile` | echoes the update over a stock profile |
//! | `POST` | `/api/upload/photo` | multipart field `photo` |
//! | `GET`  | `/api/matches` | candidates `u-a`, `u-b`, `u-c` |
//! | `POST` | `/api/matches/{id}/like` | `u-b` likes back; `u-c` fails with 503 |
//! | ...    | chats and the rest | |
//! | `GET`  | `/socket?token=` | websocket; 401 unless accepting |

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
  time::Duration,
};

use axum::{
  Json, Router,
  body::{Body, Bytes},
  extract::{
    Path, Query, Request, State,
    ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
  },
  http::{HeaderMap, StatusCode, header},
  middleware::{self, Next},
  response::{IntoResponse, Response},
  routing::{get, post, put},
};
use chrono::{TimeZone as _, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc, watch};

use rishta_core::{
  chat::{Chat, Message, MessageKind},
  id::{ChatId, MatchId, MessageId, UserId},
  matching::{Match, MatchStatus},
  profile::User,
};

pub const GOOD_OTP: &str = "123456";
pub const THROTTLED_PHONE: &str = "9999999999";
pub const PHOTO_URL: &str = "https://cdn.rishta.test/photos/1.jpg";

const TIMEOUT: Duration = Duration::from_secs(5);

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub fn user(id: &str, first_name: &str) -> User {
  User {
    id: UserId::new(id),
    phone_number: "9876543210".into(),
    first_name: first_name.into(),
    last_name: "Sharma".into(),
    city: "Pune".into(),
    state: "Maharashtra".into(),
    ..User::default()
  }
}

pub fn candidates() -> Vec<User> {
  vec![user("u-a", "Asha"), user("u-b", "Bhavna"), user("u-c", "Chitra")]
}

pub fn mutual_match(with: User) -> Match {
  Match {
    id:               MatchId::new(format!("m-{}", with.id)),
    user:             with,
    match_percentage: 87.0,
    matched_at:       Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
    status:           MatchStatus::Mutual,
  }
}

pub fn message(id: &str, chat_id: &str, sender: &str, content: &str) -> Message {
  Message {
    id:        MessageId::new(id),
    chat_id:   ChatId::new(chat_id),
    sender_id: UserId::new(sender),
    content:   content.into(),
    kind:      MessageKind::Text,
    timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
    read:      false,
  }
}

pub fn chat(id: &str, other: &str) -> Chat {
  let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
  Chat {
    id:           ChatId::new(id),
    participants: vec![UserId::new("u-me"), UserId::new(other)],
    last_message: None,
    created_at:   at,
    updated_at:   at,
  }
}

// ─── Server ──────────────────────────────────────────────────────────────────

/// One request as the service saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
  pub method:       String,
  pub path:         String,
  pub query:        Option<String>,
  pub bearer:       Option<String>,
  pub content_type: Option<String>,
  pub body:         String,
}

pub struct MockState {
  pub requests:       Mutex<Vec<Recorded>>,
  pub socket_hits:    AtomicUsize,
  pub accept_sockets: AtomicBool,
  sessions:           watch::Sender<usize>,
  to_clients:         broadcast::Sender<String>,
  kick:               broadcast::Sender<()>,
  from_clients:       mpsc::UnboundedSender<String>,
}

pub struct MockServer {
  pub api_url:    String,
  pub socket_url: String,
  pub state:      Arc<MockState>,
  from_clients:   tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
}

impl MockServer {
  pub async fn start() -> Self {
    let (from_tx, from_rx) = mpsc::unbounded_channel();
    let state = Arc::new(MockState {
      requests:       Mutex::new(Vec::new()),
      socket_hits:    AtomicUsize::new(0),
      accept_sockets: AtomicBool::new(true),
      sessions:       watch::channel(0).0,
      to_clients:     broadcast::channel(16).0,
      kick:           broadcast::channel(4).0,
      from_clients:   from_tx,
    });

    let api = Router::new()
      .route("/auth/send-otp", post(send_otp))
      .route("/auth/verify-otp", post(verify_otp))
      .route("/auth/refresh", post(refresh))
      .route("/auth/profile", put(update_profile))
      .route("/upload/photo", post(upload_photo))
      .route("/matches", get(get_matches))
      .route("/matches/mutual", get(get_mutual))
      .route("/matches/{id}/like", post(like))
      .route("/matches/{id}/pass", post(no_content))
      .route("/matches/{id}/profile", get(get_profile))
      .route("/matches/{id}/report", post(report))
      .route("/matches/{id}/block", post(no_content))
      .route("/chats", get(get_chats).post(create_chat))
      .route("/chats/{id}/messages", get(get_messages).post(post_message))
      .route("/chats/{id}/read", put(no_content))
      .layer(middleware::from_fn_with_state(Arc::clone(&state), record));

    let app = Router::new()
      .nest("/api", api)
      .route("/socket", get(socket))
      .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    Self {
      api_url: format!("http://{addr}/api"),
      socket_url: format!("ws://{addr}/socket"),
      state,
      from_clients: tokio::sync::Mutex::new(from_rx),
    }
  }

  pub fn requests(&self) -> Vec<Recorded> { self.state.requests.lock().unwrap().clone() }

  /// The most recent request to `path`.
  pub fn last_request(&self, path: &str) -> Option<Recorded> {
    self.requests().into_iter().rev().find(|r| r.path == path)
  }

  /// Wait until at least `n` websocket sessions have been opened in total.
  pub async fn wait_for_sessions(&self, n: usize) {
    let mut rx = self.state.sessions.subscribe();
    tokio::time::timeout(TIMEOUT, rx.wait_for(|opened| *opened >= n))
      .await
      .expect("timed out waiting for a socket session")
      .unwrap();
  }

  /// Push an event to every connected socket.
  pub fn push(&self, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    let _ = self.state.to_clients.send(frame);
  }

  /// Close every connected socket from the server side.
  pub fn kick(&self) { let _ = self.state.kick.send(()); }

  /// The next frame a client sent, decoded.
  pub async fn next_from_client(&self) -> Value {
    let mut rx = self.from_clients.lock().await;
    let frame = tokio::time::timeout(TIMEOUT, rx.recv())
      .await
      .expect("timed out waiting for a client frame")
      .unwrap();
    serde_json::from_str(&frame).unwrap()
  }
}

// ─── Plumbing ────────────────────────────────────────────────────────────────

type AppState = State<Arc<MockState>>;

async fn record(State(state): AppState, req: Request, next: Next) -> Response {
  let (parts, body) = req.into_parts();
  let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
  let header_value = |name: header::HeaderName| {
    parts
      .headers
      .get(name)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned)
  };

  state.requests.lock().unwrap().push(Recorded {
    method:       parts.method.to_string(),
    path:         parts.uri.path().to_owned(),
    query:        parts.uri.query().map(str::to_owned),
    bearer:       header_value(header::AUTHORIZATION)
      .and_then(|v| v.strip_prefix("Bearer ").map(str::to_owned)),
    content_type: header_value(header::CONTENT_TYPE),
    body:         String::from_utf8_lossy(&bytes).into_owned(),
  });

  next.run(Request::from_parts(parts, Body::from(bytes))).await
}

enum MockError {
  Unauthorized,
  BadRequest(&'static str),
  NotFound,
  Throttled,
  Unavailable,
}

impl IntoResponse for MockError {
  fn into_response(self) -> Response {
    match self {
      Self::Unauthorized => {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response()
      }
      Self::BadRequest(m) => (StatusCode::BAD_REQUEST, Json(json!({ "message": m }))).into_response(),
      Self::NotFound => StatusCode::NOT_FOUND.into_response(),
      Self::Throttled => {
        (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": "Too many requests" }))).into_response()
      }
      Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
  }
}

type Reply<T = Json<Value>> = Result<T, MockError>;

fn authed(headers: &HeaderMap) -> Result<(), MockError> {
  let ok = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .is_some_and(|token| token.starts_with("tok-"));
  if ok { Ok(()) } else { Err(MockError::Unauthorized) }
}

fn to_json(value: impl serde::Serialize) -> Json<Value> { Json(serde_json::to_value(value).unwrap()) }

// ─── Auth ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OtpBody {
  phone_number: String,
  #[serde(default)]
  otp:          String,
}

async fn send_otp(Json(body): Json<OtpBody>) -> Reply {
  if body.phone_number == THROTTLED_PHONE {
    return Err(MockError::Throttled);
  }
  Ok(Json(json!({ "success": true, "message": "OTP sent successfully" })))
}

async fn verify_otp(Json(body): Json<OtpBody>) -> Reply {
  if body.otp != GOOD_OTP {
    return Err(MockError::BadRequest("Invalid OTP"));
  }
  let user = User {
    id: UserId::new(format!("u-{}", body.phone_number)),
    phone_number: body.phone_number.clone(),
    ..User::default()
  };
  Ok(Json(json!({ "token": format!("tok-{}", body.phone_number), "user": user })))
}

async fn refresh(headers: HeaderMap) -> Reply {
  authed(&headers)?;
  Ok(Json(json!({ "token": "tok-refreshed", "user": user("u-me", "Meera") })))
}

async fn update_profile(headers: HeaderMap, Json(update): Json<Value>) -> Reply {
  authed(&headers)?;
  let mut profile = serde_json::to_value(User {
    id: UserId::new("u-me"),
    phone_number: "9876543210".into(),
    ..User::default()
  })
  .unwrap();
  if let (Some(profile), Some(update)) = (profile.as_object_mut(), update.as_object()) {
    profile.extend(update.clone());
  }
  Ok(Json(profile))
}

async fn upload_photo(headers: HeaderMap, body: Bytes) -> Reply {
  authed(&headers)?;
  let multipart = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.starts_with("multipart/form-data"));
  let body = String::from_utf8_lossy(&body);
  if !multipart || !body.contains("name=\"photo\"") || !body.contains("image/jpeg") {
    return Err(MockError::BadRequest("No photo uploaded"));
  }
  Ok(Json(json!({ "url": PHOTO_URL })))
}

// ─── Matches ─────────────────────────────────────────────────────────────────

async fn get_matches(headers: HeaderMap) -> Reply {
  authed(&headers)?;
  Ok(to_json(candidates()))
}

async fn get_mutual(headers: HeaderMap) -> Reply {
  authed(&headers)?;
  Ok(to_json(vec![mutual_match(user("u-b", "Bhavna"))]))
}

async fn like(headers: HeaderMap, Path(id): Path<String>) -> Reply {
  authed(&headers)?;
  match id.as_str() {
    "u-b" => Ok(Json(json!({
      "mutual": true,
      "match": mutual_match(user("u-b", "Bhavna")),
    }))),
    "u-c" => Err(MockError::Unavailable),
    _ => Ok(Json(json!({ "mutual": false }))),
  }
}

async fn get_profile(headers: HeaderMap, Path(id): Path<String>) -> Reply {
  authed(&headers)?;
  candidates()
    .into_iter()
    .find(|u| u.id.as_str() == id)
    .map(to_json)
    .ok_or(MockError::NotFound)
}

#[derive(Deserialize)]
struct ReportBody {
  #[serde(default)]
  reason: String,
}

async fn report(headers: HeaderMap, Json(body): Json<ReportBody>) -> Reply<StatusCode> {
  authed(&headers)?;
  if body.reason.trim().is_empty() {
    return Err(MockError::BadRequest("A reason is required"));
  }
  Ok(StatusCode::NO_CONTENT)
}

async fn no_content(headers: HeaderMap) -> Reply<StatusCode> {
  authed(&headers)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Chats ───────────────────────────────────────────────────────────────────

async fn get_chats(headers: HeaderMap) -> Reply {
  authed(&headers)?;
  Ok(to_json(vec![chat("c1", "u-b")]))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateChatBody {
  participant_id: String,
}

async fn create_chat(headers: HeaderMap, Json(body): Json<CreateChatBody>) -> Reply {
  authed(&headers)?;
  Ok(to_json(chat(&format!("c-{}", body.participant_id), &body.participant_id)))
}

async fn get_messages(headers: HeaderMap, Path(id): Path<String>) -> Reply {
  authed(&headers)?;
  Ok(to_json(vec![
    message("m1", &id, "u-b", "Hello!"),
    message("m2", &id, "u-me", "Hi, how are you?"),
  ]))
}

#[derive(Deserialize)]
struct PostMessageBody {
  content: String,
}

async fn post_message(
  headers: HeaderMap,
  Path(id): Path<String>,
  Json(body): Json<PostMessageBody>,
) -> Reply {
  authed(&headers)?;
  Ok(to_json(message("m-new", &id, "u-me", &body.content)))
}

// ─── Socket ──────────────────────────────────────────────────────────────────

async fn socket(
  State(state): AppState,
  Query(params): Query<HashMap<String, String>>,
  ws: WebSocketUpgrade,
) -> Response {
  state.socket_hits.fetch_add(1, Ordering::SeqCst);
  let token_ok = params.get("token").is_some_and(|t| t.starts_with("tok-"));
  if !state.accept_sockets.load(Ordering::SeqCst) || !token_ok {
    return StatusCode::UNAUTHORIZED.into_response();
  }
  ws.on_upgrade(move |socket| serve_socket(state, socket))
}

async fn serve_socket(state: Arc<MockState>, mut socket: WebSocket) {
  let mut push = state.to_clients.subscribe();
  let mut kick = state.kick.subscribe();
  state.sessions.send_modify(|opened| *opened += 1);

  loop {
    tokio::select! {
      frame = push.recv() => {
        let Ok(frame) = frame else { break };
        if socket.send(WsMessage::Text(frame.into())).await.is_err() {
          break;
        }
      }
      _ = kick.recv() => {
        let _ = socket.send(WsMessage::Close(None)).await;
        break;
      }
      incoming = socket.recv() => match incoming {
        Some(Ok(WsMessage::Text(text))) => {
          let _ = state.from_clients.send(text.as_str().to_owned());
        }
        Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
        Some(Ok(_)) => {}
      },
    }
  }
}
