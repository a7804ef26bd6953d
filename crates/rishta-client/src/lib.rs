//! Remote access for the Rishta client.
//!
//! [`api::ApiClient`] talks to the JSON service over HTTP,
//! [`realtime::RealtimeClient`] keeps the event channel open, and
//! [`flows`] strings remote calls and state updates together the way the
//! app's screens do.

pub mod api;
pub mod error;
pub mod flows;
pub mod realtime;

pub use api::{ApiClient, ApiConfig};
pub use error::{Error, Result};
pub use realtime::{ConnectionState, RealtimeClient, RealtimeConfig, ReconnectPolicy};

/// State shared between the caller and the realtime task.
pub type Shared<T> = std::sync::Arc<tokio::sync::Mutex<T>>;

#[cfg(test)]
mod mock;
