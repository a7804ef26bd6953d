//! Core types, state containers and rules for the Rishta matrimonial client.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! remote service and the realtime channel live in `rishta-client`; durable
//! session storage lives behind the [`store::SecureStore`] trait.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod auth;
pub mod catalog;
pub mod chat;
pub mod error;
pub mod id;
pub mod matching;
pub mod onboarding;
pub mod profile;
pub mod search;
pub mod store;
pub mod swipe;
pub mod validation;

pub use error::{Error, Result};
