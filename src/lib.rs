//! # Registrar (account registration client)
//!
//! `registrar` talks to a remote account-management service. It submits
//! new-account requests and keeps a small authenticated-session contract for
//! every API call made afterwards.
//!
//! ## Layers
//!
//! - **Session store** ([`session`]): the current bearer token and cached user
//!   identity, persisted as `authToken` / `authUser` in a key-value store.
//! - **API gateway** ([`gateway`]): every outbound request goes through it. It
//!   attaches `Authorization: Bearer` when a token is present and, on any `401`,
//!   clears the session and emits a `SessionExpired` event.
//! - **Registration workflow** ([`register`]): validates the form locally, posts
//!   it to `/register` and normalizes the outcome into a [`register::SubmissionResult`].
//! - **Events** ([`events`]): the signals presentation subscribes to instead of
//!   the core navigating on its own.
//!
//! Tokens and passwords are wrapped in `secrecy` types and must never be logged.

pub mod cli;
pub mod config;
pub mod events;
pub mod gateway;
pub mod register;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
