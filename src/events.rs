//! Presentation signals emitted by the core.
//!
//! The core never navigates or renders on its own. It publishes [`UiEvent`]s
//! on a broadcast channel and the presentation layer (the CLI here) decides
//! how to show them. The bus also carries the presentation layer's current
//! location, which the gateway consults before asking for a login redirect.

use crate::register::{ErrorKind, UserSummary};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::trace;

/// Route of the authentication entry point.
pub const LOGIN_PATH: &str = "/login";
/// Notice shown to the user when a session is invalidated.
pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please sign in again.";

const EVENT_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginRedirect {
    pub path: String,
    pub notice: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    ValidationFailed { reason: String },
    SubmissionFailed { kind: ErrorKind, message: String },
    SubmissionSucceeded { user: UserSummary },
    /// Emitted once per `401`. `redirect` is `None` when the user is already on
    /// the login page.
    SessionExpired { redirect: Option<LoginRedirect> },
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<UiEvent>,
    location: Arc<RwLock<String>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            sender,
            location: Arc::new(RwLock::new(String::from("/"))),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event; having no subscribers is not an error.
    pub fn emit(&self, event: UiEvent) {
        if self.sender.send(event).is_err() {
            trace!("ui event dropped: no subscribers");
        }
    }

    pub fn set_location(&self, path: impl Into<String>) {
        let mut location = self
            .location
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *location = path.into();
    }

    #[must_use]
    pub fn location(&self) -> String {
        self.location
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn on_login_page(&self) -> bool {
        self.location().trim_end_matches('/') == LOGIN_PATH
    }

    /// Redirect to emit with `SessionExpired` for the current location.
    #[must_use]
    pub fn login_redirect(&self) -> Option<LoginRedirect> {
        if self.on_login_page() {
            None
        } else {
            Some(LoginRedirect {
                path: LOGIN_PATH.to_string(),
                notice: SESSION_EXPIRED_NOTICE.to_string(),
            })
        }
    }
}
