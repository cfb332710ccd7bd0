//! Registration workflow: one account-creation attempt from entered field
//! values to a [`SubmissionResult`].
//!
//! Flow Overview: validate the form locally, post it to `/register` through the
//! [`Gateway`], then normalize the outcome. The network is never touched with
//! invalid input, and a second submission while one is in flight is rejected.
//! The workflow never writes the session store.

mod types;
mod validation;

pub use types::{ErrorKind, RegistrationForm, RegistrationRequest, SubmissionResult, UserSummary};
pub use validation::{validate, ValidationIssue, ValidationOutcome, MIN_PASSWORD_LENGTH};

use crate::{
    events::{EventBus, UiEvent},
    gateway::{ApiRequest, Gateway, GatewayError, GatewayResult},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, PoisonError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const REGISTER_PATH: &str = "/register";

pub const GENERIC_FAILURE_MESSAGE: &str = "Registration failed. Please try again.";
pub const NETWORK_FAILURE_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// Where presentation should go after the user acknowledges a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextStep {
    /// Registration succeeded; continue to the authentication entry point.
    SignIn,
    /// Stay on the form.
    StayOnForm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("a registration is already being submitted")]
    Busy,
}

/// Releases its flag even if the submission future is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }

    /// Raises a flag the caller already owns exclusively.
    fn hold(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RegistrationWorkflow<G> {
    gateway: G,
    events: EventBus,
    // held for the whole attempt, validation included
    in_flight: AtomicBool,
    // held while the request is on the wire
    busy: AtomicBool,
    state: Mutex<WorkflowState>,
}

impl<G: Gateway> RegistrationWorkflow<G> {
    pub fn new(gateway: G, events: EventBus) -> Self {
        Self {
            gateway,
            events,
            in_flight: AtomicBool::new(false),
            busy: AtomicBool::new(false),
            state: Mutex::new(WorkflowState::Idle),
        }
    }

    /// True only while the request is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn state(&self) -> WorkflowState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: WorkflowState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("registration state {:?} -> {:?}", *state, next);
        *state = next;
    }

    /// Runs one registration attempt.
    ///
    /// # Errors
    /// Returns `SubmitError::Busy` without touching the network if a previous
    /// attempt is still in flight.
    pub async fn submit(&self, form: RegistrationForm) -> Result<SubmissionResult, SubmitError> {
        let Some(_attempt) = BusyGuard::acquire(&self.in_flight) else {
            warn!("registration already in flight; ignoring submit");
            return Err(SubmitError::Busy);
        };

        self.transition(WorkflowState::Validating);
        if let ValidationOutcome::Invalid(issue) = validate(&form) {
            let reason = issue.to_string();
            debug!("registration rejected locally: {reason}");
            self.transition(WorkflowState::Failed);
            self.events.emit(UiEvent::ValidationFailed {
                reason: reason.clone(),
            });
            return Ok(SubmissionResult::failure(ErrorKind::ValidationError, reason));
        }

        let _busy = BusyGuard::hold(&self.busy);
        self.transition(WorkflowState::Submitting);

        let request = RegistrationRequest::from(form);
        let outcome = self
            .gateway
            .send(ApiRequest::post(REGISTER_PATH).json(request.to_json()))
            .await;

        let result = normalize(outcome);
        match &result {
            SubmissionResult::Success(user) => {
                info!("registration succeeded");
                self.transition(WorkflowState::Succeeded);
                self.events
                    .emit(UiEvent::SubmissionSucceeded { user: user.clone() });
            }
            SubmissionResult::Failure { kind, message } => {
                warn!("registration failed ({kind}): {message}");
                self.transition(WorkflowState::Failed);
                self.events.emit(UiEvent::SubmissionFailed {
                    kind: *kind,
                    message: message.clone(),
                });
            }
        }

        Ok(result)
    }

    /// Acknowledges the last result and returns to `Idle`.
    pub fn acknowledge(&self) -> NextStep {
        if self.in_flight.load(Ordering::Acquire) {
            return NextStep::StayOnForm;
        }
        let previous = self.state();
        self.transition(WorkflowState::Idle);
        if previous == WorkflowState::Succeeded {
            NextStep::SignIn
        } else {
            NextStep::StayOnForm
        }
    }
}

/// Maps a gateway outcome onto the registration error taxonomy.
fn normalize(outcome: GatewayResult) -> SubmissionResult {
    match outcome {
        Ok(payload) => SubmissionResult::Success(UserSummary::from_payload(payload)),
        Err(GatewayError::Network { .. }) => {
            SubmissionResult::failure(ErrorKind::NetworkError, NETWORK_FAILURE_MESSAGE)
        }
        Err(GatewayError::Server {
            session_expired: true,
            body,
            ..
        }) => SubmissionResult::failure(
            ErrorKind::SessionExpired,
            body.message().unwrap_or(SESSION_EXPIRED_MESSAGE),
        ),
        Err(GatewayError::Server { body, .. }) => match body.combined_field_errors() {
            Some(combined) => SubmissionResult::failure(ErrorKind::ServerValidationError, combined),
            None => SubmissionResult::failure(
                ErrorKind::ServerError,
                body.message().unwrap_or(GENERIC_FAILURE_MESSAGE),
            ),
        },
    }
}
