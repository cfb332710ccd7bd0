pub mod register;
pub mod request;
pub mod session;

// The match over `Action` lives in `run` so this module stays small.
mod run;

use crate::events::UiEvent;
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

#[derive(Debug)]
pub enum Action {
    Register(register::Args),
    Request(request::Args),
    Session(session::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

/// Presentation for core events: the terminal stands in for the UI layer.
pub(crate) fn render_events(events: &mut Receiver<UiEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => render_event(&event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!("skipped {skipped} ui events");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn render_event(event: &UiEvent) {
    match event {
        UiEvent::ValidationFailed { reason } => {
            eprintln!("Registration not sent: {reason}");
        }
        UiEvent::SubmissionFailed { kind, message } => {
            eprintln!("Registration failed ({kind}): {message}");
        }
        UiEvent::SubmissionSucceeded { user } => match user.display_name() {
            Some(name) => println!("Account created for {name}."),
            None => println!("Account created."),
        },
        UiEvent::SessionExpired { redirect } => match redirect {
            Some(redirect) => {
                eprintln!("{}", redirect.notice);
                eprintln!("Sign in again at {}.", redirect.path);
            }
            None => eprintln!("Stored session was rejected and has been cleared."),
        },
    }
}
