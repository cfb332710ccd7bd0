use crate::{
    cli::{actions::render_events, globals::GlobalArgs},
    events::{EventBus, LOGIN_PATH},
    register::{NextStep, RegistrationForm, RegistrationWorkflow, SubmissionResult},
};
use anyhow::{anyhow, Result};
use secrecy::SecretString;

pub const REGISTER_LOCATION: &str = "/register";

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
    pub agree: bool,
}

/// Handle the register action
///
/// # Errors
/// Returns an error if the gateway cannot be built or the registration does
/// not succeed.
#[allow(clippy::print_stdout)]
pub async fn handle(args: Args) -> Result<()> {
    let events = EventBus::new();
    events.set_location(REGISTER_LOCATION);
    let mut rx = events.subscribe();

    let gateway = args.globals.gateway(events.clone())?;
    let workflow = RegistrationWorkflow::new(gateway, events);

    let form = RegistrationForm {
        name: args.name,
        email: args.email,
        password: args.password,
        password_confirmation: args.password_confirmation,
        consent: args.agree,
    };

    let result = workflow.submit(form).await?;
    render_events(&mut rx);

    match result {
        SubmissionResult::Success(_) => {
            if workflow.acknowledge() == NextStep::SignIn {
                println!("Continue at {LOGIN_PATH} to sign in.");
            }
            Ok(())
        }
        SubmissionResult::Failure { kind, .. } => {
            workflow.acknowledge();
            Err(anyhow!("registration not completed: {kind}"))
        }
    }
}
