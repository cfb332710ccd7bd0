use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde_json::Value;

#[derive(Debug)]
pub enum Command {
    Show,
    Clear,
    Set { token: SecretString, user: Value },
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Handle the session action
///
/// # Errors
/// Returns an error if the session cannot be persisted.
#[allow(clippy::print_stdout)]
pub fn handle(args: Args) -> Result<()> {
    let store = args.globals.session_store();

    match args.command {
        Command::Show => {
            if store.is_authenticated() {
                println!("Session: authenticated");
                if let Some(user) = store.user() {
                    println!("{}", serde_json::to_string_pretty(&user)?);
                }
            } else {
                println!("Session: none");
            }
        }
        Command::Clear => {
            store.clear();
            println!("Session cleared.");
        }
        Command::Set { token, user } => {
            store.set(token, user).with_context(|| {
                format!(
                    "failed to store session in {}",
                    args.globals.session_file.display()
                )
            })?;
            println!("Session stored.");
        }
    }

    Ok(())
}
