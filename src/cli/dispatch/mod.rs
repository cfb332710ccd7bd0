//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary executes. Secrets
//! (passwords, tokens) are wrapped in `SecretString` as soon as they are read.

use crate::cli::{
    actions::{register, request, session, Action},
    commands::{ARG_API_BASE_URL, ARG_SESSION_FILE, CMD_REGISTER, CMD_REQUEST, CMD_SESSION},
    globals::{default_session_file, GlobalArgs},
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use serde_json::Value;
use std::path::PathBuf;

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

fn parse_json(raw: &str, what: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("{what} is not valid JSON"))
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or malformed.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = GlobalArgs::new(
        required(matches, ARG_API_BASE_URL)?,
        matches
            .get_one::<String>(ARG_SESSION_FILE)
            .map_or_else(default_session_file, PathBuf::from),
    );

    match matches.subcommand() {
        Some((CMD_REGISTER, sub_m)) => Ok(Action::Register(register::Args {
            globals,
            name: required(sub_m, "name")?,
            email: required(sub_m, "email")?,
            password: SecretString::from(required(sub_m, "password")?),
            password_confirmation: SecretString::from(required(sub_m, "password-confirmation")?),
            agree: sub_m.get_flag("agree"),
        })),
        Some((CMD_REQUEST, sub_m)) => {
            let data = sub_m
                .get_one::<String>("data")
                .map(|raw| parse_json(raw, "--data"))
                .transpose()?;
            Ok(Action::Request(request::Args {
                globals,
                method: request::parse_method(&required(sub_m, "method")?)?,
                path: required(sub_m, "path")?,
                data,
            }))
        }
        Some((CMD_SESSION, sub_m)) => {
            let command = match sub_m.subcommand() {
                Some(("show", _)) => session::Command::Show,
                Some(("clear", _)) => session::Command::Clear,
                Some(("set", set_m)) => session::Command::Set {
                    token: SecretString::from(required(set_m, "token")?),
                    user: parse_json(&required(set_m, "user")?, "--user")?,
                },
                _ => return Err(anyhow!("missing session subcommand")),
            };
            Ok(Action::Session(session::Args { globals, command }))
        }
        _ => Err(anyhow!("missing subcommand")),
    }
}
