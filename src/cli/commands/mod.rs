pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_API_BASE_URL: &str = "api-base-url";
pub const ARG_SESSION_FILE: &str = "session-file";

pub const CMD_REGISTER: &str = "register";
pub const CMD_REQUEST: &str = "request";
pub const CMD_SESSION: &str = "session";

fn register_command() -> Command {
    Command::new(CMD_REGISTER)
        .about("Submit a new account registration")
        .arg(
            Arg::new("name")
                .long("name")
                .help("Full name")
                .required(true),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .help("Email address")
                .required(true),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Password (at least 8 characters)")
                .env("REGISTRAR_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("password-confirmation")
                .long("password-confirmation")
                .help("Password confirmation, must match --password")
                .env("REGISTRAR_PASSWORD_CONFIRMATION")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("agree")
                .long("agree")
                .help("Accept the terms of service and privacy policy")
                .action(ArgAction::SetTrue),
        )
}

fn request_command() -> Command {
    Command::new(CMD_REQUEST)
        .about("Send one authenticated request through the gateway")
        .arg(
            Arg::new("method")
                .help("HTTP method, example: GET")
                .required(true),
        )
        .arg(
            Arg::new("path")
                .help("Path relative to the API base URL, example: /user")
                .required(true),
        )
        .arg(
            Arg::new("data")
                .short('d')
                .long("data")
                .help("JSON request body"),
        )
}

fn session_command() -> Command {
    Command::new(CMD_SESSION)
        .about("Inspect or change the stored session")
        .subcommand_required(true)
        .subcommand(Command::new("show").about("Show whether a session is stored"))
        .subcommand(Command::new("clear").about("Remove the stored session"))
        .subcommand(
            Command::new("set")
                .about("Store a bearer token and user record")
                .arg(
                    Arg::new("token")
                        .long("token")
                        .help("Bearer token")
                        .env("REGISTRAR_TOKEN")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new("user")
                        .long("user")
                        .help("User record as JSON")
                        .default_value("{}"),
                ),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("registrar")
        .about("Account registration client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg(
            Arg::new(ARG_API_BASE_URL)
                .long("api-base-url")
                .help("Base URL of the account service API")
                .env(crate::config::ENV_API_BASE_URL)
                .default_value(crate::config::DEFAULT_API_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_FILE)
                .long("session-file")
                .help("Where the session token is persisted (default: ~/.config/registrar/session.json)")
                .env("REGISTRAR_SESSION_FILE")
                .global(true),
        )
        .subcommand(register_command())
        .subcommand(request_command())
        .subcommand(session_command());

    logging::with_args(command)
}
