use crate::{
    cli::{actions::render_events, globals::GlobalArgs},
    events::EventBus,
    gateway::{ApiRequest, Gateway, GatewayError},
};
use anyhow::{anyhow, Context, Result};
use reqwest::Method;
use serde_json::Value;

/// UI location reported while a one-off request runs. The API path is not a
/// UI route, so calls to `/login` still get a login redirect on `401`.
pub const REQUEST_LOCATION: &str = "/";

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub method: Method,
    pub path: String,
    pub data: Option<Value>,
}

/// Parses a method name case-insensitively.
///
/// # Errors
/// Returns an error if the name is not a valid HTTP method token.
pub fn parse_method(raw: &str) -> Result<Method> {
    Method::from_bytes(raw.trim().to_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method: {raw}"))
}

fn event_bus() -> EventBus {
    let events = EventBus::new();
    events.set_location(REQUEST_LOCATION);
    events
}

/// Handle the request action
///
/// # Errors
/// Returns an error if the gateway cannot be built or the call fails.
#[allow(clippy::print_stdout)]
pub async fn handle(args: Args) -> Result<()> {
    let events = event_bus();
    let mut rx = events.subscribe();

    let gateway = args.globals.gateway(events)?;

    let mut request = ApiRequest::new(args.method, args.path);
    if let Some(data) = args.data {
        request = request.json(data);
    }

    let outcome = gateway.send(request).await;
    render_events(&mut rx);

    match outcome {
        Ok(Value::Null) => Ok(()),
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Err(err @ GatewayError::Network { .. }) => Err(anyhow!(err)),
        Err(GatewayError::Server { status, body, .. }) => {
            let detail = body
                .combined_field_errors()
                .or_else(|| body.message().map(str::to_string));
            match detail {
                Some(detail) => Err(anyhow!("request failed ({status}): {detail}")),
                None => Err(anyhow!("request failed ({status})")),
            }
        }
    }
}
