//! Authenticated API gateway. Every outbound call goes through [`ApiGateway`],
//! which applies one policy for credentials and one for failures so call sites
//! never repeat it:
//!
//! - the bearer token from the [`SessionStore`] is attached when present;
//! - requests share a 10 second timeout and are never retried here;
//! - a `401` clears the session and emits a single `SessionExpired` event;
//! - every failure is logged and returned as a [`GatewayError`].
//!
//! Request bodies and tokens must never be logged.

mod body;

pub use body::ErrorBody;

use crate::{
    config::AppConfig,
    events::{EventBus, UiEvent},
    session::SessionStore,
    APP_USER_AGENT,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::{future::Future, sync::Arc};
use thiserror::Error;
use tracing::{debug, error, info_span, warn, Instrument};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No response was obtained.
    #[error("network error: {message}")]
    Network { message: String, timed_out: bool },
    /// The service answered with a non-2xx status.
    #[error("request failed ({status})")]
    Server {
        status: u16,
        body: ErrorBody,
        session_expired: bool,
    },
}

pub type GatewayResult = Result<Value, GatewayError>;

/// Abstract request descriptor; `path` is relative to the configured base.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Seam between callers and the HTTP gateway so workflows can run against a
/// test double.
pub trait Gateway: Send + Sync {
    fn send(&self, request: ApiRequest) -> impl Future<Output = GatewayResult> + Send;
}

impl<T: Gateway> Gateway for Arc<T> {
    fn send(&self, request: ApiRequest) -> impl Future<Output = GatewayResult> + Send {
        (**self).send(request)
    }
}

#[derive(Debug, Clone)]
pub struct ApiGateway {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
    events: EventBus,
}

impl ApiGateway {
    /// Build a gateway for the configured base address.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        config: &AppConfig,
        session: Arc<SessionStore>,
        events: EventBus,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            session,
            events,
        })
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    async fn dispatch(&self, request: ApiRequest) -> GatewayResult {
        let url = build_url(&self.base_url, &request.path);

        let mut builder = self.client.request(request.method.clone(), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = self
            .session
            .get()
            .filter(|token| !token.expose_secret().is_empty())
        {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let span = info_span!(
            "gateway.send",
            http.method = %request.method,
            url = %url
        );
        let response = match builder.send().instrument(span).await {
            Ok(response) => response,
            Err(err) => {
                let failure = map_request_error(&err);
                error!("{} {} failed: {}", request.method, url, failure);
                return Err(failure);
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                let failure = map_request_error(&err);
                error!("{} {} body read failed: {}", request.method, url, failure);
                return Err(failure);
            }
        };

        if status.is_success() {
            debug!("{} {} -> {}", request.method, url, status);
            return Ok(decode_success(&text));
        }

        let session_expired = status == StatusCode::UNAUTHORIZED;
        if session_expired {
            self.invalidate_session();
        }

        error!("{} {} -> {}", request.method, url, status);
        Err(GatewayError::Server {
            status: status.as_u16(),
            body: ErrorBody::parse(&text),
            session_expired,
        })
    }

    /// Fires on every `401`, whether or not a session was held.
    fn invalidate_session(&self) {
        warn!("Unauthorized (401): clearing stored session");
        self.session.clear();
        let redirect = self.events.login_redirect();
        if redirect.is_some() {
            debug!("requesting redirect to login");
        }
        self.events.emit(UiEvent::SessionExpired { redirect });
    }
}

impl Gateway for ApiGateway {
    async fn send(&self, request: ApiRequest) -> GatewayResult {
        self.dispatch(request).await
    }
}

/// Builds a URL from the base address and a relative path.
fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Empty bodies decode to `null`; non-JSON bodies are kept as a string.
fn decode_success(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn map_request_error(err: &reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Network {
            message: "Request timed out.".to_string(),
            timed_out: true,
        }
    } else if err.is_builder() {
        GatewayError::Network {
            message: format!("Failed to build request: {err}"),
            timed_out: false,
        }
    } else {
        GatewayError::Network {
            message: format!("Unable to reach the server: {err}"),
            timed_out: false,
        }
    }
}
