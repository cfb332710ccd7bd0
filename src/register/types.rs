//! Registration payloads and results. Forms and requests carry passwords, so
//! they must never be logged; their `Debug` output redacts secrets.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::fmt;

/// Field values as entered by the user.
#[derive(Clone, Debug)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
    pub consent: bool,
}

impl RegistrationForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        password_confirmation: impl Into<String>,
        consent: bool,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: SecretString::from(password.into()),
            password_confirmation: SecretString::from(password_confirmation.into()),
            consent,
        }
    }
}

/// Body of `POST /register`, built fresh for each attempt.
#[derive(Clone, Debug)]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
}

impl From<RegistrationForm> for RegistrationRequest {
    fn from(form: RegistrationForm) -> Self {
        Self {
            name: form.name,
            email: form.email,
            password: form.password,
            password_confirmation: form.password_confirmation,
        }
    }
}

impl RegistrationRequest {
    /// Wire form of the request. This is the only place the passwords are exposed.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "email": self.email,
            "password": self.password.expose_secret(),
            "password_confirmation": self.password_confirmation.expose_secret(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected locally before any network call.
    ValidationError,
    /// Field-level rejection by the service.
    ServerValidationError,
    /// Any other non-2xx response.
    ServerError,
    /// No response obtained.
    NetworkError,
    /// The service answered `401`.
    SessionExpired,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ValidationError => "validation error",
            Self::ServerValidationError => "server validation error",
            Self::ServerError => "server error",
            Self::NetworkError => "network error",
            Self::SessionExpired => "session expired",
        };
        formatter.write_str(label)
    }
}

/// Identity returned by a successful registration.
///
/// The service may answer with the user at the top level or nested under
/// `user` / `data`; the full payload is kept as well.
#[derive(Clone, Debug, PartialEq)]
pub struct UserSummary {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub payload: Value,
}

impl UserSummary {
    #[must_use]
    pub fn from_payload(payload: Value) -> Self {
        let record = ["user", "data"]
            .iter()
            .find_map(|key| payload.get(*key).filter(|value| value.is_object()))
            .unwrap_or(&payload);

        let id = record.get("id").filter(|value| !value.is_null()).cloned();
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        let email = record
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            id,
            name,
            email,
            payload,
        }
    }

    /// Best label for confirmation messages.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.email.as_deref())
    }
}

/// The only value the workflow hands to presentation.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionResult {
    Success(UserSummary),
    Failure { kind: ErrorKind, message: String },
}

impl SubmissionResult {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}
