//! Tagged parse of non-2xx response bodies.

use serde_json::Value;

/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorBody {
    /// `{"errors": {"field": ["message", ...]}}`, in server order.
    FieldErrors {
        errors: Vec<(String, Vec<String>)>,
        message: Option<String>,
    },
    /// `{"message": "..."}`
    Message(String),
    /// Anything else; holds the sanitized raw body when there was one.
    Unknown(Option<String>),
}

impl ErrorBody {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(raw) else {
            return Self::Unknown(sanitize_body(raw));
        };

        let message = object
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string);

        if let Some(Value::Object(fields)) = object.get("errors") {
            let errors = fields
                .iter()
                .map(|(field, messages)| (field.clone(), field_messages(messages)))
                .collect();
            return Self::FieldErrors { errors, message };
        }

        match message {
            Some(message) => Self::Message(message),
            None => Self::Unknown(sanitize_body(raw)),
        }
    }

    /// The server's flat message, if it sent one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::FieldErrors { message, .. } => message.as_deref(),
            Self::Message(message) => Some(message),
            Self::Unknown(_) => None,
        }
    }

    /// Every per-field message in server order, joined by single spaces.
    /// `None` when the body has no field map or the map holds no messages.
    #[must_use]
    pub fn combined_field_errors(&self) -> Option<String> {
        let Self::FieldErrors { errors, .. } = self else {
            return None;
        };

        let combined = errors
            .iter()
            .flat_map(|(_, messages)| messages.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");

        if combined.is_empty() {
            None
        } else {
            Some(combined)
        }
    }
}

fn field_messages(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(message_text).collect(),
        other => message_text(other).into_iter().collect(),
    }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Trims and truncates raw error bodies for user-facing messages.
fn sanitize_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_ERROR_CHARS).collect())
    }
}
