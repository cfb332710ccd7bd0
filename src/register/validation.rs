//! Client-side checks run before any network call. Rules are evaluated in a
//! fixed order and the first failure wins.

use super::RegistrationForm;
use secrecy::ExposeSecret;
use thiserror::Error;

/// Minimum password length, counted in UTF-16 code units like the web form.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("password mismatch")]
    PasswordMismatch,
    #[error("password too short")]
    PasswordTooShort,
    #[error("consent required")]
    ConsentRequired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(ValidationIssue),
}

#[must_use]
pub fn validate(form: &RegistrationForm) -> ValidationOutcome {
    let password = form.password.expose_secret();

    if password != form.password_confirmation.expose_secret() {
        return ValidationOutcome::Invalid(ValidationIssue::PasswordMismatch);
    }

    if password.encode_utf16().count() < MIN_PASSWORD_LENGTH {
        return ValidationOutcome::Invalid(ValidationIssue::PasswordTooShort);
    }

    if !form.consent {
        return ValidationOutcome::Invalid(ValidationIssue::ConsentRequired);
    }

    ValidationOutcome::Valid
}
