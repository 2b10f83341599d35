//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every rejection becomes a `400` whose `details` name the offending field
//! and a stable code, e.g. `{"field":"email","code":"invalid_email"}`.

use serde_json::json;

use crate::domain::{Error, UnknownRole, UserId, UserValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    MissingField,
    EmptyField,
    InvalidId,
    InvalidLength,
    InvalidCharacters,
    InvalidEmail,
    UnknownRole,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::EmptyField => "empty_field",
            Self::InvalidId => "invalid_id",
            Self::InvalidLength => "invalid_length",
            Self::InvalidCharacters => "invalid_characters",
            Self::InvalidEmail => "invalid_email",
            Self::UnknownRole => "unknown_role",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) fn field_error(field: FieldName, code: ValidationCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        ValidationCode::MissingField,
        format!("missing required field: {}", field.as_str()),
    )
}

fn code_for(err: &UserValidationError) -> ValidationCode {
    match err {
        UserValidationError::InvalidId => ValidationCode::InvalidId,
        UserValidationError::EmptyUsername
        | UserValidationError::EmptyEmail
        | UserValidationError::EmptyName { .. } => ValidationCode::EmptyField,
        UserValidationError::UsernameLength { .. }
        | UserValidationError::EmailTooLong { .. }
        | UserValidationError::NameTooLong { .. }
        | UserValidationError::PhoneTooLong { .. }
        | UserValidationError::PasswordLength { .. } => ValidationCode::InvalidLength,
        UserValidationError::UsernameInvalidCharacters
        | UserValidationError::PhoneInvalidCharacters => ValidationCode::InvalidCharacters,
        UserValidationError::EmailInvalid => ValidationCode::InvalidEmail,
    }
}

/// Adapter for `map_err` that tags a domain validation failure with `field`.
pub(crate) fn invalid_field(field: FieldName) -> impl FnOnce(UserValidationError) -> Error {
    move |err| field_error(field, code_for(&err), err.to_string())
}

pub(crate) fn unknown_role_error(field: FieldName, err: &UnknownRole) -> Error {
    field_error(field, ValidationCode::UnknownRole, err.to_string())
}

pub(crate) fn parse_user_id(value: &str) -> Result<UserId, Error> {
    UserId::new(value).map_err(invalid_field(FieldName::new("id")))
}
