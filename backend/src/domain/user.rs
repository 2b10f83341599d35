//! User account model.
//!
//! Every user-supplied field is wrapped in a validating newtype so the rest
//! of the domain can rely on the invariants without re-checking them.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::RoleSet;

/// Validation errors returned by the user field constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    InvalidId,
    EmptyUsername,
    UsernameLength { min: usize, max: usize },
    UsernameInvalidCharacters,
    EmptyEmail,
    EmailTooLong { max: usize },
    EmailInvalid,
    EmptyName { field: &'static str },
    NameTooLong { field: &'static str, max: usize },
    PhoneTooLong { max: usize },
    PhoneInvalidCharacters,
    PasswordLength { min: usize, max: usize },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::UsernameLength { min, max } => {
                write!(f, "username must be between {min} and {max} characters")
            }
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain letters, numbers, dots, dashes, or underscores",
            ),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::EmailInvalid => write!(f, "email must be a valid address"),
            Self::EmptyName { field } => write!(f, "{field} must not be empty"),
            Self::NameTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::PhoneTooLong { max } => write!(f, "phone must be at most {max} characters"),
            Self::PhoneInvalidCharacters => write!(
                f,
                "phone may only contain digits, spaces, and + - ( )",
            ),
            Self::PasswordLength { min, max } => {
                write!(f, "password must be between {min} and {max} characters")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a [`UserId`] from its hyphenated string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 50;
/// Maximum allowed length for an email address.
pub const EMAIL_MAX: usize = 254;
/// Maximum allowed length for a first or last name.
pub const NAME_MAX: usize = 100;
/// Maximum allowed length for a phone number.
pub const PHONE_MAX: usize = 20;
/// Minimum length for a newly chosen password.
pub const PASSWORD_MIN: usize = 8;
/// Maximum length for a newly chosen password.
pub const PASSWORD_MAX: usize = 128;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern).unwrap_or_else(|error| panic!("regex {pattern} failed: {error}"))
    })
}

macro_rules! string_newtype {
    ($name:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

/// Unique login handle.
///
/// ## Invariants
/// - Trimmed; `USERNAME_MIN..=USERNAME_MAX` characters from `[A-Za-z0-9._-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        let length = value.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) {
            return Err(UserValidationError::UsernameLength {
                min: USERNAME_MIN,
                max: USERNAME_MAX,
            });
        }
        if !compiled(&USERNAME_RE, r"^[A-Za-z0-9._-]+$").is_match(value) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(value.to_owned()))
    }
}

string_newtype!(Username);

/// Unique, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let value = value.as_ref().trim().to_lowercase();
        if value.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if value.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !compiled(&EMAIL_RE, r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_match(&value) {
            return Err(UserValidationError::EmailInvalid);
        }
        Ok(Self(value))
    }
}

string_newtype!(EmailAddress);

/// First or last name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    /// `field` names the offending input in validation messages.
    pub fn new(field: &'static str, value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(UserValidationError::EmptyName { field });
        }
        if value.chars().count() > NAME_MAX {
            return Err(UserValidationError::NameTooLong {
                field,
                max: NAME_MAX,
            });
        }
        Ok(Self(value.to_owned()))
    }
}

string_newtype!(PersonName);

/// Optional contact number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Blank input means "no phone number" and yields `Ok(None)`.
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, UserValidationError> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        if value.chars().count() > PHONE_MAX {
            return Err(UserValidationError::PhoneTooLong { max: PHONE_MAX });
        }
        if !compiled(&PHONE_RE, r"^[0-9 +()\-]+$").is_match(value) {
            return Err(UserValidationError::PhoneInvalidCharacters);
        }
        Ok(Some(Self(value.to_owned())))
    }
}

string_newtype!(PhoneNumber);

/// Password chosen when provisioning or updating an account.
///
/// Login does not use this type: existing passwords are checked as typed.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(Zeroizing<String>);

impl NewPassword {
    pub fn new(value: &str) -> Result<Self, UserValidationError> {
        let length = value.chars().count();
        if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&length) {
            return Err(UserValidationError::PasswordLength {
                min: PASSWORD_MIN,
                max: PASSWORD_MAX,
            });
        }
        Ok(Self(Zeroizing::new(value.to_owned())))
    }

    pub fn into_secret(self) -> Zeroizing<String> {
        self.0
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword(<redacted>)")
    }
}

/// Opaque adaptive password hash in PHC string form.
///
/// Never serialised and redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn new(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

/// Plain constituents of a [`User`], used to build or rebuild one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserParts {
    pub id: UserId,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: PasswordDigest,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone: Option<PhoneNumber>,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub roles: RoleSet,
}

/// Registered account known to the credential store.
///
/// ## Invariants
/// - Every field satisfies its newtype's validation.
/// - `username` and `email` are unique across the store; the repository and
///   account service enforce this, not the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    parts: UserParts,
}

impl User {
    pub fn from_parts(parts: UserParts) -> Self {
        Self { parts }
    }

    pub fn into_parts(self) -> UserParts {
        self.parts
    }

    pub fn id(&self) -> UserId {
        self.parts.id
    }

    pub fn username(&self) -> &Username {
        &self.parts.username
    }

    pub fn email(&self) -> &EmailAddress {
        &self.parts.email
    }

    pub fn password_hash(&self) -> &PasswordDigest {
        &self.parts.password_hash
    }

    pub fn first_name(&self) -> &PersonName {
        &self.parts.first_name
    }

    pub fn last_name(&self) -> &PersonName {
        &self.parts.last_name
    }

    pub fn phone(&self) -> Option<&PhoneNumber> {
        self.parts.phone.as_ref()
    }

    /// Inactive accounts cannot authenticate.
    pub fn is_active(&self) -> bool {
        self.parts.is_active
    }

    pub fn is_email_verified(&self) -> bool {
        self.parts.is_email_verified
    }

    pub fn roles(&self) -> &RoleSet {
        &self.parts.roles
    }
}
