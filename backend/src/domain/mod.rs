//! Identity, token and access-policy domain.
//!
//! Purpose: hold the storefront's authentication rules independently of
//! HTTP and storage. Inbound adapters call the driving ports in [`ports`];
//! outbound adapters implement the driven ones.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic failure payload.
//! - `User` and its validated field types; `Role` / `RoleSet`.
//! - `TokenClaims`, `SigningSecret`, `TokenTtl`: bearer token values.
//! - `Authenticator`: credential check and token issuance.
//! - `AccessGuard` / `Policy`: declarative role gates.
//! - `UserAccountService`: user administration.

pub mod access;
pub mod auth;
pub mod authenticator;
pub mod error;
pub(crate) mod password;
pub mod ports;
pub mod role;
pub mod token;
pub mod trace_id;
pub mod user;
pub mod user_accounts;

pub use self::access::{AccessDecision, AccessDenial, AccessGuard, Policy, Principal};
pub use self::auth::{LoginCredentials, LoginGrant, LoginValidationError};
pub use self::authenticator::Authenticator;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::role::{Role, RoleSet, UnknownRole};
pub use self::token::{
    DEFAULT_TOKEN_TTL, InvalidTtl, IssuedToken, MAX_TOKEN_TTL, SIGNING_SECRET_MIN_LEN,
    SecretTooShort, SigningSecret, TokenClaims, TokenSettings, TokenTtl,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    EmailAddress, NewPassword, PasswordDigest, PersonName, PhoneNumber, User, UserId, UserParts,
    UserValidationError, Username,
};
pub use self::user_accounts::{AccountChanges, NewAccount, Provisioning, UserAccountService};
