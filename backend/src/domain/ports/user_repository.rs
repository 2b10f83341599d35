//! Port abstraction for the credential store and its errors.
use async_trait::async_trait;

use crate::domain::{EmailAddress, User, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A unique column (`username` or `email`) already holds the value.
        Duplicate { field: String } => "user repository conflict: {field} already taken",
    }
}

/// Credential store: lookup and administration of registered accounts.
///
/// Lookups return `Ok(None)` for missing records; errors are reserved for
/// infrastructure failures so callers can tell "unknown user" apart from
/// "store unavailable".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError>;

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// All accounts ordered by username.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Store a new account, failing with `Duplicate` on a uniqueness clash.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Replace an existing account. Returns `false` when no record matched.
    async fn update(&self, user: &User) -> Result<bool, UserPersistenceError>;

    /// Remove an account. Returns `false` when no record matched.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;
}

impl From<UserPersistenceError> for crate::domain::Error {
    fn from(value: UserPersistenceError) -> Self {
        match value {
            UserPersistenceError::Connection { .. } => {
                Self::service_unavailable("credential store unavailable")
            }
            UserPersistenceError::Query { message } => Self::internal(message),
            UserPersistenceError::Duplicate { field } => {
                Self::conflict(format!("{field} already exists"))
            }
        }
    }
}
