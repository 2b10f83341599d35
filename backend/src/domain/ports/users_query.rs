//! Driving port for reading user accounts.
//!
//! Callers have already passed the route's access policy; implementations
//! apply the record-level ownership rule on top of it.

use async_trait::async_trait;

use crate::domain::{EmailAddress, Error, Principal, User, UserId, Username};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Every account. Admin only.
    async fn list_users(&self, caller: &Principal) -> Result<Vec<User>, Error>;

    async fn user_by_id(&self, caller: &Principal, id: &UserId) -> Result<User, Error>;

    async fn user_by_username(
        &self,
        caller: &Principal,
        username: &Username,
    ) -> Result<User, Error>;

    async fn user_by_email(&self, caller: &Principal, email: &EmailAddress)
    -> Result<User, Error>;
}
