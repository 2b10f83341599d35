//! Driving port for provisioning and maintaining user accounts.

use async_trait::async_trait;

use crate::domain::{AccountChanges, Error, NewAccount, Principal, User, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersCommand: Send + Sync {
    /// Provision a new account. Admin only.
    async fn create_user(&self, caller: &Principal, account: NewAccount) -> Result<User, Error>;

    /// Apply `changes` to an account the caller owns, or any account for
    /// admins.
    async fn update_user(
        &self,
        caller: &Principal,
        id: &UserId,
        changes: AccountChanges,
    ) -> Result<User, Error>;

    /// Remove an account. Admin only.
    async fn delete_user(&self, caller: &Principal, id: &UserId) -> Result<(), Error>;
}
