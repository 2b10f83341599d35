//! User administration: provisioning, lookup, update and removal.
//!
//! Route policies (`AdminOnly`, `AdminOrUser`) are enforced by the access
//! guard before these methods run. This service adds the record-level rules:
//! non-admin callers only ever see or change their own account, cannot touch
//! roles or the active flag, and username/email stay unique.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::password::hash_password;
use crate::domain::ports::{PasswordHasher, UserRepository, UsersCommand, UsersQuery};
use crate::domain::{
    EmailAddress, Error, NewPassword, PersonName, PhoneNumber, Principal, Role, RoleSet, User,
    UserId, UserParts, Username,
};

/// Validated input for provisioning an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: Username,
    pub email: EmailAddress,
    pub password: NewPassword,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone: Option<PhoneNumber>,
    /// Defaults to `{CUSTOMER}` when absent.
    pub roles: Option<RoleSet>,
}

/// Validated replacement values for an existing account.
///
/// `password` is only re-hashed when supplied. `roles` and `is_active` are
/// admin-only and left untouched when absent.
#[derive(Debug, Clone)]
pub struct AccountChanges {
    pub username: Username,
    pub email: EmailAddress,
    pub password: Option<NewPassword>,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone: Option<PhoneNumber>,
    pub roles: Option<RoleSet>,
    pub is_active: Option<bool>,
}

/// Outcome of [`UserAccountService::ensure_account`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioning {
    Created,
    AlreadyPresent,
}

/// Domain service behind the [`UsersQuery`] and [`UsersCommand`] ports.
#[derive(Clone)]
pub struct UserAccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserAccountService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    /// Create `account` unless its username is already registered.
    ///
    /// Used at startup to provision the bootstrap administrator; no caller
    /// principal is involved.
    pub async fn ensure_account(&self, account: NewAccount) -> Result<Provisioning, Error> {
        if self.users.find_by_username(&account.username).await?.is_some() {
            return Ok(Provisioning::AlreadyPresent);
        }
        let user = self.provision(account).await?;
        info!(username = %user.username(), "bootstrap account provisioned");
        Ok(Provisioning::Created)
    }

    async fn provision(&self, account: NewAccount) -> Result<User, Error> {
        self.ensure_username_free(&account.username, None).await?;
        self.ensure_email_free(&account.email, None).await?;

        let password_hash =
            hash_password(self.hasher.clone(), account.password.into_secret()).await?;
        let user = User::from_parts(UserParts {
            id: UserId::random(),
            username: account.username,
            email: account.email,
            password_hash,
            first_name: account.first_name,
            last_name: account.last_name,
            phone: account.phone,
            is_active: true,
            is_email_verified: false,
            roles: account.roles.unwrap_or_else(|| RoleSet::from(Role::Customer)),
        });
        self.users.insert(&user).await?;
        Ok(user)
    }

    async fn ensure_username_free(
        &self,
        username: &Username,
        owner: Option<UserId>,
    ) -> Result<(), Error> {
        match self.users.find_by_username(username).await? {
            Some(existing) if Some(existing.id()) != owner => {
                Err(Error::conflict("Username already exists"))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_email_free(
        &self,
        email: &EmailAddress,
        owner: Option<UserId>,
    ) -> Result<(), Error> {
        match self.users.find_by_email(email).await? {
            Some(existing) if Some(existing.id()) != owner => {
                Err(Error::conflict("Email already exists"))
            }
            _ => Ok(()),
        }
    }

    /// Fetch `id`, hiding other people's records from non-admin callers.
    async fn owned_user(&self, caller: &Principal, id: &UserId) -> Result<User, Error> {
        let found = self.users.find_by_id(id).await?;
        match found {
            Some(user) if caller.is_admin() || owns(caller, &user) => Ok(user),
            Some(_) => Err(not_yours()),
            None if caller.is_admin() => Err(Error::not_found(format!("User not found: {id}"))),
            None => Err(not_yours()),
        }
    }
}

fn owns(caller: &Principal, user: &User) -> bool {
    caller.username == user.username().as_str()
}

fn not_yours() -> Error {
    Error::forbidden("You may only access your own account")
}

fn require_admin(caller: &Principal) -> Result<(), Error> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden("Administrator role required"))
    }
}

#[async_trait]
impl UsersQuery for UserAccountService {
    async fn list_users(&self, caller: &Principal) -> Result<Vec<User>, Error> {
        require_admin(caller)?;
        Ok(self.users.list().await?)
    }

    async fn user_by_id(&self, caller: &Principal, id: &UserId) -> Result<User, Error> {
        self.owned_user(caller, id).await
    }

    async fn user_by_username(
        &self,
        caller: &Principal,
        username: &Username,
    ) -> Result<User, Error> {
        if !caller.is_admin() && caller.username != username.as_str() {
            return Err(not_yours());
        }
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| Error::not_found(format!("User not found with username: {username}")))
    }

    async fn user_by_email(
        &self,
        caller: &Principal,
        email: &EmailAddress,
    ) -> Result<User, Error> {
        if !caller.is_admin() && !caller.email.eq_ignore_ascii_case(email.as_str()) {
            return Err(not_yours());
        }
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| Error::not_found(format!("User not found with email: {email}")))
    }
}

#[async_trait]
impl UsersCommand for UserAccountService {
    async fn create_user(&self, caller: &Principal, account: NewAccount) -> Result<User, Error> {
        require_admin(caller)?;
        let user = self.provision(account).await?;
        info!(actor = %caller.username, username = %user.username(), "user created");
        Ok(user)
    }

    async fn update_user(
        &self,
        caller: &Principal,
        id: &UserId,
        changes: AccountChanges,
    ) -> Result<User, Error> {
        let current = self.owned_user(caller, id).await?;
        let roles_changed = changes
            .roles
            .as_ref()
            .is_some_and(|roles| roles != current.roles());
        let status_changed = changes
            .is_active
            .is_some_and(|active| active != current.is_active());
        if !caller.is_admin() && (roles_changed || status_changed) {
            return Err(Error::forbidden(
                "Only administrators may change roles or account status",
            ));
        }

        let mut parts = current.into_parts();
        if changes.username != parts.username {
            self.ensure_username_free(&changes.username, Some(parts.id)).await?;
        }
        if changes.email != parts.email {
            self.ensure_email_free(&changes.email, Some(parts.id)).await?;
        }
        if let Some(password) = changes.password {
            parts.password_hash =
                hash_password(self.hasher.clone(), password.into_secret()).await?;
        }
        parts.username = changes.username;
        parts.email = changes.email;
        parts.first_name = changes.first_name;
        parts.last_name = changes.last_name;
        parts.phone = changes.phone;
        if let Some(roles) = changes.roles {
            parts.roles = roles;
        }
        if let Some(is_active) = changes.is_active {
            parts.is_active = is_active;
        }

        let updated = User::from_parts(parts);
        if !self.users.update(&updated).await? {
            return Err(Error::not_found(format!("User not found: {id}")));
        }
        info!(actor = %caller.username, user_id = %id, "user updated");
        Ok(updated)
    }

    async fn delete_user(&self, caller: &Principal, id: &UserId) -> Result<(), Error> {
        require_admin(caller)?;
        if !self.users.delete(id).await? {
            return Err(Error::not_found(format!("User not found: {id}")));
        }
        info!(actor = %caller.username, user_id = %id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
