//! Process-local credential store.
//!
//! Used when no database URL is configured and throughout the test suites.
//! Uniqueness of username and email is enforced on insert and update just
//! like the PostgreSQL unique indexes.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, User, UserId, Username};

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, panicking on uniqueness clashes. Intended for tests
    /// and fixtures.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let repository = Self::new();
        {
            let mut guard = match repository.users.write() {
                Ok(guard) => guard,
                Err(_) => panic!("fresh user store lock poisoned"),
            };
            for user in users {
                if let Some(field) = clash(&guard, &user) {
                    panic!("seed users clash on {field}");
                }
                guard.insert(user.id(), user);
            }
        }
        repository
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<UserId, User>>, UserPersistenceError> {
        self.users
            .read()
            .map_err(|_| UserPersistenceError::query("user store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<UserId, User>>, UserPersistenceError> {
        self.users
            .write()
            .map_err(|_| UserPersistenceError::query("user store lock poisoned"))
    }

    fn find_where(
        &self,
        predicate: impl Fn(&User) -> bool,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.read()?.values().find(|user| predicate(user)).cloned())
    }
}

/// Name of the unique column `candidate` would collide on, ignoring its own
/// record.
fn clash(users: &HashMap<UserId, User>, candidate: &User) -> Option<&'static str> {
    let others = || users.values().filter(|other| other.id() != candidate.id());
    if others().any(|other| other.username() == candidate.username()) {
        return Some("username");
    }
    if others().any(|other| other.email() == candidate.email()) {
        return Some("email");
    }
    None
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        self.find_where(|user| user.username() == username)
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        self.find_where(|user| user.email() == email)
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut users: Vec<User> = self.read()?.values().cloned().collect();
        users.sort_by(|a, b| a.username().as_str().cmp(b.username().as_str()));
        Ok(users)
    }

    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut guard = self.write()?;
        if guard.contains_key(&user.id()) {
            return Err(UserPersistenceError::duplicate("id"));
        }
        if let Some(field) = clash(&guard, user) {
            return Err(UserPersistenceError::duplicate(field));
        }
        guard.insert(user.id(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let mut guard = self.write()?;
        if !guard.contains_key(&user.id()) {
            return Ok(false);
        }
        if let Some(field) = clash(&guard, user) {
            return Err(UserPersistenceError::duplicate(field));
        }
        guard.insert(user.id(), user.clone());
        Ok(true)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        Ok(self.write()?.remove(id).is_some())
    }
}
