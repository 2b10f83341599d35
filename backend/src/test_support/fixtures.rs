//! Builders for accounts, principals and token settings used across tests.

use crate::domain::ports::PasswordHasher;
use crate::domain::{
    EmailAddress, PersonName, Principal, Role, RoleSet, SigningSecret, TokenSettings, TokenTtl,
    User, UserId, UserParts, Username,
};

use super::RecordingHasher;

/// 32+ byte secret accepted by the token codec.
pub const TEST_SECRET: &str = "storefront-test-secret-0123456789abcdef";

/// Fluent builder for [`User`] values. Defaults: active, unverified, role
/// `USER`, email `<username>@example.com`, password `correctpw`.
#[derive(Debug, Clone)]
pub struct UserFixture {
    username: String,
    email: Option<String>,
    password: String,
    roles: Vec<Role>,
    active: bool,
}

impl UserFixture {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_owned(),
            email: None,
            password: "correctpw".to_owned(),
            roles: vec![Role::User],
            active: true,
        }
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_owned());
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_owned();
        self
    }

    pub fn roles(mut self, roles: &[Role]) -> Self {
        self.roles = roles.to_vec();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Build with a [`RecordingHasher`] digest.
    pub fn build(self) -> User {
        let digest = RecordingHasher::digest_for(&self.password);
        self.assemble(digest)
    }

    /// Build with a digest from `hasher`, e.g. the real Argon2 adapter.
    pub fn build_with(self, hasher: &dyn PasswordHasher) -> User {
        match hasher.hash(&self.password) {
            Ok(digest) => self.assemble(digest),
            Err(error) => panic!("fixture password hashing failed: {error}"),
        }
    }

    fn assemble(self, password_hash: crate::domain::PasswordDigest) -> User {
        let email = self
            .email
            .clone()
            .unwrap_or_else(|| format!("{}@example.com", self.username));
        User::from_parts(UserParts {
            id: UserId::random(),
            username: fixture_value(Username::new(&self.username)),
            email: fixture_value(EmailAddress::new(email)),
            password_hash,
            first_name: fixture_value(PersonName::new("first_name", "Test")),
            last_name: fixture_value(PersonName::new("last_name", "User")),
            phone: None,
            is_active: self.active,
            is_email_verified: false,
            roles: self.roles.into_iter().collect(),
        })
    }
}

fn fixture_value<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("invalid fixture value: {error}"),
    }
}

/// Caller identity as the access guard would produce it.
pub fn principal(username: &str, roles: &[Role]) -> Principal {
    Principal {
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        roles: roles.iter().copied().collect::<RoleSet>(),
    }
}

/// Token settings over [`TEST_SECRET`] with the given lifetime.
pub fn test_token_settings(ttl_millis: u64) -> TokenSettings {
    TokenSettings {
        secret: fixture_value(SigningSecret::new(TEST_SECRET.as_bytes().to_vec())),
        ttl: fixture_value(TokenTtl::from_millis(ttl_millis)),
    }
}
