//! Fully wired authentication stack over in-memory adapters.

use std::sync::Arc;

use actix_web::http::header::{AUTHORIZATION, HeaderName};
use actix_web::web;

use crate::domain::ports::TokenCodec;
use crate::domain::{Authenticator, Role, User, UserAccountService};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::persistence::InMemoryUserRepository;
use crate::outbound::security::JwtTokenCodec;

use super::{MutableClock, RecordingHasher, UserFixture, test_token_settings};

/// Real domain services over an in-memory store, a recording hasher and a
/// JWT codec driven by a [`MutableClock`].
pub struct AuthContext {
    pub clock: Arc<MutableClock>,
    pub users: Arc<InMemoryUserRepository>,
    pub hasher: Arc<RecordingHasher>,
    pub tokens: Arc<JwtTokenCodec>,
    state: HttpState,
}

impl AuthContext {
    /// Clock start, in whole seconds since the epoch.
    pub const START: i64 = 1_700_000_000;
    /// Token lifetime used by the context's codec.
    pub const TTL_MILLIS: u64 = 3_600_000;

    pub async fn new() -> Self {
        Self::with_users(Vec::new()).await
    }

    pub async fn with_users(users: Vec<User>) -> Self {
        let clock = Arc::new(MutableClock::at_epoch_seconds(Self::START));
        let users = Arc::new(InMemoryUserRepository::with_users(users));
        let hasher = Arc::new(RecordingHasher::new());
        let tokens = Arc::new(JwtTokenCodec::new(
            &test_token_settings(Self::TTL_MILLIS),
            clock.clone(),
        ));
        let login = match Authenticator::new(users.clone(), hasher.clone(), tokens.clone()).await
        {
            Ok(login) => login,
            Err(error) => panic!("authenticator construction failed: {error}"),
        };
        let accounts = Arc::new(UserAccountService::new(users.clone(), hasher.clone()));
        let state = HttpState::new(HttpStatePorts {
            login: Arc::new(login),
            users: accounts.clone(),
            users_command: accounts,
            tokens: tokens.clone(),
        });
        Self {
            clock,
            users,
            hasher,
            tokens,
            state,
        }
    }

    pub fn state(&self) -> web::Data<HttpState> {
        web::Data::new(self.state.clone())
    }

    /// Token for `user` issued at the current clock instant.
    pub fn token_for_user(&self, user: &User) -> String {
        match self.tokens.issue(user) {
            Ok(issued) => issued.token,
            Err(error) => panic!("token issuance failed: {error}"),
        }
    }

    /// Token for a throwaway identity; the account need not exist.
    pub fn token_for(&self, username: &str, roles: &[Role]) -> String {
        self.token_for_user(&UserFixture::new(username).roles(roles).build())
    }
}

/// `Authorization` header carrying `token`.
pub fn bearer(token: &str) -> (HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}
