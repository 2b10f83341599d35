//! Driving port for login/authentication use-cases.
//!
//! Inbound adapters call this port to exchange credentials for a bearer
//! token without importing the credential store or the token codec.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, LoginGrant};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Verify credentials and mint a token.
    ///
    /// `Ok(None)` covers every credential rejection (unknown identifier,
    /// inactive account, wrong password) without saying which. `Err` is
    /// reserved for infrastructure failures.
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<LoginGrant>, Error>;
}
