//! Credential verification and token issuance.
//!
//! Every rejection path (unknown identifier, inactive account, wrong
//! password) produces the same `Ok(None)` and performs one password
//! verification, so neither the response nor its latency reveals which check
//! failed. The specific reason is only recorded in the logs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::password::{hash_password, verify_password};
use crate::domain::ports::{LoginService, PasswordHasher, TokenCodec, UserRepository};
use crate::domain::{
    EmailAddress, Error, LoginCredentials, LoginGrant, PasswordDigest, User, Username,
};

const DECOY_PASSWORD: &str = "storefront-decoy-password";

/// Why a login was refused. Internal only; never surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    UnknownIdentifier,
    InactiveAccount,
    WrongPassword,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Self::UnknownIdentifier => "unknown_identifier",
            Self::InactiveAccount => "inactive_account",
            Self::WrongPassword => "wrong_password",
        }
    }
}

/// [`LoginService`] backed by the credential store, password hasher and
/// token codec ports.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenCodec>,
    decoy: PasswordDigest,
}

impl Authenticator {
    /// Build the authenticator, deriving the decoy digest used on rejection
    /// paths that have no real digest to check against.
    pub async fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenCodec>,
    ) -> Result<Self, Error> {
        let decoy =
            hash_password(hasher.clone(), Zeroizing::new(DECOY_PASSWORD.to_owned())).await?;
        Ok(Self {
            users,
            hasher,
            tokens,
            decoy,
        })
    }

    /// Username match wins over an email match.
    async fn resolve(&self, identifier: &str) -> Result<Option<User>, Error> {
        if let Ok(username) = Username::new(identifier) {
            if let Some(user) = self.users.find_by_username(&username).await? {
                return Ok(Some(user));
            }
        }
        match EmailAddress::new(identifier) {
            Ok(email) => Ok(self.users.find_by_email(&email).await?),
            Err(_) => Ok(None),
        }
    }

    async fn verify(
        &self,
        credentials: &LoginCredentials,
        digest: PasswordDigest,
    ) -> Result<bool, Error> {
        let password = Zeroizing::new(credentials.password().to_owned());
        verify_password(self.hasher.clone(), password, digest).await
    }

    async fn reject(
        &self,
        credentials: &LoginCredentials,
        reason: Rejection,
    ) -> Result<Option<LoginGrant>, Error> {
        if reason != Rejection::WrongPassword {
            // Decoy verification; the outcome is irrelevant.
            let _ = self.verify(credentials, self.decoy.clone()).await?;
        }
        warn!(
            identifier = %credentials.username_or_email(),
            reason = reason.as_str(),
            "authentication rejected"
        );
        Ok(None)
    }
}

#[async_trait]
impl LoginService for Authenticator {
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<LoginGrant>, Error> {
        info!(identifier = %credentials.username_or_email(), "authentication attempt");

        let Some(user) = self.resolve(credentials.username_or_email()).await? else {
            return self.reject(credentials, Rejection::UnknownIdentifier).await;
        };
        if !user.is_active() {
            return self.reject(credentials, Rejection::InactiveAccount).await;
        }
        if !self.verify(credentials, user.password_hash().clone()).await? {
            return self.reject(credentials, Rejection::WrongPassword).await;
        }

        let issued = self
            .tokens
            .issue(&user)
            .map_err(|err| Error::internal(err.to_string()))?;
        info!(username = %user.username(), "authentication succeeded");
        Ok(Some(LoginGrant {
            token: issued.token,
            expires_at: issued.expires_at,
            username: user.username().to_string(),
            email: user.email().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests;
