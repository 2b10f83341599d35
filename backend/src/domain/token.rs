//! Bearer token value types.
//!
//! Tokens are self-contained: everything the access guard needs is carried in
//! [`TokenClaims`] and protected by the signature, so no server-side session
//! state exists. Issue and expiry instants keep millisecond precision, so
//! `expires_at - issued_at` is exactly the configured lifetime.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::RoleSet;

/// Minimum signing secret length in bytes (256 bits for HMAC-SHA256).
pub const SIGNING_SECRET_MIN_LEN: usize = 32;

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_millis(86_400_000);

/// Longest accepted token lifetime: 100 years, so expiry instants stay inside
/// the calendar range timestamps can represent.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(100 * 365 * 86_400);

const FINGERPRINT_BYTES: usize = 8;

/// Verified contents of a bearer token.
///
/// Only produced by a token codec after signature verification, so holders
/// can trust every field. `subject` is the username the token was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: String,
    pub email: String,
    pub roles: RoleSet,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Compact token string plus its expiry, as returned from issuance.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Raised when a signing secret is shorter than [`SIGNING_SECRET_MIN_LEN`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("signing secret too short: need >= {min_len} bytes, got {length}")]
pub struct SecretTooShort {
    pub length: usize,
    pub min_len: usize,
}

/// HMAC signing secret. Zeroised on drop and never printed.
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    /// Wrap secret bytes, enforcing the minimum length.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::SigningSecret;
    ///
    /// assert!(SigningSecret::new(vec![b'k'; 32]).is_ok());
    /// assert!(SigningSecret::new(b"short".to_vec()).is_err());
    /// ```
    pub fn new(bytes: Vec<u8>) -> Result<Self, SecretTooShort> {
        let bytes = Zeroizing::new(bytes);
        if bytes.len() < SIGNING_SECRET_MIN_LEN {
            return Err(SecretTooShort {
                length: bytes.len(),
                min_len: SIGNING_SECRET_MIN_LEN,
            });
        }
        Ok(Self(bytes))
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// First 8 bytes of the SHA-256 digest of the secret, hex encoded.
    ///
    /// Lets operators tell which secret is active without revealing it.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.expose());
        hex::encode(&digest[..FINGERPRINT_BYTES])
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret({})", self.fingerprint())
    }
}

/// Raised when a token lifetime is zero or longer than [`MAX_TOKEN_TTL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTtl {
    #[error("token lifetime must be positive")]
    Zero,
    #[error("token lifetime must not exceed {max:?}")]
    TooLong { max: Duration },
}

/// Strictly positive token lifetime no longer than [`MAX_TOKEN_TTL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtl(Duration);

impl TokenTtl {
    pub fn new(ttl: Duration) -> Result<Self, InvalidTtl> {
        if ttl.is_zero() {
            return Err(InvalidTtl::Zero);
        }
        if ttl > MAX_TOKEN_TTL {
            return Err(InvalidTtl::TooLong { max: MAX_TOKEN_TTL });
        }
        Ok(Self(ttl))
    }

    pub fn from_millis(millis: u64) -> Result<Self, InvalidTtl> {
        Self::new(Duration::from_millis(millis))
    }

    pub fn as_duration(self) -> Duration {
        self.0
    }
}

impl Default for TokenTtl {
    fn default() -> Self {
        Self(DEFAULT_TOKEN_TTL)
    }
}

/// Everything a codec needs to mint and verify tokens.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: SigningSecret,
    pub ttl: TokenTtl,
}
