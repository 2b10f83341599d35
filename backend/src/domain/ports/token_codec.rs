//! Port for minting and verifying signed bearer tokens.

use tracing::warn;

use crate::domain::{IssuedToken, TokenClaims, User};

use super::define_port_error;

define_port_error! {
    /// Failures while issuing or parsing tokens.
    pub enum TokenError {
        /// The token is not a well-formed, correctly typed compact token.
        Malformed { message: String } => "malformed token: {message}",
        /// The signature does not match the token contents.
        InvalidSignature => "token signature is invalid",
        /// The codec could not sign the claims.
        Signing { message: String } => "token signing failed: {message}",
    }
}

/// Stateless token codec.
///
/// `parse` never checks expiry; callers combine it with `is_expired` so that
/// "expired" stays distinguishable from "forged".
#[cfg_attr(test, mockall::automock)]
pub trait TokenCodec: Send + Sync {
    /// Sign a token for `user` valid from now until now plus the configured
    /// lifetime.
    fn issue(&self, user: &User) -> Result<IssuedToken, TokenError>;

    /// Verify the signature and decode the claims. Never yields partial
    /// claims.
    fn parse(&self, token: &str) -> Result<TokenClaims, TokenError>;

    /// Whether `claims` have reached their expiry instant.
    fn is_expired(&self, claims: &TokenClaims) -> bool;

    /// True iff the token parses, belongs to `expected_subject` and has not
    /// expired. Failures are logged and reported as `false`.
    fn validate(&self, token: &str, expected_subject: &str) -> bool {
        match self.parse(token) {
            Ok(claims) if claims.subject != expected_subject => {
                warn!("token subject does not match the expected user");
                false
            }
            Ok(claims) if self.is_expired(&claims) => {
                warn!(subject = %claims.subject, "token has expired");
                false
            }
            Ok(_) => true,
            Err(error) => {
                warn!(%error, "token rejected");
                false
            }
        }
    }
}
