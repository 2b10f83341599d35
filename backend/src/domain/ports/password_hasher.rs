//! Port for adaptive password hashing.
//!
//! Implementations are CPU bound and synchronous; async callers run them on
//! the blocking pool.

use crate::domain::PasswordDigest;

use super::define_port_error;

define_port_error! {
    /// Errors raised while deriving a password hash.
    pub enum PasswordHashError {
        /// The hashing primitive rejected its input or parameters.
        Hash { message: String } => "password hashing failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Derive a salted digest of `password`.
    fn hash(&self, password: &str) -> Result<PasswordDigest, PasswordHashError>;

    /// Constant-time comparison of `password` against `digest`.
    ///
    /// Digests that cannot be parsed never verify.
    fn verify(&self, password: &str, digest: &PasswordDigest) -> bool;
}
