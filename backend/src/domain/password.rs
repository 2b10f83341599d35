//! Async wrappers running the password hasher on tokio's blocking pool.
//!
//! Adaptive hashes are deliberately slow; running them inline would stall the
//! request executor.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::domain::ports::PasswordHasher;
use crate::domain::{Error, PasswordDigest};

pub(crate) async fn hash_password(
    hasher: Arc<dyn PasswordHasher>,
    password: Zeroizing<String>,
) -> Result<PasswordDigest, Error> {
    let outcome = tokio::task::spawn_blocking(move || hasher.hash(password.as_str()))
        .await
        .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?;
    outcome.map_err(|err| Error::internal(err.to_string()))
}

pub(crate) async fn verify_password(
    hasher: Arc<dyn PasswordHasher>,
    password: Zeroizing<String>,
    digest: PasswordDigest,
) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || hasher.verify(password.as_str(), &digest))
        .await
        .map_err(|err| Error::internal(format!("password verification task failed: {err}")))
}
