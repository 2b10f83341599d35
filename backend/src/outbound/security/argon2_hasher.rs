//! Argon2id implementation of the `PasswordHasher` port.

use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::domain::PasswordDigest;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

const SALT_BYTES: usize = 16;

/// Argon2id hasher producing PHC strings (`$argon2id$v=19$...`).
///
/// Digests embed their own parameters, so verification keeps working for
/// hashes produced under older cost settings.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher").finish_non_exhaustive()
    }
}

impl Argon2Hasher {
    /// Hasher with the library's recommended cost parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher with explicit costs: memory in KiB, iterations and lanes.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordHashError::Hash`] when argon2 rejects the
    /// combination.
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordHashError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|err| PasswordHashError::hash(err.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
        }
    }
}

fn fresh_salt() -> Result<SaltString, PasswordHashError> {
    let mut bytes = [0_u8; SALT_BYTES];
    getrandom::getrandom(&mut bytes).map_err(|err| PasswordHashError::hash(err.to_string()))?;
    SaltString::encode_b64(&bytes).map_err(|err| PasswordHashError::hash(err.to_string()))
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<PasswordDigest, PasswordHashError> {
        let salt = fresh_salt()?;
        let phc = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| PasswordHashError::hash(err.to_string()))?;
        Ok(PasswordDigest::new(phc.to_string()))
    }

    fn verify(&self, password: &str, digest: &PasswordDigest) -> bool {
        match PasswordHash::new(digest.as_str()) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
