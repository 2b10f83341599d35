//! Cheap deterministic password hasher that counts verifications.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::PasswordDigest;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

const PREFIX: &str = "recorded$";

/// Stores passwords reversibly and records how often `verify` ran, so tests
/// can assert that every login path does the same hashing work.
#[derive(Debug, Default)]
pub struct RecordingHasher {
    verifications: AtomicUsize,
}

impl RecordingHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verifications(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }

    /// Digest that `verify` accepts for `password`.
    pub fn digest_for(password: &str) -> PasswordDigest {
        PasswordDigest::new(format!("{PREFIX}{password}"))
    }
}

impl PasswordHasher for RecordingHasher {
    fn hash(&self, password: &str) -> Result<PasswordDigest, PasswordHashError> {
        Ok(Self::digest_for(password))
    }

    fn verify(&self, password: &str, digest: &PasswordDigest) -> bool {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        digest
            .as_str()
            .strip_prefix(PREFIX)
            .is_some_and(|stored| stored == password)
    }
}
