//! Test utilities for the storefront crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`);
//! compiled only for tests or with the `test-support` feature.

pub mod clock;
pub mod context;
pub mod fixtures;
pub mod hasher;

pub use clock::MutableClock;
pub use context::{AuthContext, bearer};
pub use fixtures::{TEST_SECRET, UserFixture, principal, test_token_settings};
pub use hasher::RecordingHasher;
