//! Credential store adapters.
//!
//! `DieselUserRepository` persists accounts in PostgreSQL through
//! `diesel-async` and a bb8 pool. `InMemoryUserRepository` backs local runs
//! without a database and the test suites. Diesel rows and schema stay
//! private to this module.

mod diesel_user_repository;
mod in_memory_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;
mod user_persistence_error_mapping;

pub use diesel_user_repository::DieselUserRepository;
pub use in_memory_user_repository::InMemoryUserRepository;
pub use migrations::run_pending_migrations;
pub use pool::{DbPool, PoolConfig, PoolError};
