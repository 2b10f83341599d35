//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: credential stores (PostgreSQL via Diesel, in-memory)
//! - **security**: Argon2id password hashing and HS256 token signing
//!
//! Adapters translate between domain types and infrastructure
//! representations and carry no business rules.

pub mod persistence;
pub mod security;
