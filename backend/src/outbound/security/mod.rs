//! Cryptographic adapters: password hashing and bearer token signing.

mod argon2_hasher;
mod jwt_token_codec;

pub use argon2_hasher::Argon2Hasher;
pub use jwt_token_codec::JwtTokenCodec;
