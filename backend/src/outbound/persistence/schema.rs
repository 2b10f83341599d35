//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// Registered accounts. `username` and `email` carry unique constraints
    /// (`users_username_key`, `users_email_key`).
    users (id) {
        id -> Uuid,
        username -> Varchar,
        email -> Varchar,
        /// PHC-formatted Argon2id digest.
        password_hash -> Text,
        first_name -> Varchar,
        last_name -> Varchar,
        phone -> Nullable<Varchar>,
        is_active -> Bool,
        is_email_verified -> Bool,
        /// Upper-case role names.
        roles -> Array<Text>,
        created_at -> Timestamptz,
        /// Maintained by the `users_updated_at` trigger.
        updated_at -> Timestamptz,
    }
}
