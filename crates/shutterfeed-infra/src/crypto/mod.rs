//! Cryptographic helpers for the local backend.
//!
//! - `hash`: SHA-256 digests of session tokens
//! - `password`: Argon2id password hashing
//! - `token`: random session tokens

pub mod hash;
pub mod password;
pub mod token;
