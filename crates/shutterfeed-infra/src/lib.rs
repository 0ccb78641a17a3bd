//! Infrastructure layer for Shutterfeed.
//!
//! Implements the backend ports from `shutterfeed-core` twice: a local stack
//! (SQLite, filesystem object store, Argon2 password auth) and a hosted stack
//! speaking the platform's REST APIs. Both share the session file, change
//! polling, and config loading found here.

pub mod auth;
pub mod backend;
pub mod config;
pub mod crypto;
pub mod filesystem;
pub mod hosted;
pub mod realtime;
pub mod sqlite;
pub mod storage;

pub use backend::{BackendError, HostedBackend, LocalBackend};
