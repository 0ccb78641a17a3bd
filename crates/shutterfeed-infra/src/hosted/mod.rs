//! Adapter for the hosted backend-as-a-service (auth, REST tables, storage).
//!
//! The platform's change stream is not consumed directly; the posts table is
//! polled for a fingerprint instead (see [`crate::realtime`]).

pub mod auth;
pub mod client;
pub mod post;
pub mod profile;
pub mod storage;

pub use auth::HostedAuthProvider;
pub use client::HostedClient;
pub use post::HostedPostRepository;
pub use profile::HostedProfileRepository;
pub use storage::HostedMediaStore;
