//! Business logic services (use cases).
//!
//! Services wrap the backend ports, validate input, and map
//! `RepositoryError` into the domain error of each area. They depend on the
//! `Backend` trait only, never on a concrete adapter.

pub mod auth;
pub mod feed;
pub mod media;
pub mod profile;
pub mod retry;

pub use auth::AuthService;
pub use feed::{FeedService, ProfileDetail};
pub use media::MediaService;
pub use profile::ProfileService;
pub use retry::Backoff;
