//! Backend port definitions.
//!
//! These traits describe the capability set the client needs from the
//! hosted platform: auth, table access, object storage, and realtime
//! change notification. shutterfeed-infra implements them; the core crate
//! never depends on any specific backend technology.

pub mod auth;
pub mod media;
pub mod post;
pub mod profile;
pub mod realtime;

pub use auth::AuthProvider;
pub use media::MediaStore;
pub use post::PostRepository;
pub use profile::ProfileRepository;
pub use realtime::ChangeFeed;

/// A complete backend: one implementation of every port.
///
/// Services and the orchestrator are generic over a single `Backend` rather
/// than over each port separately.
pub trait Backend: Send + Sync + 'static {
    type Auth: AuthProvider;
    type Profiles: ProfileRepository;
    type Posts: PostRepository;
    type Media: MediaStore;
    type Changes: ChangeFeed;

    fn auth(&self) -> &Self::Auth;
    fn profiles(&self) -> &Self::Profiles;
    fn posts(&self) -> &Self::Posts;
    fn media(&self) -> &Self::Media;
    fn changes(&self) -> &Self::Changes;
}
