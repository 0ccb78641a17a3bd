//! Authentication port.

use shutterfeed_types::error::AuthError;
use shutterfeed_types::event::SessionEvent;
use shutterfeed_types::user::{Credentials, Session};

use crate::event::Subscription;

/// Session issuance and session-change notification.
///
/// Implementations publish a [`SessionEvent`] with a strictly increasing
/// sequence number after every sign-in, sign-out, and detected expiry.
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait AuthProvider: Send + Sync {
    /// The currently stored session, if any and not expired.
    fn current_session(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<Session>, AuthError>> + Send;

    /// Register a listener for session changes.
    fn subscribe(&self) -> Subscription<SessionEvent>;

    /// Sign in with email and password.
    fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<Session, AuthError>> + Send;

    /// Create an account.
    ///
    /// Returns `None` when the account exists but cannot sign in yet (for
    /// example, the backend requires email confirmation first).
    fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<Option<Session>, AuthError>> + Send;

    /// End the current session. Succeeds when no session exists.
    fn sign_out(&self) -> impl std::future::Future<Output = Result<(), AuthError>> + Send;
}
