//! Sign-in, sign-up, and sign-out.
//!
//! Input validation happens here so every backend rejects the same inputs
//! the same way. Session changes are never pushed into the orchestrator from
//! this service; they arrive through the provider's event stream.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use shutterfeed_types::error::AuthError;
use shutterfeed_types::user::{Credentials, Session};

use crate::repository::{AuthProvider, Backend};

/// Minimum accepted password length.
pub const PASSWORD_MIN_LEN: usize = 6;

/// Service wrapping the backend's auth provider.
pub struct AuthService<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> Clone for AuthService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: Backend> AuthService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: SecretString) -> Result<Session, AuthError> {
        let email = normalize_email(email)?;
        let credentials = Credentials { email, password };
        let session = self.backend.auth().sign_in_with_password(&credentials).await?;
        tracing::info!(user_id = %session.user_id, "signed in");
        Ok(session)
    }

    /// Register a new account.
    ///
    /// The confirmation must match before the backend is contacted. Returns
    /// `None` when the backend requires confirmation before issuing a session.
    pub async fn sign_up(
        &self,
        email: &str,
        password: SecretString,
        confirm: SecretString,
    ) -> Result<Option<Session>, AuthError> {
        if password.expose_secret() != confirm.expose_secret() {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(&password)?;
        let email = normalize_email(email)?;
        let credentials = Credentials { email, password };
        let session = self.backend.auth().sign_up(&credentials).await?;
        match &session {
            Some(s) => tracing::info!(user_id = %s.user_id, "account created"),
            None => tracing::info!("account created, confirmation pending"),
        }
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.backend.auth().sign_out().await?;
        tracing::info!("signed out");
        Ok(())
    }

    pub async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        self.backend.auth().current_session().await
    }
}

/// Trim and lowercase an email, rejecting obviously malformed input.
pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail(raw.trim().to_string()))
    }
}

fn validate_password(password: &SecretString) -> Result<(), AuthError> {
    if password.expose_secret().chars().count() < PASSWORD_MIN_LEN {
        return Err(AuthError::WeakPassword {
            min: PASSWORD_MIN_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryBackend;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM ").unwrap(), "alice@example.com");
        assert!(normalize_email("alice").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("alice@localhost").is_err());
        assert!(normalize_email("a b@example.com").is_err());
    }

    #[tokio::test]
    async fn test_sign_up_mismatch_never_reaches_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let auth = AuthService::new(Arc::clone(&backend));
        let mut events = backend.auth.subscribe();

        let err = auth
            .sign_up("a@example.com", secret("secret1"), secret("secret2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
        assert!(events.try_recv().is_none());
        assert!(auth.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_rejects_short_password() {
        let auth = AuthService::new(Arc::new(MemoryBackend::new()));
        let err = auth
            .sign_up("a@example.com", secret("abc"), secret("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword { min: 6 }));
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let auth = AuthService::new(Arc::new(MemoryBackend::new()));
        let session = auth
            .sign_up("Bob@Example.com", secret("hunter22"), secret("hunter22"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.email, "bob@example.com");

        auth.sign_out().await.unwrap();
        assert!(auth.current_session().await.unwrap().is_none());

        let again = auth.sign_in("bob@example.com", secret("hunter22")).await.unwrap();
        assert_eq!(again.user_id, session.user_id);
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let backend = Arc::new(MemoryBackend::new());
        backend.auth.add_account("c@example.com", "right-one");
        let auth = AuthService::new(backend);
        let err = auth.sign_in("c@example.com", secret("wrong-one")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_sign_up() {
        let backend = Arc::new(MemoryBackend::new());
        backend.auth.add_account("d@example.com", "password");
        let auth = AuthService::new(backend);
        let err = auth
            .sign_up("d@example.com", secret("password"), secret("password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateAccount));
    }
}
