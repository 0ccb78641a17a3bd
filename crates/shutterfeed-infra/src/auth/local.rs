//! Email/password auth against the local SQLite database.
//!
//! Every change to the current session is published as a [`SessionEvent`]
//! with a sequence number unique to this provider instance.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use shutterfeed_core::event::{EventBus, Subscription};
use shutterfeed_core::repository::AuthProvider;
use shutterfeed_types::error::{AuthError, RepositoryError};
use shutterfeed_types::event::SessionEvent;
use shutterfeed_types::user::{Credentials, Session, UserId};

use super::session_file::SessionFile;
use crate::crypto::hash::sha256_hex;
use crate::crypto::password::{hash_password, verify_password};
use crate::crypto::token::generate_token;
use crate::sqlite::account::{Account, SqliteAccountRepository};

pub struct LocalAuthProvider {
    accounts: SqliteAccountRepository,
    session_file: SessionFile,
    ttl: Duration,
    seq: AtomicU64,
    events: EventBus<SessionEvent>,
}

impl LocalAuthProvider {
    pub fn new(accounts: SqliteAccountRepository, session_file: SessionFile, ttl: Duration) -> Self {
        Self {
            accounts,
            session_file,
            ttl,
            seq: AtomicU64::new(0),
            events: EventBus::default(),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn issue(&self, user_id: UserId, email: &str) -> Result<Session, AuthError> {
        let token = generate_token();
        let expires_at = Utc::now() + self.ttl;
        self.accounts
            .insert_session(&sha256_hex(&token), &user_id, &expires_at)
            .await
            .map_err(backend)?;

        let session = Session {
            user_id,
            email: email.to_string(),
            access_token: SecretString::from(token),
            expires_at: Some(expires_at),
        };
        self.session_file
            .save(&session)
            .await
            .map_err(|e| AuthError::Backend(format!("failed to persist session: {e}")))?;

        self.events
            .publish(SessionEvent::signed_in(self.next_seq(), session.clone()));
        tracing::info!(%user_id, "session issued");
        Ok(session)
    }
}

impl AuthProvider for LocalAuthProvider {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(stored) = self.session_file.load().await else {
            return Ok(None);
        };

        let token_hash = sha256_hex(stored.access_token.expose_secret());
        match self.accounts.find_session(&token_hash).await.map_err(backend)? {
            Some(record) if record.account_id == stored.user_id => Ok(Some(Session {
                expires_at: Some(record.expires_at),
                ..stored
            })),
            _ => {
                tracing::info!(user_id = %stored.user_id, "stored session expired or revoked");
                if let Err(e) = self.session_file.clear().await {
                    tracing::warn!(error = %e, "failed to clear stale session file");
                }
                self.events.publish(SessionEvent::expired(self.next_seq()));
                Ok(None)
            }
        }
    }

    fn subscribe(&self) -> Subscription<SessionEvent> {
        self.events.subscribe("session")
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let account = self
            .accounts
            .find_by_email(&credentials.email)
            .await
            .map_err(backend)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(credentials.password.expose_secret(), &account.password_hash) {
            tracing::debug!(email = %credentials.email, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }
        self.issue(account.id, &account.email).await
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, AuthError> {
        let password_hash = hash_password(credentials.password.expose_secret())
            .map_err(|e| AuthError::Backend(format!("password hashing failed: {e}")))?;
        let account = Account {
            id: UserId::new(),
            email: credentials.email.clone(),
            password_hash,
            created_at: Utc::now(),
        };

        match self.accounts.create(&account).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => return Err(AuthError::DuplicateAccount),
            Err(e) => return Err(backend(e)),
        }
        tracing::info!(user_id = %account.id, "account created");
        self.issue(account.id, &account.email).await.map(Some)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(stored) = self.session_file.load().await {
            let token_hash = sha256_hex(stored.access_token.expose_secret());
            if let Err(e) = self.accounts.delete_session(&token_hash).await {
                tracing::warn!(error = %e, "failed to revoke session row");
            }
        }
        self.session_file
            .clear()
            .await
            .map_err(|e| AuthError::Backend(format!("failed to clear session: {e}")))?;
        self.events.publish(SessionEvent::signed_out(self.next_seq()));
        Ok(())
    }
}

fn backend(err: RepositoryError) -> AuthError {
    AuthError::Backend(err.to_string())
}
