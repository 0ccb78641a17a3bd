//! Password auth against the hosted platform's auth API.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shutterfeed_core::event::{EventBus, Subscription};
use shutterfeed_core::repository::AuthProvider;
use shutterfeed_types::error::AuthError;
use shutterfeed_types::event::SessionEvent;
use shutterfeed_types::user::{Credentials, Session, UserId};

use super::client::HostedClient;
use crate::auth::session_file::SessionFile;

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

/// Body of a token or signup response. Signup omits the token fields when
/// the project requires email confirmation.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: Option<AuthUser>,
}

impl TokenResponse {
    fn into_session(self, fallback_email: &str) -> Result<Option<Session>, AuthError> {
        let Some(access_token) = self.access_token else {
            return Ok(None);
        };
        let user = self
            .user
            .ok_or_else(|| AuthError::Backend("token response has no user".to_string()))?;
        let user_id = user
            .id
            .parse::<UserId>()
            .map_err(|e| AuthError::Backend(format!("invalid user id: {e}")))?;

        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(at), _) => DateTime::<Utc>::from_timestamp(at, 0),
            (None, Some(secs)) => Some(Utc::now() + Duration::seconds(secs)),
            (None, None) => None,
        };

        Ok(Some(Session {
            user_id,
            email: user.email.unwrap_or_else(|| fallback_email.to_string()),
            access_token: SecretString::from(access_token),
            expires_at,
        }))
    }
}

pub struct HostedAuthProvider {
    client: HostedClient,
    session_file: SessionFile,
    seq: AtomicU64,
    events: EventBus<SessionEvent>,
}

impl HostedAuthProvider {
    pub fn new(client: HostedClient, session_file: SessionFile) -> Self {
        Self {
            client,
            session_file,
            seq: AtomicU64::new(0),
            events: EventBus::default(),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn adopt(&self, session: Session) -> Result<Session, AuthError> {
        self.session_file
            .save(&session)
            .await
            .map_err(|e| AuthError::Backend(format!("failed to persist session: {e}")))?;
        self.client
            .set_access_token(Some(session.access_token.clone()));
        self.events
            .publish(SessionEvent::signed_in(self.next_seq(), session.clone()));
        tracing::info!(user_id = %session.user_id, "hosted session established");
        Ok(session)
    }

    async fn drop_session(&self) {
        self.client.set_access_token(None);
        if let Err(e) = self.session_file.clear().await {
            tracing::warn!(error = %e, "failed to clear session file");
        }
    }

    async fn post_credentials(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<TokenResponse, AuthError> {
        let body = PasswordGrant {
            email: &credentials.email,
            password: credentials.password.expose_secret(),
        };
        let request = self.client.request(Method::POST, path).json(&body);
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "auth request failed");
            AuthError::Backend("auth service unreachable".to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_status_error(status, &body));
        }
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::Backend(format!("failed to parse auth response: {e}")))
    }
}

impl AuthProvider for HostedAuthProvider {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(stored) = self.session_file.load().await else {
            return Ok(None);
        };

        if stored.is_expired_at(Utc::now()) {
            tracing::info!(user_id = %stored.user_id, "stored hosted session expired");
            self.drop_session().await;
            self.events.publish(SessionEvent::expired(self.next_seq()));
            return Ok(None);
        }

        self.client
            .set_access_token(Some(stored.access_token.clone()));
        let response = self
            .client
            .request(Method::GET, "/auth/v1/user")
            .send()
            .await
            .map_err(|e| AuthError::Backend(format!("auth service unreachable: {e}")))?;

        match response.status() {
            status if status.is_success() => Ok(Some(stored)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::info!(user_id = %stored.user_id, "stored hosted session rejected");
                self.drop_session().await;
                self.events.publish(SessionEvent::expired(self.next_seq()));
                Ok(None)
            }
            status => Err(AuthError::Backend(format!("HTTP {status} validating session"))),
        }
    }

    fn subscribe(&self) -> Subscription<SessionEvent> {
        self.events.subscribe("session")
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let response = self
            .post_credentials("/auth/v1/token?grant_type=password", credentials)
            .await?;
        let session = response
            .into_session(&credentials.email)?
            .ok_or_else(|| AuthError::Backend("token response has no access token".to_string()))?;
        self.adopt(session).await
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, AuthError> {
        let response = self.post_credentials("/auth/v1/signup", credentials).await?;
        match response.into_session(&credentials.email)? {
            Some(session) => self.adopt(session).await.map(Some),
            None => {
                tracing::info!(email = %credentials.email, "account created, confirmation pending");
                Ok(None)
            }
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(stored) = self.session_file.load().await {
            self.client.set_access_token(Some(stored.access_token));
            let result = self
                .client
                .send(self.client.request(Method::POST, "/auth/v1/logout"))
                .await;
            if let Err(e) = result {
                tracing::warn!(error = %e, "remote logout failed, clearing local session anyway");
            }
        }
        self.drop_session().await;
        self.events.publish(SessionEvent::signed_out(self.next_seq()));
        Ok(())
    }
}

/// Translate an auth API failure. The API reports bad passwords as 400 and
/// existing accounts as 400 or 422 depending on version.
fn auth_status_error(status: StatusCode, body: &str) -> AuthError {
    let lower = body.to_lowercase();
    if lower.contains("already registered") || lower.contains("already exists") {
        return AuthError::DuplicateAccount;
    }
    match status.as_u16() {
        400 | 401 if lower.contains("invalid") => AuthError::InvalidCredentials,
        422 if lower.contains("email") => AuthError::InvalidEmail(body.to_string()),
        _ => AuthError::Backend(format!("HTTP {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shutterfeed_types::event::SessionChange;
    use tempfile::TempDir;

    #[test]
    fn test_token_response_into_session() {
        let json = r#"{
            "access_token": "jwt-abc",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": {"id": "0f8e2a4b-1c3d-4e5f-8a9b-0c1d2e3f4a5b", "email": "a@b.com"}
        }"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        let session = response.into_session("fallback@b.com").unwrap().unwrap();
        assert_eq!(session.email, "a@b.com");
        assert_eq!(session.access_token.expose_secret(), "jwt-abc");
        assert_eq!(session.user_id.short(), "0f8e2a4b");
        assert!(session.expires_at.unwrap() > Utc::now());
    }

    #[test]
    fn test_signup_without_token_is_pending() {
        let json = r#"{"id": "0f8e2a4b-1c3d-4e5f-8a9b-0c1d2e3f4a5b", "email": "a@b.com"}"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_session("a@b.com").unwrap().is_none());
    }

    #[test]
    fn test_auth_status_error_mapping() {
        assert!(matches!(
            auth_status_error(StatusCode::BAD_REQUEST, r#"{"error_description":"Invalid login credentials"}"#),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            auth_status_error(StatusCode::UNPROCESSABLE_ENTITY, r#"{"msg":"User already registered"}"#),
            AuthError::DuplicateAccount
        ));
        assert!(matches!(
            auth_status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            AuthError::Backend(_)
        ));
    }

    #[tokio::test]
    async fn test_expired_stored_session_publishes_expiry() {
        let dir = TempDir::new().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        file.save(&Session {
            user_id: UserId::new(),
            email: "a@b.com".to_string(),
            access_token: SecretString::from("old".to_string()),
            expires_at: Some(Utc::now() - Duration::minutes(1)),
        })
        .await
        .unwrap();

        // Unroutable base URL: the expiry check must not touch the network.
        let client = HostedClient::new("http://127.0.0.1:9", SecretString::from("k")).unwrap();
        let auth = HostedAuthProvider::new(client, file);
        let mut events = auth.subscribe();

        assert!(auth.current_session().await.unwrap().is_none());
        assert_eq!(events.try_recv().unwrap().change, SessionChange::Expired);
        assert!(!dir.path().join("session.json").exists());
    }
}
