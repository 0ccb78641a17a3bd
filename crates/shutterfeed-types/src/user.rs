use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Unique identifier for an authenticated user, issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new UserId using UUID v4 (matches what hosted auth issues).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a UserId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// First 8 characters of the hyphenated id string.
    pub fn short(&self) -> String {
        self.0.to_string().chars().take(8).collect()
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// An authenticated session.
///
/// The access token is opaque: it is only ever handed back to the backend
/// adapter that issued it, never parsed or logged.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub access_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Whether the session has passed its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Email/password pair submitted to the auth provider.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use secrecy::ExposeSecret;

    #[test]
    fn test_user_id_short_is_first_eight_chars() {
        let id: UserId = "0f8e2a4b-1c3d-4e5f-8a9b-0c1d2e3f4a5b".parse().unwrap();
        assert_eq!(id.short(), "0f8e2a4b");
    }

    #[test]
    fn test_user_id_display_parse() {
        let id = UserId::new();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let mut session = Session {
            user_id: UserId::new(),
            email: "a@b.com".to_string(),
            access_token: SecretString::from("tok".to_string()),
            expires_at: None,
        };
        assert!(!session.is_expired_at(now));

        session.expires_at = Some(now - Duration::seconds(1));
        assert!(session.is_expired_at(now));

        session.expires_at = Some(now + Duration::hours(1));
        assert!(!session.is_expired_at(now));
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session {
            user_id: UserId::new(),
            email: "a@b.com".to_string(),
            access_token: SecretString::from("super-secret-token".to_string()),
            expires_at: None,
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret-token"));
        assert_eq!(session.access_token.expose_secret(), "super-secret-token");
    }
}
