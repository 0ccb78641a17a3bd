//! The current session, persisted between CLI runs.
//!
//! Written as JSON to `{data_dir}/session.json`. Both backends use it; the
//! token is whatever the issuing backend handed out.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shutterfeed_types::user::{Session, UserId};

#[derive(Serialize, Deserialize)]
struct StoredSession {
    user_id: UserId,
    email: String,
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Reads and writes the persisted session.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the stored session. A missing file yields `None`; an unreadable
    /// or corrupt file is logged and also treated as no session.
    pub async fn load(&self) -> Option<Session> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str::<StoredSession>(&content) {
            Ok(stored) => Some(Session {
                user_id: stored.user_id,
                email: stored.email,
                access_token: SecretString::from(stored.access_token),
                expires_at: stored.expires_at,
            }),
            Err(e) => {
                tracing::warn!("Ignoring corrupt session file {}: {e}", self.path.display());
                None
            }
        }
    }

    pub async fn save(&self, session: &Session) -> Result<(), std::io::Error> {
        let stored = StoredSession {
            user_id: session.user_id,
            email: session.email.clone(),
            access_token: session.access_token.expose_secret().to_string(),
            expires_at: session.expires_at,
        };
        let json = serde_json::to_string_pretty(&stored).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, json).await?;
        restrict_permissions(&self.path).await
    }

    pub async fn clear(&self) -> Result<(), std::io::Error> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &std::path::Path) -> Result<(), std::io::Error> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &std::path::Path) -> Result<(), std::io::Error> {
    Ok(())
}
