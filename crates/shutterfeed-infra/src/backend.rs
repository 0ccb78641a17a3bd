//! Concrete `Backend` bundles: the local SQLite stack and the hosted REST stack.

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use shutterfeed_core::event::EventBus;
use shutterfeed_core::repository::Backend;
use shutterfeed_types::config::ClientConfig;
use shutterfeed_types::event::TableChange;
use thiserror::Error;

use crate::auth::{LocalAuthProvider, SessionFile};
use crate::filesystem::{database_path, session_path, storage_root};
use crate::hosted::{
    HostedAuthProvider, HostedClient, HostedMediaStore, HostedPostRepository,
    HostedProfileRepository,
};
use crate::realtime::{ChangeHub, Fingerprint, spawn_poller};
use crate::sqlite::account::SqliteAccountRepository;
use crate::sqlite::pool::DatabasePool;
use crate::sqlite::post::SqlitePostRepository;
use crate::sqlite::profile::SqliteProfileRepository;
use crate::storage::LocalMediaStore;

/// Errors raised while assembling a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("hosted backend requires `hosted_url` in config.toml")]
    MissingHostedUrl,

    #[error("environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Build the change hub, starting a fingerprint poller when the interval is
/// non-zero. Must be called inside a tokio runtime.
fn change_hub<F: Fingerprint>(
    source: F,
    bus: EventBus<TableChange>,
    poll_interval_secs: u64,
) -> ChangeHub {
    if poll_interval_secs == 0 {
        return ChangeHub::new(bus);
    }
    let poller = spawn_poller(source, bus.clone(), Duration::from_secs(poll_interval_secs));
    ChangeHub::with_poller(bus, poller)
}

/// Everything stored under the data directory.
pub struct LocalBackend {
    auth: LocalAuthProvider,
    profiles: SqliteProfileRepository,
    posts: SqlitePostRepository,
    media: LocalMediaStore,
    changes: ChangeHub,
}

impl LocalBackend {
    pub async fn open(data_dir: &Path, config: &ClientConfig) -> Result<Self, BackendError> {
        let pool = DatabasePool::open(&database_path(data_dir)).await?;
        let bus = EventBus::default();

        let accounts = SqliteAccountRepository::new(pool.clone());
        match accounts.purge_expired().await {
            Ok(0) => {}
            Ok(n) => tracing::debug!(purged = n, "removed expired sessions"),
            Err(e) => tracing::warn!(error = %e, "failed to purge expired sessions"),
        }

        let posts = SqlitePostRepository::new(pool.clone(), bus.clone());
        let changes = change_hub(posts.clone(), bus.clone(), config.poll_interval_secs);

        Ok(Self {
            auth: LocalAuthProvider::new(
                accounts,
                SessionFile::new(session_path(data_dir)),
                config.session_ttl(),
            ),
            profiles: SqliteProfileRepository::new(pool, bus),
            posts,
            media: LocalMediaStore::new(storage_root(data_dir)),
            changes,
        })
    }
}

impl Backend for LocalBackend {
    type Auth = LocalAuthProvider;
    type Profiles = SqliteProfileRepository;
    type Posts = SqlitePostRepository;
    type Media = LocalMediaStore;
    type Changes = ChangeHub;

    fn auth(&self) -> &Self::Auth {
        &self.auth
    }
    fn profiles(&self) -> &Self::Profiles {
        &self.profiles
    }
    fn posts(&self) -> &Self::Posts {
        &self.posts
    }
    fn media(&self) -> &Self::Media {
        &self.media
    }
    fn changes(&self) -> &Self::Changes {
        &self.changes
    }
}

/// The hosted platform. Only the session file lives locally.
pub struct HostedBackend {
    auth: HostedAuthProvider,
    profiles: HostedProfileRepository,
    posts: HostedPostRepository,
    media: HostedMediaStore,
    changes: ChangeHub,
}

impl HostedBackend {
    pub fn connect(data_dir: &Path, config: &ClientConfig) -> Result<Self, BackendError> {
        let base_url = config
            .hosted_url
            .as_deref()
            .ok_or(BackendError::MissingHostedUrl)?;
        let api_key = std::env::var(&config.anon_key_env)
            .map_err(|_| BackendError::MissingApiKey(config.anon_key_env.clone()))?;

        let client = HostedClient::new(base_url, SecretString::from(api_key))?;
        let bus = EventBus::default();
        let posts = HostedPostRepository::new(client.clone(), bus.clone());
        let changes = change_hub(posts.clone(), bus.clone(), config.poll_interval_secs);
        tracing::debug!(base_url, "hosted backend configured");

        Ok(Self {
            auth: HostedAuthProvider::new(client.clone(), SessionFile::new(session_path(data_dir))),
            profiles: HostedProfileRepository::new(client.clone(), bus),
            posts,
            media: HostedMediaStore::new(client),
            changes,
        })
    }
}

impl Backend for HostedBackend {
    type Auth = HostedAuthProvider;
    type Profiles = HostedProfileRepository;
    type Posts = HostedPostRepository;
    type Media = HostedMediaStore;
    type Changes = ChangeHub;

    fn auth(&self) -> &Self::Auth {
        &self.auth
    }
    fn profiles(&self) -> &Self::Profiles {
        &self.profiles
    }
    fn posts(&self) -> &Self::Posts {
        &self.posts
    }
    fn media(&self) -> &Self::Media {
        &self.media
    }
    fn changes(&self) -> &Self::Changes {
        &self.changes
    }
}
