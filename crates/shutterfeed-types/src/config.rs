//! Client configuration types for Shutterfeed.
//!
//! `ClientConfig` represents the top-level `config.toml` in the data
//! directory. Every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Which backend adapter the client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite + filesystem backend in the data directory.
    #[default]
    Local,
    /// The hosted platform's REST endpoints.
    Hosted,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::Hosted => write!(f, "hosted"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "hosted" => Ok(BackendKind::Hosted),
            other => Err(format!("invalid backend: '{other}'")),
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Base URL of the hosted platform (required when `backend = "hosted"`).
    #[serde(default)]
    pub hosted_url: Option<String>,

    /// Name of the environment variable holding the hosted API key.
    #[serde(default = "default_anon_key_env")]
    pub anon_key_env: String,

    /// Base URL for generated avatars; the user id is appended as `?seed=`.
    #[serde(default = "default_avatar_base_url")]
    pub avatar_base_url: String,

    /// Object storage bucket holding post media and avatars.
    #[serde(default = "default_media_bucket")]
    pub media_bucket: String,

    /// Upper bound for avatar uploads in bytes.
    #[serde(default = "default_max_avatar_bytes")]
    pub max_avatar_bytes: usize,

    /// Lifetime of sessions issued by the local backend.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Seconds between polls of the hosted change feed.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_anon_key_env() -> String {
    "SHUTTERFEED_ANON_KEY".to_string()
}

fn default_avatar_base_url() -> String {
    "https://api.dicebear.com/7.x/avataaars/svg".to_string()
}

fn default_media_bucket() -> String {
    "post-media".to_string()
}

fn default_max_avatar_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_session_ttl_hours() -> i64 {
    168
}

fn default_poll_interval_secs() -> u64 {
    5
}

/// Accepted range for `session_ttl_hours`: one hour to one year.
pub const SESSION_TTL_HOURS_RANGE: std::ops::RangeInclusive<i64> = 1..=24 * 365;

impl ClientConfig {
    /// Session lifetime with `session_ttl_hours` clamped into
    /// [`SESSION_TTL_HOURS_RANGE`].
    pub fn session_ttl(&self) -> chrono::Duration {
        let hours = self
            .session_ttl_hours
            .clamp(*SESSION_TTL_HOURS_RANGE.start(), *SESSION_TTL_HOURS_RANGE.end());
        chrono::Duration::hours(hours)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            hosted_url: None,
            anon_key_env: default_anon_key_env(),
            avatar_base_url: default_avatar_base_url(),
            media_bucket: default_media_bucket(),
            max_avatar_bytes: default_max_avatar_bytes(),
            session_ttl_hours: default_session_ttl_hours(),
            poll_interval_secs: default_poll_interval_secs(),
            retry: RetryConfig::default(),
        }
    }
}

/// Bounded exponential backoff for profile bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one. `1` disables retrying.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    200
}

fn default_max_backoff_ms() -> u64 {
    2_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }
}
