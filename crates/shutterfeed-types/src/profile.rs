use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

/// Maximum bio length in characters.
pub const BIO_MAX_CHARS: usize = 150;

/// Minimum username length after sanitisation.
pub const USERNAME_MIN_LEN: usize = 3;

/// Prefix of auto-generated usernames.
pub const DEFAULT_USERNAME_PREFIX: &str = "user_";

/// Application-level user record, one per authenticated user id.
///
/// A profile starts with `is_setup_complete = false` and flips to `true`
/// exactly once, when the user completes setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    /// Unique handle (lowercase letters, digits, underscores).
    pub username: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub is_setup_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Build the profile auto-created on first sign-in.
    pub fn with_defaults(id: UserId, avatar_base_url: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: default_username(&id),
            full_name: None,
            bio: None,
            avatar_url: Some(default_avatar_url(avatar_base_url, &id)),
            is_setup_complete: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name to show in headers: full name if set, else the username.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// The fields a user fills in on the setup screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileEdits {
    pub username: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Partial update sent to the profile store.
///
/// The setup flag can only be raised; no field lowers it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub mark_setup_complete: bool,
}

impl ProfileUpdate {
    /// Update that only replaces the avatar.
    pub fn avatar(url: String) -> Self {
        Self {
            avatar_url: Some(url),
            ..Default::default()
        }
    }

    /// Apply this update to an in-memory profile.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(username) = &self.username {
            profile.username = username.clone();
        }
        if let Some(full_name) = &self.full_name {
            profile.full_name = Some(full_name.clone());
        }
        if let Some(bio) = &self.bio {
            profile.bio = Some(bio.clone());
        }
        if let Some(avatar_url) = &self.avatar_url {
            profile.avatar_url = Some(avatar_url.clone());
        }
        profile.is_setup_complete |= self.mark_setup_complete;
        profile.updated_at = Utc::now();
    }
}

/// Author fields joined onto each feed post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&Profile> for AuthorSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            username: profile.username.clone(),
            full_name: profile.full_name.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

/// Counters shown on the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub posts: usize,
    pub followers: usize,
    pub following: usize,
}

/// Generated username for a fresh profile: `user_` + first 8 chars of the id.
pub fn default_username(id: &UserId) -> String {
    format!("{DEFAULT_USERNAME_PREFIX}{}", id.short())
}

/// Generated avatar reference for a fresh profile, seeded by the user id.
pub fn default_avatar_url(base_url: &str, id: &UserId) -> String {
    format!("{}?seed={id}", base_url.trim_end_matches('/'))
}

/// Normalise raw username input.
///
/// Lowercases and drops every character outside `[a-z0-9_]`.
///
/// ```
/// use shutterfeed_types::profile::sanitize_username;
///
/// assert_eq!(sanitize_username("Alice.Smith!"), "alicesmith");
/// assert_eq!(sanitize_username("bob_99"), "bob_99");
/// ```
pub fn sanitize_username(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}
