//! Profile bootstrap, setup, and avatar changes.
//!
//! `ensure_profile` is the only place a profile row is created, and it never
//! creates a second row for the same user id: a concurrent insert surfaces
//! as `Conflict`, which is resolved by reading the winner back.

use std::sync::Arc;

use shutterfeed_types::error::{MediaError, ProfileError, RepositoryError};
use shutterfeed_types::post::MediaUpload;
use shutterfeed_types::profile::{
    BIO_MAX_CHARS, DEFAULT_USERNAME_PREFIX, Profile, ProfileEdits, ProfileUpdate, USERNAME_MIN_LEN, sanitize_username,
};
use shutterfeed_types::user::UserId;

use crate::repository::{Backend, ProfileRepository};
use crate::service::media::MediaService;

pub struct ProfileService<B: Backend> {
    backend: Arc<B>,
    avatar_base_url: String,
    media: MediaService<B>,
}

impl<B: Backend> Clone for ProfileService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            avatar_base_url: self.avatar_base_url.clone(),
            media: self.media.clone(),
        }
    }
}

impl<B: Backend> ProfileService<B> {
    pub fn new(backend: Arc<B>, avatar_base_url: impl Into<String>, media: MediaService<B>) -> Self {
        Self {
            backend,
            avatar_base_url: avatar_base_url.into(),
            media,
        }
    }

    pub async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileError> {
        self.backend
            .profiles()
            .get_profile(user_id)
            .await
            .map_err(unavailable)
    }

    /// Look up the profile for `user_id`, creating it with generated defaults
    /// if none exists.
    pub async fn ensure_profile(&self, user_id: &UserId) -> Result<Profile, ProfileError> {
        if let Some(profile) = self.get_profile(user_id).await? {
            return Ok(profile);
        }

        let mut fresh = Profile::with_defaults(*user_id, &self.avatar_base_url);
        if let Some(profile) = self.insert_default(&fresh).await? {
            return Ok(profile);
        }

        // Another user already holds the short default handle.
        fresh.username = long_default_username(user_id);
        tracing::debug!(%user_id, username = %fresh.username, "default username taken, retrying");
        match self.insert_default(&fresh).await? {
            Some(profile) => Ok(profile),
            None => Err(ProfileError::UsernameTaken(fresh.username)),
        }
    }

    /// Insert `fresh`, or read back the row a concurrent insert created.
    /// `None` means the conflict was on the username, not the id.
    async fn insert_default(&self, fresh: &Profile) -> Result<Option<Profile>, ProfileError> {
        let user_id = &fresh.id;
        match self.backend.profiles().create_profile(fresh).await {
            Ok(profile) => {
                tracing::info!(%user_id, username = %profile.username, "created default profile");
                Ok(Some(profile))
            }
            Err(RepositoryError::Conflict(_)) => {
                tracing::debug!(%user_id, "profile insert conflicted, reading it back");
                self.get_profile(user_id).await
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    /// Persist setup edits and raise the setup-complete flag.
    ///
    /// Fails with `UsernameTaken` if another user owns the sanitised
    /// username; nothing is written in that case.
    pub async fn complete_setup(
        &self,
        user_id: &UserId,
        edits: &ProfileEdits,
    ) -> Result<Profile, ProfileError> {
        let update = validate_edits(edits)?;
        let Some(username) = update.username.as_deref() else {
            return Err(ProfileError::InvalidUsername("username is required".to_string()));
        };

        let taken = self
            .backend
            .profiles()
            .is_username_taken(username, user_id)
            .await
            .map_err(unavailable)?;
        if taken {
            return Err(ProfileError::UsernameTaken(username.to_string()));
        }

        let profile = self.update(user_id, &update).await?;
        tracing::info!(%user_id, username = %profile.username, "profile setup complete");
        Ok(profile)
    }

    /// Upload a new avatar and point the profile at it.
    ///
    /// The previous avatar is removed afterwards only if it is one of this
    /// user's uploaded avatars; failure to remove it is logged, not returned.
    pub async fn change_avatar(
        &self,
        user_id: &UserId,
        upload: &MediaUpload,
    ) -> Result<Profile, ProfileError> {
        let current = self.get_profile(user_id).await?.ok_or(ProfileError::NotFound)?;
        let url = self
            .media
            .upload_avatar(user_id, upload)
            .await
            .map_err(media_error)?;
        let profile = self.update(user_id, &ProfileUpdate::avatar(url)).await?;

        if let Some(old) = current.avatar_url.as_deref() {
            if let Err(e) = self.media.remove_avatar(user_id, old).await {
                tracing::warn!(%user_id, error = %e, "failed to remove previous avatar");
            }
        }
        Ok(profile)
    }

    async fn update(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<Profile, ProfileError> {
        self.backend
            .profiles()
            .update_profile(user_id, update)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ProfileError::NotFound,
                RepositoryError::Conflict(_) => ProfileError::UsernameTaken(
                    update.username.clone().unwrap_or_default(),
                ),
                other => ProfileError::Backend(other.to_string()),
            })
    }
}

/// Turn raw setup input into a store update with the setup flag raised.
pub fn validate_edits(edits: &ProfileEdits) -> Result<ProfileUpdate, ProfileError> {
    let username = sanitize_username(edits.username.trim());
    if username.chars().count() < USERNAME_MIN_LEN {
        return Err(ProfileError::InvalidUsername(format!(
            "must be at least {USERNAME_MIN_LEN} characters of a-z, 0-9 or _"
        )));
    }

    let bio = non_empty(edits.bio.as_deref());
    if bio.as_ref().is_some_and(|b| b.chars().count() > BIO_MAX_CHARS) {
        return Err(ProfileError::BioTooLong { max: BIO_MAX_CHARS });
    }

    Ok(ProfileUpdate {
        username: Some(username),
        full_name: non_empty(edits.full_name.as_deref()),
        bio,
        avatar_url: non_empty(edits.avatar_url.as_deref()),
        mark_setup_complete: true,
    })
}

fn long_default_username(id: &UserId) -> String {
    format!("{DEFAULT_USERNAME_PREFIX}{}", id.to_string().replace('-', ""))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn unavailable(err: RepositoryError) -> ProfileError {
    ProfileError::BackendUnavailable(err.to_string())
}

fn media_error(err: MediaError) -> ProfileError {
    ProfileError::Backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::testing::{MemoryBackend, TEST_AVATAR_BASE, complete_profile};
    use shutterfeed_types::profile::default_username;

    fn service(backend: &Arc<MemoryBackend>) -> ProfileService<MemoryBackend> {
        let media = MediaService::new(Arc::clone(backend), "post-media", 1024);
        ProfileService::new(Arc::clone(backend), TEST_AVATAR_BASE, media)
    }

    fn edits(username: &str) -> ProfileEdits {
        ProfileEdits {
            username: username.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ensure_profile_creates_defaults_once() {
        let backend = Arc::new(MemoryBackend::new());
        let profiles = service(&backend);
        let user = UserId::new();

        let first = profiles.ensure_profile(&user).await.unwrap();
        let second = profiles.ensure_profile(&user).await.unwrap();

        assert_eq!(first, second);
        assert!(!first.is_setup_complete);
        assert_eq!(first.username, format!("user_{}", &user.to_string()[..8]));
        assert_eq!(backend.profiles.count(), 1);
        assert_eq!(backend.profiles.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ensure_profile_reports_backend_unavailable() {
        let backend = Arc::new(MemoryBackend::new());
        backend.profiles.fail_next.store(1, Ordering::SeqCst);
        let err = service(&backend).ensure_profile(&UserId::new()).await.unwrap_err();
        assert!(matches!(err, ProfileError::BackendUnavailable(_)));
        assert_eq!(backend.profiles.count(), 0);
    }

    #[tokio::test]
    async fn test_complete_setup_sets_flag_and_sanitizes() {
        let backend = Arc::new(MemoryBackend::new());
        let profiles = service(&backend);
        let user = UserId::new();
        profiles.ensure_profile(&user).await.unwrap();

        let profile = profiles
            .complete_setup(
                &user,
                &ProfileEdits {
                    username: " Alice.W ".to_string(),
                    full_name: Some("Alice W".to_string()),
                    bio: Some("   ".to_string()),
                    avatar_url: None,
                },
            )
            .await
            .unwrap();
        assert!(profile.is_setup_complete);
        assert_eq!(profile.username, "alicew");
        assert_eq!(profile.full_name.as_deref(), Some("Alice W"));
        assert_eq!(profile.bio, None);
    }

    #[tokio::test]
    async fn test_complete_setup_rejects_taken_username() {
        let backend = Arc::new(MemoryBackend::new());
        backend.profiles.insert(complete_profile(UserId::new(), "alice"));
        let profiles = service(&backend);
        let user = UserId::new();
        let before = profiles.ensure_profile(&user).await.unwrap();

        let err = profiles.complete_setup(&user, &edits("alice")).await.unwrap_err();
        assert!(matches!(err, ProfileError::UsernameTaken(ref u) if u == "alice"));
        assert_eq!(backend.profiles.get(&user).unwrap(), before);
    }

    #[tokio::test]
    async fn test_complete_setup_allows_keeping_own_username() {
        let backend = Arc::new(MemoryBackend::new());
        let profiles = service(&backend);
        let user = UserId::new();
        let profile = profiles.ensure_profile(&user).await.unwrap();

        let done = profiles
            .complete_setup(&user, &edits(&profile.username))
            .await
            .unwrap();
        assert_eq!(done.username, profile.username);
        assert!(done.is_setup_complete);
    }

    #[test]
    fn test_validate_edits() {
        assert!(matches!(
            validate_edits(&edits("a!")),
            Err(ProfileError::InvalidUsername(_))
        ));
        let long_bio = ProfileEdits {
            username: "bob".to_string(),
            bio: Some("x".repeat(BIO_MAX_CHARS + 1)),
            ..Default::default()
        };
        assert!(matches!(
            validate_edits(&long_bio),
            Err(ProfileError::BioTooLong { max: 150 })
        ));
        let ok = validate_edits(&edits("Bob_1")).unwrap();
        assert_eq!(ok.username.as_deref(), Some("bob_1"));
        assert!(ok.mark_setup_complete);
    }

    #[tokio::test]
    async fn test_change_avatar_replaces_bucket_object() {
        let backend = Arc::new(MemoryBackend::new());
        let profiles = service(&backend);
        let user = UserId::new();
        profiles.ensure_profile(&user).await.unwrap();

        let png = MediaUpload {
            file_name: "me.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };
        let first = profiles.change_avatar(&user, &png).await.unwrap();
        assert!(first.avatar_url.as_deref().unwrap().contains("/post-media/"));
        assert_eq!(backend.media.count(), 1);

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = profiles.change_avatar(&user, &png).await.unwrap();
        assert_ne!(first.avatar_url, second.avatar_url);
        assert_eq!(backend.media.count(), 1);
    }

    #[tokio::test]
    async fn test_change_avatar_keeps_objects_it_does_not_own() {
        let backend = Arc::new(MemoryBackend::new());
        let profiles = service(&backend);
        let media = MediaService::new(Arc::clone(&backend), "post-media", 1024);
        let png = MediaUpload {
            file_name: "pic.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![7, 7],
        };

        let owner = UserId::new();
        let (owner_url, _) = media.upload_post_media(&owner, &png).await.unwrap();

        let other = UserId::new();
        profiles.ensure_profile(&other).await.unwrap();
        profiles
            .complete_setup(
                &other,
                &ProfileEdits {
                    username: "borrower".to_string(),
                    avatar_url: Some(owner_url.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let after = profiles.change_avatar(&other, &png).await.unwrap();

        assert_ne!(after.avatar_url.as_deref(), Some(owner_url.as_str()));
        assert_eq!(backend.media.count(), 2);
        let owner_path = object_path(&owner_url);
        assert!(backend.media.contains("post-media", &owner_path));
    }

    #[tokio::test]
    async fn test_ensure_profile_falls_back_when_default_username_taken() {
        let backend = Arc::new(MemoryBackend::new());
        let user = UserId::new();
        let squatter = complete_profile(UserId::new(), &default_username(&user));
        backend.profiles.insert(squatter);

        let profiles = service(&backend);
        let profile = profiles.ensure_profile(&user).await.unwrap();
        assert_eq!(profile.id, user);
        assert_eq!(profile.username, long_default_username(&user));
        assert!(!profile.is_setup_complete);
        assert_eq!(backend.profiles.count(), 2);

        let again = profiles.ensure_profile(&user).await.unwrap();
        assert_eq!(again, profile);
    }

    fn object_path(url: &str) -> String {
        crate::service::media::object_path_from_url(url, "post-media").unwrap()
    }

    #[tokio::test]
    async fn test_change_avatar_rejects_video() {
        let backend = Arc::new(MemoryBackend::new());
        let profiles = service(&backend);
        let user = UserId::new();
        profiles.ensure_profile(&user).await.unwrap();

        let clip = MediaUpload {
            file_name: "me.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            bytes: vec![0],
        };
        assert!(profiles.change_avatar(&user, &clip).await.is_err());
        assert_eq!(backend.media.count(), 0);
    }
}
